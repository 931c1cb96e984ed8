//! ABI items: functions, constructors, events, errors, fallback and receive
//!
//! Items render as human-readable declarations through `Display` and
//! (de)serialize to the standard JSON ABI schema, including the legacy
//! `constant`/`payable` flags emitted by old compilers.

use std::fmt;

use abikit_primitives::{keccak256, Selector, H256};
use serde::{Deserialize, Serialize};

use crate::abi::{self, DecodeOptions, Param, ParamType, Token};
use crate::AbiError;

/// Kind of an ABI item, used for registry lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiItemKind {
    /// `function`
    Function,
    /// `constructor`
    Constructor,
    /// `event`
    Event,
    /// `error`
    Error,
    /// `fallback`
    Fallback,
    /// `receive`
    Receive,
}

impl fmt::Display for AbiItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AbiItemKind::Function => "function",
            AbiItemKind::Constructor => "constructor",
            AbiItemKind::Event => "event",
            AbiItemKind::Error => "error",
            AbiItemKind::Fallback => "fallback",
            AbiItemKind::Receive => "receive",
        })
    }
}

/// Function state mutability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    /// Reads neither state nor environment
    Pure,
    /// Reads state
    View,
    /// Writes state, rejects value
    #[default]
    NonPayable,
    /// Writes state, accepts value
    Payable,
}

impl StateMutability {
    /// `pure` or `view`: callable through `eth_call` only
    pub fn is_read_only(&self) -> bool {
        matches!(self, StateMutability::Pure | StateMutability::View)
    }

    /// Accepts a non-zero value
    pub fn is_payable(&self) -> bool {
        *self == StateMutability::Payable
    }
}

impl fmt::Display for StateMutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StateMutability::Pure => "pure",
            StateMutability::View => "view",
            StateMutability::NonPayable => "nonpayable",
            StateMutability::Payable => "payable",
        })
    }
}

/// Contract function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    /// Function name
    pub name: String,
    /// Input parameters
    pub inputs: Vec<Param>,
    /// Output parameters
    pub outputs: Vec<Param>,
    /// State mutability
    pub state_mutability: StateMutability,
}

impl FunctionDef {
    /// Canonical signature, e.g. `transfer(address,uint256)`
    pub fn signature(&self) -> String {
        signature(&self.name, &self.inputs)
    }

    /// First 4 bytes of the signature hash
    pub fn selector(&self) -> Selector {
        Selector::from_signature(&self.signature())
    }

    /// Input parameter types
    pub fn input_types(&self) -> Vec<ParamType> {
        kinds(&self.inputs)
    }

    /// Output parameter types
    pub fn output_types(&self) -> Vec<ParamType> {
        kinds(&self.outputs)
    }

    /// Selector followed by the encoded arguments
    pub fn encode_input(&self, args: &[Token]) -> Result<Vec<u8>, AbiError> {
        abi::encode_function_call(self.selector(), &self.input_types(), args)
    }

    /// Check the selector of call data and decode the arguments
    pub fn decode_input(&self, calldata: &[u8], options: &DecodeOptions) -> Result<Vec<Token>, AbiError> {
        let args = strip_selector(self.selector(), calldata)?;
        abi::decode(&self.input_types(), args, options)
    }

    /// Decode return data
    pub fn decode_output(&self, data: &[u8], options: &DecodeOptions) -> Result<Vec<Token>, AbiError> {
        abi::decode(&self.output_types(), data, options)
    }
}

/// Contract constructor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConstructorDef {
    /// Input parameters
    pub inputs: Vec<Param>,
    /// `payable` or `nonpayable`
    pub state_mutability: StateMutability,
}

impl ConstructorDef {
    /// Input parameter types
    pub fn input_types(&self) -> Vec<ParamType> {
        kinds(&self.inputs)
    }

    /// Deployment payload: bytecode followed by the encoded arguments
    pub fn encode_input(&self, bytecode: &[u8], args: &[Token]) -> Result<Vec<u8>, AbiError> {
        let encoded = abi::encode(&self.input_types(), args)?;
        let mut data = Vec::with_capacity(bytecode.len() + encoded.len());
        data.extend_from_slice(bytecode);
        data.extend_from_slice(&encoded);
        Ok(data)
    }
}

/// Contract event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDef {
    /// Event name
    pub name: String,
    /// Parameters; `indexed` ones are stored in topics
    pub inputs: Vec<Param>,
    /// Anonymous events have no signature topic
    pub anonymous: bool,
}

/// A decoded event parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogParam {
    /// Parameter name
    pub name: String,
    /// Decoded value; indexed dynamic values are their 32-byte hash
    pub value: Token,
}

impl EventDef {
    /// Canonical signature, e.g. `Transfer(address,address,uint256)`
    pub fn signature(&self) -> String {
        signature(&self.name, &self.inputs)
    }

    /// Signature hash, the first topic of non-anonymous logs
    pub fn topic(&self) -> H256 {
        keccak256(self.signature())
    }

    /// Decode a log from its topics and data, in declaration order
    pub fn decode_log(
        &self,
        topics: &[H256],
        data: &[u8],
        options: &DecodeOptions,
    ) -> Result<Vec<LogParam>, AbiError> {
        let indexed_count = self.inputs.iter().filter(|p| p.indexed).count();
        let topic_offset = usize::from(!self.anonymous);
        if topics.len() != indexed_count + topic_offset {
            return Err(AbiError::ArityMismatch {
                expected: indexed_count + topic_offset,
                got: topics.len(),
            });
        }
        if !self.anonymous && topics[0] != self.topic() {
            return Err(AbiError::TopicMismatch {
                expected: self.topic(),
                got: topics[0],
            });
        }

        let unindexed: Vec<ParamType> = self
            .inputs
            .iter()
            .filter(|p| !p.indexed)
            .map(|p| p.kind.clone())
            .collect();
        let mut unindexed_values = abi::decode(&unindexed, data, options)?.into_iter();
        let mut indexed_topics = topics[topic_offset..].iter();

        let mut params = Vec::with_capacity(self.inputs.len());
        for input in &self.inputs {
            let value = if input.indexed {
                let topic = indexed_topics.next().ok_or(AbiError::ArityMismatch {
                    expected: indexed_count,
                    got: topics.len() - topic_offset,
                })?;
                decode_topic(&input.kind, topic, options)?
            } else {
                unindexed_values
                    .next()
                    .ok_or_else(|| AbiError::NotSupported("missing log value".into()))?
            };
            params.push(LogParam {
                name: input.name.clone(),
                value,
            });
        }

        tracing::debug!("Decoded {} log params for event {}", params.len(), self.name);
        Ok(params)
    }

    /// Topics for a log filter: the signature topic (unless anonymous)
    /// followed by one entry per indexed parameter, `None` matching anything
    pub fn encode_topics(&self, values: &[Option<Token>]) -> Result<Vec<Option<H256>>, AbiError> {
        let indexed: Vec<&Param> = self.inputs.iter().filter(|p| p.indexed).collect();
        if values.len() > indexed.len() {
            return Err(AbiError::ArityMismatch {
                expected: indexed.len(),
                got: values.len(),
            });
        }

        let mut topics = Vec::with_capacity(values.len() + 1);
        if !self.anonymous {
            topics.push(Some(self.topic()));
        }
        for (param, value) in indexed.iter().zip(values) {
            let topic = match value {
                Some(token) => Some(encode_topic(&param.kind, token)?),
                None => None,
            };
            topics.push(topic);
        }
        Ok(topics)
    }
}

/// Static values are decoded from the word, anything else is its hash
fn decode_topic(kind: &ParamType, topic: &H256, options: &DecodeOptions) -> Result<Token, AbiError> {
    if is_hashed_in_topic(kind) {
        return Ok(Token::FixedBytes(topic.as_bytes().to_vec()));
    }
    let mut tokens = abi::decode(std::slice::from_ref(kind), topic.as_bytes(), options)?;
    tokens
        .pop()
        .ok_or_else(|| AbiError::NotSupported(format!("empty topic for {kind}")))
}

fn encode_topic(kind: &ParamType, token: &Token) -> Result<H256, AbiError> {
    match (kind, token) {
        (ParamType::String, Token::String(s)) => Ok(keccak256(s.as_bytes())),
        (ParamType::Bytes, Token::Bytes(data) | Token::FixedBytes(data)) => Ok(keccak256(data)),
        (ParamType::Array(_) | ParamType::FixedArray(..) | ParamType::Tuple(_), _) => Err(
            AbiError::NotSupported(format!("indexed {kind} filter values")),
        ),
        _ => {
            let word = abi::encode(std::slice::from_ref(kind), std::slice::from_ref(token))?;
            Ok(H256::from_slice(&word)?)
        }
    }
}

fn is_hashed_in_topic(kind: &ParamType) -> bool {
    matches!(
        kind,
        ParamType::Bytes
            | ParamType::String
            | ParamType::Array(_)
            | ParamType::FixedArray(..)
            | ParamType::Tuple(_)
    )
}

/// Custom error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDef {
    /// Error name
    pub name: String,
    /// Error parameters
    pub inputs: Vec<Param>,
}

impl ErrorDef {
    /// Builtin `Error(string)` raised by `require` and `revert`
    pub fn revert() -> Self {
        ErrorDef {
            name: "Error".into(),
            inputs: vec![Param::new("message", ParamType::String)],
        }
    }

    /// Builtin `Panic(uint256)` raised by failed assertions and arithmetic
    pub fn panic() -> Self {
        ErrorDef {
            name: "Panic".into(),
            inputs: vec![Param::new("code", ParamType::Uint(256))],
        }
    }

    /// Canonical signature
    pub fn signature(&self) -> String {
        signature(&self.name, &self.inputs)
    }

    /// First 4 bytes of the signature hash
    pub fn selector(&self) -> Selector {
        Selector::from_signature(&self.signature())
    }

    /// Check the selector of revert data and decode the arguments
    pub fn decode(&self, data: &[u8], options: &DecodeOptions) -> Result<Vec<Token>, AbiError> {
        let args = strip_selector(self.selector(), data)?;
        abi::decode(&kinds(&self.inputs), args, options)
    }
}

/// Fallback function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FallbackDef {
    /// `payable` or `nonpayable`
    pub state_mutability: StateMutability,
}

/// Receive function, always payable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveDef {
    /// Always `payable`
    pub state_mutability: StateMutability,
}

impl Default for ReceiveDef {
    fn default() -> Self {
        Self {
            state_mutability: StateMutability::Payable,
        }
    }
}

/// One entry of an ABI document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawItem", into = "RawItem")]
pub enum AbiItem {
    /// Function
    Function(FunctionDef),
    /// Constructor
    Constructor(ConstructorDef),
    /// Event
    Event(EventDef),
    /// Custom error
    Error(ErrorDef),
    /// Fallback function
    Fallback(FallbackDef),
    /// Receive function
    Receive(ReceiveDef),
}

impl AbiItem {
    /// Kind of this item
    pub fn kind(&self) -> AbiItemKind {
        match self {
            AbiItem::Function(_) => AbiItemKind::Function,
            AbiItem::Constructor(_) => AbiItemKind::Constructor,
            AbiItem::Event(_) => AbiItemKind::Event,
            AbiItem::Error(_) => AbiItemKind::Error,
            AbiItem::Fallback(_) => AbiItemKind::Fallback,
            AbiItem::Receive(_) => AbiItemKind::Receive,
        }
    }

    /// Name of functions, events and errors
    pub fn name(&self) -> Option<&str> {
        match self {
            AbiItem::Function(f) => Some(&f.name),
            AbiItem::Event(e) => Some(&e.name),
            AbiItem::Error(e) => Some(&e.name),
            AbiItem::Constructor(_) | AbiItem::Fallback(_) | AbiItem::Receive(_) => None,
        }
    }
}

fn signature(name: &str, params: &[Param]) -> String {
    let types: Vec<String> = params.iter().map(|p| p.kind.to_string()).collect();
    format!("{}({})", name, types.join(","))
}

fn kinds(params: &[Param]) -> Vec<ParamType> {
    params.iter().map(|p| p.kind.clone()).collect()
}

fn strip_selector(expected: Selector, data: &[u8]) -> Result<&[u8], AbiError> {
    let got = Selector::from_calldata(data).ok_or(AbiError::InvalidDecodeDataSize {
        needed: Selector::LEN,
        available: data.len(),
    })?;
    if got != expected {
        return Err(AbiError::SelectorMismatch {
            expected,
            got: got.to_hex(),
        });
    }
    Ok(&data[Selector::LEN..])
}

// ==================== Human-readable rendering ====================

impl fmt::Display for AbiItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiItem::Function(func) => {
                write!(f, "function {}", func.name)?;
                write_params(f, &func.inputs)?;
                if func.state_mutability != StateMutability::NonPayable {
                    write!(f, " {}", func.state_mutability)?;
                }
                if !func.outputs.is_empty() {
                    f.write_str(" returns ")?;
                    write_params(f, &func.outputs)?;
                }
                Ok(())
            }
            AbiItem::Constructor(ctor) => {
                f.write_str("constructor")?;
                write_params(f, &ctor.inputs)?;
                if ctor.state_mutability.is_payable() {
                    f.write_str(" payable")?;
                }
                Ok(())
            }
            AbiItem::Event(event) => {
                write!(f, "event {}", event.name)?;
                write_params(f, &event.inputs)?;
                if event.anonymous {
                    f.write_str(" anonymous")?;
                }
                Ok(())
            }
            AbiItem::Error(error) => {
                write!(f, "error {}", error.name)?;
                write_params(f, &error.inputs)
            }
            AbiItem::Fallback(fallback) => {
                f.write_str("fallback() external")?;
                if fallback.state_mutability.is_payable() {
                    f.write_str(" payable")?;
                }
                Ok(())
            }
            AbiItem::Receive(_) => f.write_str("receive() external payable"),
        }
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[Param]) -> fmt::Result {
    f.write_str("(")?;
    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_kind(f, &param.kind)?;
        if param.indexed {
            f.write_str(" indexed")?;
        }
        if !param.name.is_empty() {
            write!(f, " {}", param.name)?;
        }
    }
    f.write_str(")")
}

/// Like `ParamType`'s `Display`, but keeps tuple component names
fn write_kind(f: &mut fmt::Formatter<'_>, kind: &ParamType) -> fmt::Result {
    match kind {
        ParamType::Tuple(params) => write_params(f, params),
        ParamType::Array(inner) => {
            write_kind(f, inner)?;
            f.write_str("[]")
        }
        ParamType::FixedArray(inner, size) => {
            write_kind(f, inner)?;
            write!(f, "[{size}]")
        }
        other => write!(f, "{other}"),
    }
}

// ==================== JSON ABI ====================

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    #[serde(rename = "type", default = "default_item_type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inputs: Option<Vec<Param>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    outputs: Option<Vec<Param>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state_mutability: Option<StateMutability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    anonymous: Option<bool>,
    #[serde(default, skip_serializing)]
    constant: Option<bool>,
    #[serde(default, skip_serializing)]
    payable: Option<bool>,
}

fn default_item_type() -> String {
    "function".to_string()
}

impl RawItem {
    fn new(kind: &str) -> Self {
        RawItem {
            kind: kind.to_string(),
            name: None,
            inputs: None,
            outputs: None,
            state_mutability: None,
            anonymous: None,
            constant: None,
            payable: None,
        }
    }

    /// `stateMutability`, or the legacy flags when it is absent
    fn mutability(&self) -> StateMutability {
        match (self.state_mutability, self.payable, self.constant) {
            (Some(m), _, _) => m,
            (None, Some(true), _) => StateMutability::Payable,
            (None, _, Some(true)) => StateMutability::View,
            _ => StateMutability::NonPayable,
        }
    }
}

impl From<AbiItem> for RawItem {
    fn from(item: AbiItem) -> Self {
        let mut raw = RawItem::new(&item.kind().to_string());
        match item {
            AbiItem::Function(func) => {
                raw.name = Some(func.name);
                raw.inputs = Some(func.inputs);
                raw.outputs = Some(func.outputs);
                raw.state_mutability = Some(func.state_mutability);
            }
            AbiItem::Constructor(ctor) => {
                raw.inputs = Some(ctor.inputs);
                raw.state_mutability = Some(ctor.state_mutability);
            }
            AbiItem::Event(event) => {
                raw.name = Some(event.name);
                raw.inputs = Some(event.inputs);
                raw.anonymous = Some(event.anonymous);
            }
            AbiItem::Error(error) => {
                raw.name = Some(error.name);
                raw.inputs = Some(error.inputs);
            }
            AbiItem::Fallback(fallback) => raw.state_mutability = Some(fallback.state_mutability),
            AbiItem::Receive(receive) => raw.state_mutability = Some(receive.state_mutability),
        }
        raw
    }
}

impl TryFrom<RawItem> for AbiItem {
    type Error = AbiError;

    fn try_from(raw: RawItem) -> Result<Self, AbiError> {
        let state_mutability = raw.mutability();
        let kind = raw.kind.as_str();
        let required_name = |name: Option<String>| {
            name.ok_or_else(|| AbiError::Json(format!("{kind} entry without a name")))
        };
        let item = match kind {
            "function" => AbiItem::Function(FunctionDef {
                name: required_name(raw.name)?,
                inputs: raw.inputs.unwrap_or_default(),
                outputs: raw.outputs.unwrap_or_default(),
                state_mutability,
            }),
            "constructor" => AbiItem::Constructor(ConstructorDef {
                inputs: raw.inputs.unwrap_or_default(),
                state_mutability,
            }),
            "event" => AbiItem::Event(EventDef {
                name: required_name(raw.name)?,
                inputs: raw.inputs.unwrap_or_default(),
                anonymous: raw.anonymous.unwrap_or(false),
            }),
            "error" => AbiItem::Error(ErrorDef {
                name: required_name(raw.name)?,
                inputs: raw.inputs.unwrap_or_default(),
            }),
            "fallback" => AbiItem::Fallback(FallbackDef { state_mutability }),
            "receive" => AbiItem::Receive(ReceiveDef::default()),
            other => return Err(AbiError::Json(format!("unknown ABI item type `{other}`"))),
        };
        Ok(item)
    }
}
