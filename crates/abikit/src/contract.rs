//! ABI documents and contract call payloads

use abikit_primitives::{Selector, U256};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::abi::{DecodeOptions, Token};
use crate::human_readable;
use crate::item::{AbiItem, AbiItemKind, ConstructorDef, ErrorDef, EventDef, FunctionDef};
use crate::AbiError;

/// An ordered list of ABI items.
///
/// Lookups scan in declaration order and return the first match, so for
/// overloaded names the earliest declaration wins; use
/// [`Abi::function_by_selector`] to pick a specific overload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Abi {
    items: Vec<AbiItem>,
}

/// A revert payload matched against the ABI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedError {
    /// Matched error definition (custom, `Error(string)` or `Panic(uint256)`)
    pub error: ErrorDef,
    /// Decoded arguments
    pub args: Vec<Token>,
}

impl Abi {
    /// Create from items
    pub fn new(items: Vec<AbiItem>) -> Self {
        Self { items }
    }

    /// Parse a JSON ABI: a bare array, or a compiler artifact with an `abi` field
    pub fn from_json(json: &str) -> Result<Self, AbiError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| AbiError::Json(e.to_string()))?;
        let value = match value {
            serde_json::Value::Object(mut artifact) => artifact
                .remove("abi")
                .ok_or_else(|| AbiError::Json("expected an array or an object with `abi`".into()))?,
            other => other,
        };
        let abi: Abi = serde_json::from_value(value).map_err(|e| AbiError::Json(e.to_string()))?;
        tracing::debug!("Loaded JSON ABI with {} items", abi.items.len());
        Ok(abi)
    }

    /// Serialize to a JSON ABI array
    pub fn to_json(&self) -> Result<String, AbiError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse human-readable declarations
    pub fn parse_human_readable(input: &str) -> Result<Self, AbiError> {
        human_readable::parse_abi(input)
    }

    /// All items in declaration order
    pub fn items(&self) -> &[AbiItem] {
        &self.items
    }

    /// All functions in declaration order
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.items.iter().filter_map(|item| match item {
            AbiItem::Function(f) => Some(f),
            _ => None,
        })
    }

    /// All events in declaration order
    pub fn events(&self) -> impl Iterator<Item = &EventDef> {
        self.items.iter().filter_map(|item| match item {
            AbiItem::Event(e) => Some(e),
            _ => None,
        })
    }

    /// All custom errors in declaration order
    pub fn errors(&self) -> impl Iterator<Item = &ErrorDef> {
        self.items.iter().filter_map(|item| match item {
            AbiItem::Error(e) => Some(e),
            _ => None,
        })
    }

    /// Find the first item of `kind` named `name`.
    ///
    /// The name is ignored for constructors. Fallback and receive functions
    /// cannot be looked up.
    pub fn get_abi_item(&self, kind: AbiItemKind, name: &str) -> Result<&AbiItem, AbiError> {
        match kind {
            AbiItemKind::Fallback | AbiItemKind::Receive => {
                Err(AbiError::NotSupported(format!("{kind} lookup")))
            }
            AbiItemKind::Constructor => self
                .items
                .iter()
                .find(|item| item.kind() == kind)
                .ok_or(AbiError::AbiItemNotFound { kind, name: None }),
            _ => self
                .items
                .iter()
                .find(|item| item.kind() == kind && item.name() == Some(name))
                .ok_or_else(|| not_found(kind, name)),
        }
    }

    /// First function named `name`
    pub fn function(&self, name: &str) -> Result<&FunctionDef, AbiError> {
        self.functions()
            .find(|f| f.name == name)
            .ok_or_else(|| not_found(AbiItemKind::Function, name))
    }

    /// The constructor, if declared
    pub fn constructor(&self) -> Result<&ConstructorDef, AbiError> {
        self.items
            .iter()
            .find_map(|item| match item {
                AbiItem::Constructor(c) => Some(c),
                _ => None,
            })
            .ok_or(AbiError::AbiItemNotFound {
                kind: AbiItemKind::Constructor,
                name: None,
            })
    }

    /// First event named `name`
    pub fn event(&self, name: &str) -> Result<&EventDef, AbiError> {
        self.events()
            .find(|e| e.name == name)
            .ok_or_else(|| not_found(AbiItemKind::Event, name))
    }

    /// First custom error named `name`
    pub fn error(&self, name: &str) -> Result<&ErrorDef, AbiError> {
        self.errors()
            .find(|e| e.name == name)
            .ok_or_else(|| not_found(AbiItemKind::Error, name))
    }

    /// Function whose selector matches exactly
    pub fn function_by_selector(&self, selector: Selector) -> Result<&FunctionDef, AbiError> {
        self.functions()
            .find(|f| f.selector() == selector)
            .ok_or_else(|| AbiError::AbiItemNotFound {
                kind: AbiItemKind::Function,
                name: Some(selector.to_hex()),
            })
    }

    /// Custom error whose selector matches exactly
    pub fn error_by_selector(&self, selector: Selector) -> Result<&ErrorDef, AbiError> {
        self.errors()
            .find(|e| e.selector() == selector)
            .ok_or_else(|| AbiError::AbiItemNotFound {
                kind: AbiItemKind::Error,
                name: Some(selector.to_hex()),
            })
    }

    // ==================== Call payloads ====================

    /// Call data for an `eth_call` to a `view` or `pure` function
    pub fn encode_read_call(&self, name: &str, args: &[Token]) -> Result<Bytes, AbiError> {
        let function = self.function(name)?;
        if !function.state_mutability.is_read_only() {
            return Err(AbiError::InvalidFunctionMutability {
                name: name.to_string(),
                mutability: function.state_mutability.to_string(),
                operation: "read",
            });
        }
        tracing::debug!("Encoding read call {}", function.signature());
        Ok(Bytes::from(function.encode_input(args)?))
    }

    /// Call data for a transaction to a state-changing function
    pub fn encode_write_call(&self, name: &str, args: &[Token], value: U256) -> Result<Bytes, AbiError> {
        let function = self.function(name)?;
        if function.state_mutability.is_read_only() {
            return Err(AbiError::InvalidFunctionMutability {
                name: name.to_string(),
                mutability: function.state_mutability.to_string(),
                operation: "write",
            });
        }
        if !value.is_zero() && !function.state_mutability.is_payable() {
            return Err(AbiError::ValueInNonPayableFunction(name.to_string()));
        }
        tracing::debug!("Encoding write call {} with value {}", function.signature(), value);
        Ok(Bytes::from(function.encode_input(args)?))
    }

    /// Deployment payload: bytecode followed by the encoded constructor
    /// arguments. Without a declared constructor only an empty argument list
    /// and a zero value are accepted.
    pub fn encode_deploy(&self, bytecode: &[u8], args: &[Token], value: U256) -> Result<Bytes, AbiError> {
        let constructor = match self.constructor() {
            Ok(constructor) => constructor.clone(),
            Err(AbiError::AbiItemNotFound { .. }) => ConstructorDef::default(),
            Err(e) => return Err(e),
        };
        if !value.is_zero() && !constructor.state_mutability.is_payable() {
            return Err(AbiError::ValueInNonPayableConstructor);
        }
        tracing::debug!(
            "Encoding deployment: {} bytes of code, {} args",
            bytecode.len(),
            args.len()
        );
        Ok(Bytes::from(constructor.encode_input(bytecode, args)?))
    }

    /// Decode the return data of function `name`
    pub fn decode_function_output(
        &self,
        name: &str,
        data: &[u8],
        options: &DecodeOptions,
    ) -> Result<Vec<Token>, AbiError> {
        self.function(name)?.decode_output(data, options)
    }

    /// Decode revert data: builtin `Error(string)` and `Panic(uint256)`
    /// first, then custom errors by selector
    pub fn decode_error(&self, data: &[u8], options: &DecodeOptions) -> Result<DecodedError, AbiError> {
        let selector = Selector::from_calldata(data).ok_or(AbiError::InvalidDecodeDataSize {
            needed: Selector::LEN,
            available: data.len(),
        })?;
        let builtin = [ErrorDef::revert(), ErrorDef::panic()]
            .into_iter()
            .find(|builtin| builtin.selector() == selector);
        let error = match builtin {
            Some(error) => error,
            None => self.error_by_selector(selector)?.clone(),
        };
        let args = error.decode(data, options)?;
        Ok(DecodedError { error, args })
    }
}

fn not_found(kind: AbiItemKind, name: &str) -> AbiError {
    AbiError::AbiItemNotFound {
        kind,
        name: Some(name.to_string()),
    }
}

impl FromIterator<AbiItem> for Abi {
    fn from_iter<I: IntoIterator<Item = AbiItem>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The ERC-20 token interface
pub fn erc20() -> Abi {
    const ERC20: &str = "
        function name() view returns (string)
        function symbol() view returns (string)
        function decimals() view returns (uint8)
        function totalSupply() view returns (uint256)
        function balanceOf(address owner) view returns (uint256)
        function transfer(address to, uint256 amount) returns (bool)
        function approve(address spender, uint256 amount) returns (bool)
        function allowance(address owner, address spender) view returns (uint256)
        function transferFrom(address from, address to, uint256 amount) returns (bool)
        event Transfer(address indexed from, address indexed to, uint256 value)
        event Approval(address indexed owner, address indexed spender, uint256 value)
    ";
    human_readable::parse_abi(ERC20).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{encode, ParamType};
    use abikit_primitives::Address;

    const ERC721_JSON: &str = r#"[
        {"type":"constructor","inputs":[{"name":"name","type":"string"}],"stateMutability":"nonpayable"},
        {"type":"function","name":"ownerOf","inputs":[{"name":"tokenId","type":"uint256"}],
         "outputs":[{"name":"","type":"address"}],"stateMutability":"view"},
        {"type":"function","name":"mint","inputs":[{"name":"to","type":"address"}],
         "outputs":[],"stateMutability":"payable"},
        {"type":"function","name":"burn","inputs":[{"name":"tokenId","type":"uint256"}],
         "outputs":[],"stateMutability":"nonpayable"},
        {"type":"error","name":"NotOwner","inputs":[{"name":"caller","type":"address"}]},
        {"type":"event","name":"Transfer","anonymous":false,"inputs":[
            {"name":"from","type":"address","indexed":true},
            {"name":"to","type":"address","indexed":true},
            {"name":"tokenId","type":"uint256","indexed":true}]}
    ]"#;

    fn erc721() -> Abi {
        Abi::from_json(ERC721_JSON).unwrap()
    }

    #[test]
    fn test_get_abi_item() {
        let abi = erc721();
        let item = abi.get_abi_item(AbiItemKind::Function, "ownerOf").unwrap();
        assert_eq!(item.name(), Some("ownerOf"));

        assert_eq!(
            abi.get_abi_item(AbiItemKind::Function, "missing"),
            Err(AbiError::AbiItemNotFound {
                kind: AbiItemKind::Function,
                name: Some("missing".into()),
            })
        );
        assert!(abi.get_abi_item(AbiItemKind::Constructor, "ignored").is_ok());
        assert!(matches!(
            abi.get_abi_item(AbiItemKind::Receive, ""),
            Err(AbiError::NotSupported(_))
        ));
        assert!(abi.event("Transfer").is_ok());
        assert!(abi.get_abi_item(AbiItemKind::Event, "ownerOf").is_err());
    }

    #[test]
    fn test_overloads_first_match_wins() {
        let abi = Abi::parse_human_readable(
            "function f(uint256) view returns (uint256)\nfunction f(address) view returns (uint256)",
        )
        .unwrap();
        assert_eq!(abi.function("f").unwrap().signature(), "f(uint256)");

        let second = Selector::from_signature("f(address)");
        assert_eq!(abi.function_by_selector(second).unwrap().signature(), "f(address)");
    }

    #[test]
    fn test_mutability_gate() {
        let abi = erc721();
        let token = [Token::uint(1u64)];

        assert!(abi.encode_read_call("ownerOf", &token).is_ok());
        assert!(matches!(
            abi.encode_read_call("burn", &token),
            Err(AbiError::InvalidFunctionMutability { operation: "read", .. })
        ));
        assert!(matches!(
            abi.encode_write_call("ownerOf", &token, U256::zero()),
            Err(AbiError::InvalidFunctionMutability { operation: "write", .. })
        ));
        assert_eq!(
            abi.encode_write_call("burn", &token, U256::one()),
            Err(AbiError::ValueInNonPayableFunction("burn".into()))
        );

        let to = [Token::Address(Address::ZERO)];
        let data = abi.encode_write_call("mint", &to, U256::from(10)).unwrap();
        assert_eq!(&data[..4], Selector::from_signature("mint(address)").as_bytes());
    }

    #[test]
    fn test_encode_deploy() {
        let bytecode = [0x60, 0x80, 0x60, 0x40];
        let abi = erc721();
        let args = [Token::string("Token")];

        let data = abi.encode_deploy(&bytecode, &args, U256::zero()).unwrap();
        assert_eq!(&data[..4], &bytecode);
        assert_eq!(&data[4..], encode(&[ParamType::String], &args).unwrap().as_slice());

        assert_eq!(
            abi.encode_deploy(&bytecode, &args, U256::one()),
            Err(AbiError::ValueInNonPayableConstructor)
        );

        let payable = Abi::parse_human_readable("constructor() payable").unwrap();
        assert!(payable.encode_deploy(&bytecode, &[], U256::zero()).is_ok());
        assert!(payable.encode_deploy(&bytecode, &[], U256::one()).is_ok());
    }

    #[test]
    fn test_deploy_without_constructor() {
        let abi = erc20();
        let bytecode = [0xfe];
        assert_eq!(
            abi.encode_deploy(&bytecode, &[], U256::zero()).unwrap().as_ref(),
            &bytecode
        );
        assert_eq!(
            abi.encode_deploy(&bytecode, &[Token::bool(true)], U256::zero()),
            Err(AbiError::ArityMismatch { expected: 0, got: 1 })
        );
    }

    #[test]
    fn test_decode_error() {
        let abi = erc721();
        let options = DecodeOptions::default();

        let mut revert = Selector::from_signature("Error(string)").as_bytes().to_vec();
        revert.extend(encode(&[ParamType::String], &[Token::string("not allowed")]).unwrap());
        let decoded = abi.decode_error(&revert, &options).unwrap();
        assert_eq!(decoded.error.name, "Error");
        assert_eq!(decoded.args, vec![Token::string("not allowed")]);

        let mut custom = Selector::from_signature("NotOwner(address)").as_bytes().to_vec();
        custom.extend(encode(&[ParamType::Address], &[Token::Address(Address::ZERO)]).unwrap());
        assert_eq!(abi.decode_error(&custom, &options).unwrap().error.name, "NotOwner");

        assert!(matches!(
            abi.decode_error(&[0xde, 0xad, 0xbe, 0xef], &options),
            Err(AbiError::AbiItemNotFound { kind: AbiItemKind::Error, .. })
        ));
    }

    #[test]
    fn test_json_artifact_and_round_trip() {
        let artifact = format!(r#"{{"contractName":"Nft","abi":{ERC721_JSON}}}"#);
        let abi = Abi::from_json(&artifact).unwrap();
        assert_eq!(abi, erc721());

        let back = Abi::from_json(&abi.to_json().unwrap()).unwrap();
        assert_eq!(back, abi);

        assert!(matches!(Abi::from_json("{}"), Err(AbiError::Json(_))));
        assert!(matches!(Abi::from_json("not json"), Err(AbiError::Json(_))));
    }

    #[test]
    fn test_erc20_selectors() {
        let abi = erc20();
        assert_eq!(abi.function("transfer").unwrap().selector().to_hex(), "0xa9059cbb");
        assert_eq!(abi.function("balanceOf").unwrap().selector().to_hex(), "0x70a08231");
        assert_eq!(abi.events().count(), 2);

        let balance = [0u8; 32];
        let decoded = abi
            .decode_function_output("balanceOf", &balance, &DecodeOptions::default())
            .unwrap();
        assert_eq!(decoded, vec![Token::Uint(U256::zero())]);
    }
}
