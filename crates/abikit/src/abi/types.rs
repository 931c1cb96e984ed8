//! ABI parameter type model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AbiError;

/// Largest inline layout, in bytes, accepted for a single parameter type
pub const MAX_STATIC_SIZE: usize = 1 << 24;

/// Solidity parameter types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// Address
    Address,
    /// Unsigned integer with bit size (8, 16, ..., 256)
    Uint(usize),
    /// Signed integer with bit size
    Int(usize),
    /// Boolean
    Bool,
    /// Dynamic bytes
    Bytes,
    /// Fixed-size bytes (size 1-32)
    FixedBytes(usize),
    /// UTF-8 string
    String,
    /// Dynamic array
    Array(Box<ParamType>),
    /// Fixed-size array
    FixedArray(Box<ParamType>, usize),
    /// Tuple with (possibly named) components
    Tuple(Vec<Param>),
}

/// A named parameter: function/event input or output, or a tuple component.
///
/// `name`, `indexed` and `internal_type` are metadata and never change the
/// wire encoding. Serializes to the JSON ABI parameter schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawParam", into = "RawParam")]
pub struct Param {
    /// Parameter name, empty when unnamed
    pub name: String,
    /// Parameter type
    pub kind: ParamType,
    /// Event parameter stored in a topic
    pub indexed: bool,
    /// Solidity-level type as reported by the compiler (`struct Foo`, `contract IERC20`)
    pub internal_type: Option<String>,
}

impl Param {
    /// Create a named parameter
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            indexed: false,
            internal_type: None,
        }
    }

    /// Create an unnamed parameter
    pub fn unnamed(kind: ParamType) -> Self {
        Self::new(String::new(), kind)
    }

    /// Create an indexed event parameter
    pub fn indexed(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            indexed: true,
            ..Self::new(name, kind)
        }
    }
}

impl ParamType {
    /// Checked `uintN`
    pub fn uint(bits: usize) -> Result<Self, AbiError> {
        check_bits(bits)?;
        Ok(ParamType::Uint(bits))
    }

    /// Checked `intN`
    pub fn int(bits: usize) -> Result<Self, AbiError> {
        check_bits(bits)?;
        Ok(ParamType::Int(bits))
    }

    /// Checked `bytesN`
    pub fn fixed_bytes(size: usize) -> Result<Self, AbiError> {
        check_bytes(size)?;
        Ok(ParamType::FixedBytes(size))
    }

    /// Tuple of unnamed components
    pub fn tuple(types: impl IntoIterator<Item = ParamType>) -> Self {
        ParamType::Tuple(types.into_iter().map(Param::unnamed).collect())
    }

    /// Dynamic array of `inner`
    pub fn array(inner: ParamType) -> Self {
        ParamType::Array(Box::new(inner))
    }

    /// Fixed array of `size` elements of `inner`
    pub fn fixed_array(inner: ParamType, size: usize) -> Self {
        ParamType::FixedArray(Box::new(inner), size)
    }

    /// Check bit and byte sizes of this type and every nested type
    pub fn validate(&self) -> Result<(), AbiError> {
        match self {
            ParamType::Uint(bits) | ParamType::Int(bits) => check_bits(*bits),
            ParamType::FixedBytes(size) => check_bytes(*size),
            ParamType::FixedArray(_, 0) => {
                Err(AbiError::NotSupported("zero-length fixed array".into()))
            }
            ParamType::FixedArray(inner, _) => {
                inner.validate()?;
                self.check_inline_size()
            }
            ParamType::Array(inner) => inner.validate(),
            ParamType::Tuple(params) => {
                params.iter().try_for_each(|p| p.kind.validate())?;
                self.check_inline_size()
            }
            ParamType::Address | ParamType::Bool | ParamType::Bytes | ParamType::String => Ok(()),
        }
    }

    fn check_inline_size(&self) -> Result<(), AbiError> {
        match self.inline_size() {
            Some(size) if size <= MAX_STATIC_SIZE => Ok(()),
            _ => Err(AbiError::NotSupported(format!(
                "{self} exceeds the {MAX_STATIC_SIZE} byte inline layout limit"
            ))),
        }
    }

    /// Bytes written in place for this type when it is laid out inline, with
    /// dynamic members counted as one offset word. `None` on overflow.
    fn inline_size(&self) -> Option<usize> {
        match self {
            ParamType::FixedArray(inner, size) => inner.slot_size()?.checked_mul(*size),
            ParamType::Tuple(params) => params
                .iter()
                .try_fold(0usize, |acc, p| acc.checked_add(p.kind.slot_size()?)),
            _ => Some(32),
        }
    }

    fn slot_size(&self) -> Option<usize> {
        if self.is_dynamic() {
            Some(32)
        } else {
            self.inline_size()
        }
    }

    /// Check if this type is dynamic (variable length)
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            ParamType::Tuple(params) => params.iter().any(|p| p.kind.is_dynamic()),
            ParamType::Address
            | ParamType::Uint(_)
            | ParamType::Int(_)
            | ParamType::Bool
            | ParamType::FixedBytes(_) => false,
        }
    }

    /// Bytes this type occupies in the head of its enclosing block.
    ///
    /// Dynamic types take a single offset word; static compounds are laid out
    /// inline.
    /// Saturates at `usize::MAX` for types that fail [`ParamType::validate`].
    pub fn head_size(&self) -> usize {
        self.slot_size().unwrap_or(usize::MAX)
    }
}

fn check_bits(bits: usize) -> Result<(), AbiError> {
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(AbiError::InvalidBitSize(bits));
    }
    Ok(())
}

fn check_bytes(size: usize) -> Result<(), AbiError> {
    if size == 0 || size > 32 {
        return Err(AbiError::InvalidBytesSize(size));
    }
    Ok(())
}

/// Canonical form as used in signatures: `uint256`, `(address,bytes)[]`
impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Address => f.write_str("address"),
            ParamType::Uint(bits) => write!(f, "uint{bits}"),
            ParamType::Int(bits) => write!(f, "int{bits}"),
            ParamType::Bool => f.write_str("bool"),
            ParamType::Bytes => f.write_str("bytes"),
            ParamType::FixedBytes(size) => write!(f, "bytes{size}"),
            ParamType::String => f.write_str("string"),
            ParamType::Array(inner) => write!(f, "{inner}[]"),
            ParamType::FixedArray(inner, size) => write!(f, "{inner}[{size}]"),
            ParamType::Tuple(params) => {
                f.write_str("(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", param.kind)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for ParamType {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::human_readable::parse_type(s)
    }
}

/// JSON ABI parameter: tuples are spelled `tuple[..]` with `components`
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    components: Vec<Param>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    indexed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    internal_type: Option<String>,
}

impl From<Param> for RawParam {
    fn from(param: Param) -> Self {
        let (kind, components) = json_type(param.kind);
        RawParam {
            name: param.name,
            kind,
            components,
            indexed: param.indexed,
            internal_type: param.internal_type,
        }
    }
}

impl TryFrom<RawParam> for Param {
    type Error = AbiError;

    fn try_from(raw: RawParam) -> Result<Self, Self::Error> {
        let kind = match raw.kind.strip_prefix("tuple") {
            Some(suffix) => with_array_suffix(ParamType::Tuple(raw.components), suffix)?,
            None => crate::human_readable::parse_type(&raw.kind)?,
        };
        kind.validate()?;
        Ok(Param {
            name: raw.name,
            kind,
            indexed: raw.indexed,
            internal_type: raw.internal_type,
        })
    }
}

fn json_type(kind: ParamType) -> (String, Vec<Param>) {
    match kind {
        ParamType::Tuple(params) => ("tuple".to_string(), params),
        ParamType::Array(inner) => {
            let (base, components) = json_type(*inner);
            (format!("{base}[]"), components)
        }
        ParamType::FixedArray(inner, size) => {
            let (base, components) = json_type(*inner);
            (format!("{base}[{size}]"), components)
        }
        other => (other.to_string(), Vec::new()),
    }
}

/// Wrap `base` in the array dimensions of a `[]`/`[N]` suffix, innermost first
fn with_array_suffix(base: ParamType, suffix: &str) -> Result<ParamType, AbiError> {
    let mut kind = base;
    let mut rest = suffix;
    while !rest.is_empty() {
        let bad = || AbiError::Json(format!("invalid tuple type suffix `{suffix}`"));
        let inner = rest.strip_prefix('[').ok_or_else(bad)?;
        let close = inner.find(']').ok_or_else(bad)?;
        kind = match &inner[..close] {
            "" => ParamType::array(kind),
            size => ParamType::fixed_array(kind, size.parse().map_err(|_| bad())?),
        };
        rest = &inner[close + 1..];
    }
    Ok(kind)
}
