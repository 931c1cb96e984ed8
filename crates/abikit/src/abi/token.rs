//! ABI values

use std::fmt;
use std::str::FromStr;

use abikit_primitives::{Address, H256, U256};

use super::types::ParamType;
use crate::AbiError;

/// Solidity ABI token types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Address (20 bytes)
    Address(Address),
    /// Unsigned integer (8-256 bits)
    Uint(U256),
    /// Signed integer (8-256 bits)
    Int(I256),
    /// Boolean
    Bool(bool),
    /// Dynamic bytes
    Bytes(Vec<u8>),
    /// Fixed-size bytes (1-32)
    FixedBytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Dynamic array
    Array(Vec<Token>),
    /// Fixed-size array
    FixedArray(Vec<Token>),
    /// Tuple (struct)
    Tuple(Vec<Token>),
}

/// Signed 256-bit integer in sign-magnitude form.
///
/// Zero is never negative; use [`I256::new`] to keep that invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct I256 {
    abs: U256,
    negative: bool,
}

impl I256 {
    /// Create from magnitude and sign
    pub fn new(abs: U256, negative: bool) -> Self {
        Self {
            abs,
            negative: negative && !abs.is_zero(),
        }
    }

    /// Create from i128
    pub fn from_i128(value: i128) -> Self {
        Self::new(U256::from(value.unsigned_abs()), value < 0)
    }

    /// Absolute value
    pub fn abs(&self) -> U256 {
        self.abs
    }

    /// Sign
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.abs.is_zero()
    }

    /// Whether the value is representable as a two's complement `intN`
    pub fn fits(&self, bits: usize) -> bool {
        if bits == 0 || bits > 256 {
            return false;
        }
        let limit = U256::one() << (bits - 1);
        if self.negative {
            self.abs <= limit
        } else {
            self.abs < limit
        }
    }

    /// 32-byte big-endian two's complement word.
    ///
    /// The caller must check `fits(256)` first; larger magnitudes wrap.
    pub fn to_word(&self) -> [u8; 32] {
        let value = if self.negative {
            (!self.abs).overflowing_add(U256::one()).0
        } else {
            self.abs
        };
        let mut word = [0u8; 32];
        value.to_big_endian(&mut word);
        word
    }

    /// Read a 32-byte two's complement word
    pub fn from_word(word: &[u8; 32]) -> Self {
        let raw = U256::from_big_endian(word);
        if word[0] & 0x80 != 0 {
            Self::new((!raw).overflowing_add(U256::one()).0, true)
        } else {
            Self::new(raw, false)
        }
    }
}

impl From<i64> for I256 {
    fn from(value: i64) -> Self {
        Self::from_i128(value as i128)
    }
}

impl From<i128> for I256 {
    fn from(value: i128) -> Self {
        Self::from_i128(value)
    }
}

impl fmt::Display for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        write!(f, "{}", self.abs)
    }
}

impl FromStr for I256 {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        Ok(Self::new(parse_u256(digits)?, negative))
    }
}

/// Parse a decimal or `0x` hex unsigned integer
pub(crate) fn parse_u256(s: &str) -> Result<U256, AbiError> {
    let s = s.trim();
    if let Some(hex_digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex_digits.is_empty() || hex_digits.len() > 64 {
            return Err(AbiError::InvalidHex(format!("bad integer literal `{s}`")));
        }
        let padded = format!("{:0>64}", hex_digits);
        let bytes = hex::decode(padded)?;
        return Ok(U256::from_big_endian(&bytes));
    }
    U256::from_dec_str(s).map_err(|_| AbiError::Overflow(format!("integer literal `{s}`")))
}

impl Token {
    /// Create an address token
    pub fn address(addr: Address) -> Self {
        Token::Address(addr)
    }

    /// Create an unsigned integer token
    pub fn uint(value: impl Into<U256>) -> Self {
        Token::Uint(value.into())
    }

    /// Create a signed integer token
    pub fn int(value: i128) -> Self {
        Token::Int(I256::from_i128(value))
    }

    /// Create a bool token
    pub fn bool(value: bool) -> Self {
        Token::Bool(value)
    }

    /// Create a bytes token
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Token::Bytes(data.into())
    }

    /// Create a string token
    pub fn string(s: impl Into<String>) -> Self {
        Token::String(s.into())
    }

    /// Create a bytes32 token
    pub fn bytes32(data: H256) -> Self {
        Token::FixedBytes(data.as_bytes().to_vec())
    }

    /// Short description used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::Address(_) => "address",
            Token::Uint(_) => "unsigned integer",
            Token::Int(i) if i.is_negative() => "negative integer",
            Token::Int(_) => "signed integer",
            Token::Bool(_) => "bool",
            Token::Bytes(_) => "bytes",
            Token::FixedBytes(_) => "fixed bytes",
            Token::String(_) => "string",
            Token::Array(_) => "array",
            Token::FixedArray(_) => "fixed array",
            Token::Tuple(_) => "tuple",
        }
    }

    /// Infer the widest matching parameter type.
    ///
    /// Integers infer as 256 bits; an empty array infers `uint256[]`.
    pub fn type_of(&self) -> ParamType {
        match self {
            Token::Address(_) => ParamType::Address,
            Token::Uint(_) => ParamType::Uint(256),
            Token::Int(_) => ParamType::Int(256),
            Token::Bool(_) => ParamType::Bool,
            Token::Bytes(_) => ParamType::Bytes,
            Token::FixedBytes(b) => ParamType::FixedBytes(b.len()),
            Token::String(_) => ParamType::String,
            Token::Array(tokens) => {
                let inner = tokens.first().map(|t| t.type_of()).unwrap_or(ParamType::Uint(256));
                ParamType::array(inner)
            }
            Token::FixedArray(tokens) => {
                let inner = tokens.first().map(|t| t.type_of()).unwrap_or(ParamType::Uint(256));
                ParamType::fixed_array(inner, tokens.len())
            }
            Token::Tuple(tokens) => ParamType::tuple(tokens.iter().map(|t| t.type_of())),
        }
    }

    /// Unsigned integer value, if any
    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Token::Uint(v) => Some(*v),
            _ => None,
        }
    }

    /// Signed integer value, if any
    pub fn as_int(&self) -> Option<I256> {
        match self {
            Token::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Address value, if any
    pub fn as_address(&self) -> Option<Address> {
        match self {
            Token::Address(a) => Some(*a),
            _ => None,
        }
    }

    /// Bool value, if any
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Token::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String value, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Token::String(s) => Some(s),
            _ => None,
        }
    }

    /// Byte content of `bytes` and `bytesN` tokens
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Token::Bytes(b) | Token::FixedBytes(b) => Some(b),
            _ => None,
        }
    }

    /// Members of arrays and tuples
    pub fn as_slice(&self) -> Option<&[Token]> {
        match self {
            Token::Array(t) | Token::FixedArray(t) | Token::Tuple(t) => Some(t),
            _ => None,
        }
    }
}

/// Renders the same syntax [`crate::abi::tokenize`] accepts.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Address(a) => write!(f, "{a}"),
            Token::Uint(v) => write!(f, "{v}"),
            Token::Int(v) => write!(f, "{v}"),
            Token::Bool(b) => write!(f, "{b}"),
            Token::Bytes(b) | Token::FixedBytes(b) => write!(f, "0x{}", hex::encode(b)),
            Token::String(s) => write!(f, "{s:?}"),
            Token::Array(items) | Token::FixedArray(items) => write_list(f, "[", items, "]"),
            Token::Tuple(items) => write_list(f, "(", items, ")"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, open: &str, items: &[Token], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(close)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_of() {
        assert_eq!(Token::Address(Address::ZERO).type_of(), ParamType::Address);
        assert_eq!(Token::Uint(U256::zero()).type_of(), ParamType::Uint(256));
        assert_eq!(Token::Bool(true).type_of(), ParamType::Bool);
        assert_eq!(
            Token::Tuple(vec![Token::bool(true), Token::string("x")]).type_of(),
            ParamType::tuple([ParamType::Bool, ParamType::String])
        );
    }

    #[test]
    fn test_i256_from_i128() {
        let positive = I256::from_i128(100);
        assert!(!positive.is_negative());
        assert_eq!(positive.abs(), U256::from(100));

        let negative = I256::from_i128(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs(), U256::from(100));

        assert!(I256::from_i128(0).is_zero());
        assert_eq!(I256::from_i128(i128::MIN).abs(), U256::from(1u128 << 127));
    }

    #[test]
    fn test_i256_no_negative_zero() {
        assert_eq!(I256::new(U256::zero(), true), I256::default());
        assert_eq!("-0".parse::<I256>().unwrap(), I256::default());
    }

    #[test]
    fn test_i256_fits() {
        assert!(I256::from_i128(127).fits(8));
        assert!(!I256::from_i128(128).fits(8));
        assert!(I256::from_i128(-128).fits(8));
        assert!(!I256::from_i128(-129).fits(8));

        let min = I256::new(U256::one() << 255, true);
        assert!(min.fits(256));
        let too_big = I256::new(U256::one() << 255, false);
        assert!(!too_big.fits(256));
    }

    #[test]
    fn test_i256_word_round_trip() {
        let minus_one = I256::from_i128(-1);
        assert_eq!(minus_one.to_word(), [0xff; 32]);
        assert_eq!(I256::from_word(&[0xff; 32]), minus_one);

        let min = I256::new(U256::one() << 255, true);
        let mut word = [0u8; 32];
        word[0] = 0x80;
        assert_eq!(min.to_word(), word);
        assert_eq!(I256::from_word(&word), min);
    }

    #[test]
    fn test_i256_parse_display() {
        let value: I256 = "-12345".parse().unwrap();
        assert_eq!(value, I256::from_i128(-12345));
        assert_eq!(value.to_string(), "-12345");
        assert_eq!("0xff".parse::<I256>().unwrap(), I256::from_i128(255));
        assert!("12a".parse::<I256>().is_err());
    }

    #[test]
    fn test_token_display() {
        let token = Token::Tuple(vec![
            Token::uint(7u64),
            Token::Array(vec![Token::int(-1), Token::int(2)]),
            Token::string("hi"),
            Token::bytes(vec![0xbe, 0xef]),
        ]);
        assert_eq!(token.to_string(), r#"(7,[-1,2],"hi",0xbeef)"#);
    }
}
