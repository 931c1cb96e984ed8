//! Error types for ABI encoding, decoding and contract interaction

use abikit_primitives::{AddressError, HashError, PrimitiveError, Selector, H256};
use thiserror::Error;

use crate::item::AbiItemKind;

/// Error type shared by every abikit operation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AbiError {
    // ==================== Parsing ====================
    /// Malformed human-readable signature
    #[error("parse error at position {position}: {message}")]
    Parse {
        /// Byte offset of the offending token
        position: usize,
        /// What went wrong
        message: String,
    },

    /// Malformed JSON ABI document
    #[error("invalid ABI JSON: {0}")]
    Json(String),

    // ==================== Type validation ====================
    /// Integer width outside 8..=256 or not a multiple of 8
    #[error("invalid integer bit size: {0}")]
    InvalidBitSize(usize),

    /// Fixed bytes width outside 1..=32
    #[error("invalid fixed bytes size: {0}")]
    InvalidBytesSize(usize),

    /// Function called through an operation its mutability does not allow
    #[error("function `{name}` is {mutability} and cannot be used for a {operation}")]
    InvalidFunctionMutability {
        /// Function name
        name: String,
        /// Declared state mutability
        mutability: String,
        /// Attempted operation (`read` or `write`)
        operation: &'static str,
    },

    /// Non-zero value sent to a constructor that is not payable
    #[error("constructor is not payable but a value was attached")]
    ValueInNonPayableConstructor,

    /// Non-zero value sent to a function that is not payable
    #[error("function `{0}` is not payable but a value was attached")]
    ValueInNonPayableFunction(String),

    // ==================== Encoding ====================
    /// Value does not fit the declared width
    #[error("value overflows type {0}")]
    Overflow(String),

    /// Token cannot be encoded as the declared type
    #[error("cannot encode {found} as {expected}")]
    InvalidEncodingType {
        /// Declared parameter type
        expected: String,
        /// Description of the supplied token
        found: String,
    },

    /// Number of values does not match the number of parameters
    #[error("expected {expected} values, got {got}")]
    ArityMismatch {
        /// Declared parameter count
        expected: usize,
        /// Supplied value count
        got: usize,
    },

    // ==================== Decoding ====================
    /// Buffer is too short for the declared layout
    #[error("invalid decode data size: need {needed} bytes, have {available}")]
    InvalidDecodeDataSize {
        /// Bytes required by the read
        needed: usize,
        /// Bytes available in the buffer
        available: usize,
    },

    /// Trailing bytes after the last consumed word in strict mode
    #[error("junk data not allowed: consumed {consumed} of {total} bytes")]
    JunkDataNotAllowed {
        /// Furthest byte read
        consumed: usize,
        /// Buffer length
        total: usize,
    },

    /// Length word beyond what the buffer or configured limit allows
    #[error("length {length} exceeds limit {limit}")]
    LengthMismatch {
        /// Declared length (saturated to usize)
        length: usize,
        /// Maximum accepted length at that position
        limit: usize,
    },

    /// Offset word points outside the buffer
    #[error("invalid offset {0}")]
    InvalidOffset(String),

    /// Word is not the canonical encoding of its type
    #[error("non-canonical encoding for {ty} at byte {position}")]
    InvalidPadding {
        /// Declared type
        ty: String,
        /// Offset of the word
        position: usize,
    },

    /// `string` payload is not valid UTF-8
    #[error("invalid UTF-8 in string: {0}")]
    InvalidUtf8(String),

    /// Call data selector does not match the expected item
    #[error("selector mismatch: expected {expected}, got {got}")]
    SelectorMismatch {
        /// Selector of the item being decoded
        expected: Selector,
        /// Selector found in the data
        got: String,
    },

    /// Log topic0 is not the event signature hash
    #[error("topic mismatch: expected {expected}, got {got}")]
    TopicMismatch {
        /// Signature hash of the event
        expected: H256,
        /// First topic of the log
        got: H256,
    },

    // ==================== Lookup ====================
    /// No item of that kind/name in the ABI
    #[error("ABI item not found: {kind}{}", .name.as_deref().map(|n| format!(" `{n}`")).unwrap_or_default())]
    AbiItemNotFound {
        /// Kind that was looked up
        kind: AbiItemKind,
        /// Name that was looked up, if any
        name: Option<String>,
    },

    /// Operation is not supported for this item or value
    #[error("not supported: {0}")]
    NotSupported(String),

    // ==================== Collaborator ====================
    /// Node returned an empty result for a call
    #[error("EVM failed to execute the call (empty return data)")]
    EvmFailedToExecute,

    /// Transport/network error
    #[error("transport error: {0}")]
    Transport(String),

    /// RPC error returned by the node
    #[error("RPC error: {code} - {message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },

    /// Invalid hex string
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl AbiError {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        AbiError::Parse {
            position,
            message: message.into(),
        }
    }
}

impl From<hex::FromHexError> for AbiError {
    fn from(e: hex::FromHexError) -> Self {
        AbiError::InvalidHex(e.to_string())
    }
}

impl From<serde_json::Error> for AbiError {
    fn from(e: serde_json::Error) -> Self {
        AbiError::Serialization(e.to_string())
    }
}

impl From<AddressError> for AbiError {
    fn from(e: AddressError) -> Self {
        AbiError::InvalidHex(e.to_string())
    }
}

impl From<HashError> for AbiError {
    fn from(e: HashError) -> Self {
        AbiError::InvalidHex(e.to_string())
    }
}

impl From<PrimitiveError> for AbiError {
    fn from(e: PrimitiveError) -> Self {
        AbiError::InvalidHex(e.to_string())
    }
}
