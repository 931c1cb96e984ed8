//! # abikit-primitives
//!
//! Primitive Ethereum types shared by the abikit crates.
//!
//! - [`Address`]: 20-byte account address with EIP-55 checksum rendering
//! - [`H256`]: 32-byte hash / log topic
//! - [`Selector`]: 4-byte function or error selector
//! - [`keccak256`]: the hash used for selectors and event topics
//! - [`U256`]: re-exported from `primitive-types`

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;

pub use address::{Address, AddressError};
pub use error::PrimitiveError;
pub use hash::{keccak256, HashError, Selector, H256};

pub use primitive_types::U256;

/// Parse a `0x`-prefixed (or bare) hex string into bytes.
///
/// An empty string or a lone `0x` yields an empty vector.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, PrimitiveError> {
    let s = s.trim();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(s).map_err(|e| PrimitiveError::InvalidHex(e.to_string()))
}

/// Render bytes as a `0x`-prefixed lowercase hex string.
pub fn encode_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}
