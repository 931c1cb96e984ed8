//! Human-readable ABI parsing
//!
//! Accepts Solidity-like declarations, one per line or separated by `;`:
//!
//! ```text
//! struct Order { address maker; uint256[] amounts; }
//! function fill(Order order, bytes signature) payable returns (bool)
//! event Filled(address indexed maker, Order order)
//! error Expired(uint256 deadline)
//! constructor(address owner) payable
//! ```
//!
//! Any failure rejects the whole input with [`AbiError::Parse`], which
//! carries the byte offset of the offending token.

mod lexer;
mod parser;

use crate::abi::{Param, ParamType};
use crate::contract::Abi;
use crate::item::AbiItem;
use crate::AbiError;

use parser::Parser;

/// Parse a document of declarations into an [`Abi`]
pub fn parse_abi(input: &str) -> Result<Abi, AbiError> {
    let items = Parser::new(input)?.parse_items()?;
    tracing::debug!("Parsed {} human-readable ABI items", items.len());
    Ok(Abi::new(items))
}

/// Parse one declaration, e.g. `function balanceOf(address) view returns (uint256)`.
///
/// A bare `name(types..)` is read as a function.
pub fn parse_signature(input: &str) -> Result<AbiItem, AbiError> {
    Parser::new(input)?.parse_item()
}

/// Parse one type, e.g. `(uint256,string)[]` or `tuple(address to, uint value)`
pub fn parse_type(input: &str) -> Result<ParamType, AbiError> {
    Parser::new(input)?.parse_type()
}

/// Parse a parameter list such as `address to, uint256 amount` or `(bool,bytes)`
pub fn parse_params(input: &str) -> Result<Vec<Param>, AbiError> {
    Parser::new(input)?.parse_params()
}
