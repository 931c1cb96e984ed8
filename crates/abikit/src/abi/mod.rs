//! ABI encoding and decoding for Solidity contracts
//!
//! This module provides functionality for:
//! - Encoding values against parameter types (standard and packed)
//! - Decoding return data and call data, strictly or leniently
//! - Parsing values from text
//!
//! # Example
//!
//! ```rust
//! use abikit::abi::{decode, encode_function_call, function_selector, DecodeOptions, ParamType, Token};
//! use abikit_primitives::{Address, U256};
//!
//! // Encode a transfer call
//! let selector = function_selector("transfer(address,uint256)");
//! let data = encode_function_call(
//!     selector,
//!     &[ParamType::Address, ParamType::Uint(256)],
//!     &[Token::Address(Address::ZERO), Token::Uint(U256::from(1000))],
//! )
//! .unwrap();
//! assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
//!
//! // Decode a balance response
//! let return_data = [0u8; 32];
//! let balance = decode(&[ParamType::Uint(256)], &return_data, &DecodeOptions::default()).unwrap();
//! assert_eq!(balance, vec![Token::Uint(U256::zero())]);
//! ```

mod decode;
mod encode;
mod packed;
mod token;
mod tokenize;
mod types;

pub use decode::{decode, DecodeOptions, DEFAULT_MAX_LENGTH};
pub use encode::{encode, encode_function_call, encode_tokens, function_selector};
pub use packed::encode_packed;
pub use token::{Token, I256};
pub use tokenize::{tokenize, tokenize_all};
pub use types::{Param, ParamType, MAX_STATIC_SIZE};
