//! # abikit
//!
//! Ethereum contract ABI toolkit.
//!
//! ## Features
//!
//! - **ABI codec**: standard head/tail encoding and decoding, packed encoding,
//!   strict or lenient decoding
//! - **Human-readable ABI**: Solidity-like declarations parsed into ABI items
//! - **JSON ABI**: the compiler's JSON schema through `serde`
//! - **Abi registry**: item lookup, mutability checks, call/deploy payloads,
//!   output and revert decoding
//! - **ContractClient**: contract calls over a JSON-RPC transport
//!
//! ## Quick Start
//!
//! ```rust
//! use abikit::{abi::Token, Abi};
//! use abikit_primitives::{Address, U256};
//!
//! let abi = Abi::parse_human_readable(
//!     "function transfer(address to, uint256 amount) returns (bool)",
//! )?;
//! let data = abi.encode_write_call(
//!     "transfer",
//!     &[Token::Address(Address::ZERO), Token::Uint(U256::from(1000))],
//!     U256::zero(),
//! )?;
//! assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
//! # Ok::<(), abikit::AbiError>(())
//! ```
//!
//! ## Contract Interaction
//!
//! ```rust,no_run
//! use abikit::{abi::Token, contract, ClientConfig, ContractClient};
//! use abikit_primitives::Address;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ContractClient::connect("http://localhost:8545", ClientConfig::default()).await?;
//!
//!     let token = Address::from_hex("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")?;
//!     let owner = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d")?;
//!     let balance = client
//!         .read(&contract::erc20(), token, "balanceOf", &[Token::Address(owner)])
//!         .await?;
//!     println!("Balance: {}", balance[0]);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod abi;
mod client;
pub mod contract;
mod error;
pub mod human_readable;
pub mod item;
mod transport;
pub mod types;

// Re-export main types
pub use client::{ClientConfig, ContractClient};
pub use contract::Abi;
pub use error::AbiError;
pub use item::{AbiItem, AbiItemKind, StateMutability};
pub use transport::{MockTransport, RecordedRequest};

/// Re-export Transport trait for custom implementations
pub use transport::{deserialize_response, Transport};

#[cfg(feature = "http")]
pub use transport::HttpTransport;

// Re-export primitives for convenience
pub use abikit_primitives::{Address, Selector, H256, U256};
