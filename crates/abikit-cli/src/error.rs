//! CLI error types

use abikit::AbiError;
use thiserror::Error;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid hex string
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// ABI error
    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
