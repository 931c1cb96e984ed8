//! Selector and topic computation

use abikit::human_readable;
use abikit::item::AbiItem;
use clap::Args;

use crate::{output::Output, CliError};

/// Arguments of `abikit selector`
#[derive(Debug, Args)]
pub struct SelectorArgs {
    /// Function, error, or event declaration, e.g. "transfer(address,uint256)"
    pub signature: String,
}

impl SelectorArgs {
    pub fn execute(self, json: bool) -> Result<(), CliError> {
        let item = human_readable::parse_signature(&self.signature)?;
        let (signature, hash) = match &item {
            AbiItem::Function(function) => (function.signature(), function.selector().to_hex()),
            AbiItem::Error(error) => (error.signature(), error.selector().to_hex()),
            AbiItem::Event(event) => (event.signature(), event.topic().to_hex()),
            other => {
                return Err(CliError::InvalidInput(format!(
                    "{} has no selector",
                    other.kind()
                )))
            }
        };

        // Events are identified by the full hash, everything else by 4 bytes
        let label = if matches!(item, AbiItem::Event(_)) { "topic" } else { "selector" };
        Output::new(json)
            .field("kind", &item.kind().to_string())
            .field("signature", &signature)
            .field(label, &hash)
            .message(&hash)
            .print();

        Ok(())
    }
}
