//! Value decoding

use abikit::abi::{decode, DecodeOptions};
use abikit::human_readable;
use abikit_primitives::decode_hex;
use clap::Args;

use crate::output::{tokens_message, Output};
use crate::{config::Config, CliError};

/// Arguments of `abikit decode`
#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Type list, e.g. "(uint256,string)" or "address,bool"
    pub types: String,

    /// ABI-encoded data as hex
    pub data: String,

    /// Accept trailing bytes after the last value
    #[arg(long)]
    pub allow_junk_data: bool,
}

impl DecodeArgs {
    pub fn execute(self, config: &Config, json: bool) -> Result<(), CliError> {
        let params = human_readable::parse_params(&self.types)?;
        let types: Vec<_> = params.into_iter().map(|p| p.kind).collect();
        let data = decode_hex(&self.data).map_err(|e| CliError::InvalidHex(e.to_string()))?;

        let options = DecodeOptions {
            allow_junk_data: self.allow_junk_data || config.decode.allow_junk_data,
            ..config.decode
        };
        let tokens = decode(&types, &data, &options)?;

        Output::new(json)
            .field_tokens("values", &tokens)
            .message(&tokens_message(&tokens))
            .print();

        Ok(())
    }
}
