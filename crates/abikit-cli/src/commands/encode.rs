//! Value encoding

use abikit::abi::{encode, encode_packed, tokenize_all};
use abikit_primitives::encode_hex;
use clap::Args;

use super::Target;
use crate::{output::Output, CliError};

/// Arguments of `abikit encode`
#[derive(Debug, Args)]
pub struct EncodeArgs {
    /// Function signature ("transfer(address,uint256)") or type list ("(uint256,string)")
    pub signature: String,

    /// Values, one per parameter, e.g. 0xdead... 1000 "[1,2]" "(true,hi)"
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Use the non-standard packed encoding (never prefixed with a selector)
    #[arg(long)]
    pub packed: bool,
}

impl EncodeArgs {
    pub fn execute(self, json: bool) -> Result<(), CliError> {
        let target = Target::parse(&self.signature)?;
        let types = target.input_types();
        let tokens = tokenize_all(&types, &self.args)?;

        let data = if self.packed {
            encode_packed(&types, &tokens)?
        } else {
            match &target {
                Target::Function(function) => function.encode_input(&tokens)?,
                Target::Params(_) => encode(&types, &tokens)?,
            }
        };
        tracing::debug!("Encoded {} values into {} bytes", tokens.len(), data.len());

        let hex = encode_hex(&data);
        Output::new(json)
            .field("data", &hex)
            .message(&hex)
            .print();

        Ok(())
    }
}
