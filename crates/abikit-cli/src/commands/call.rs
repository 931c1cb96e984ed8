//! Read-only contract calls

use abikit::abi::tokenize_all;
use abikit::types::BlockId;
use abikit::ContractClient;
use abikit_primitives::Address;
use clap::Args;

use super::Target;
use crate::output::{tokens_message, Output};
use crate::{config::Config, CliError};

/// Arguments of `abikit call`
#[derive(Debug, Args)]
pub struct CallArgs {
    /// Contract address
    #[arg(long)]
    pub to: String,

    /// Block to run against ("latest", a number, or 0x-hex); defaults to the config
    #[arg(long)]
    pub block: Option<BlockId>,

    /// Function signature with outputs, e.g. "balanceOf(address) returns (uint256)"
    pub signature: String,

    /// Values, one per parameter
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl CallArgs {
    pub async fn execute(self, config: &Config, json: bool) -> Result<(), CliError> {
        let to = Address::from_hex(&self.to)
            .map_err(|e| CliError::InvalidInput(format!("--to: {}", e)))?;
        let function = match Target::parse(&self.signature)? {
            Target::Function(function) => function,
            Target::Params(_) => {
                return Err(CliError::InvalidInput(
                    "call needs a function signature such as name(types..)".to_string(),
                ))
            }
        };
        let args = tokenize_all(&function.input_types(), &self.args)?;

        let mut client_config = config.client_config();
        if let Some(block) = self.block {
            client_config.block = block;
        }
        tracing::info!("Calling {} on {} via {}", function.signature(), to, config.rpc_url);
        let client = ContractClient::connect(&config.rpc_url, client_config).await?;
        let tokens = client.call_function(to, &function, &args).await?;

        Output::new(json)
            .field("to", &to.to_checksum())
            .field("function", &function.signature())
            .field_tokens("values", &tokens)
            .message(&tokens_message(&tokens))
            .print();

        Ok(())
    }
}
