//! CLI subcommands

pub mod call;
pub mod decode;
pub mod encode;
pub mod selector;

use abikit::abi::{Param, ParamType};
use abikit::human_readable;
use abikit::item::{AbiItem, FunctionDef};

use crate::CliError;

/// What a signature argument describes
pub(crate) enum Target {
    /// `name(types..)`: call data gets a selector
    Function(FunctionDef),
    /// A bare parameter list such as `(uint256,string)` or `address,bool`
    Params(Vec<Param>),
}

impl Target {
    pub(crate) fn parse(signature: &str) -> Result<Self, CliError> {
        match human_readable::parse_signature(signature) {
            Ok(AbiItem::Function(function)) => Ok(Target::Function(function)),
            Ok(item) => Err(CliError::InvalidInput(format!(
                "expected a function signature, found {}",
                item.kind()
            ))),
            // Not a declaration: try it as a plain type list before giving up
            Err(signature_error) => human_readable::parse_params(signature)
                .map(Target::Params)
                .map_err(|_| signature_error.into()),
        }
    }

    pub(crate) fn input_types(&self) -> Vec<ParamType> {
        match self {
            Target::Function(function) => function.input_types(),
            Target::Params(params) => params.iter().map(|p| p.kind.clone()).collect(),
        }
    }
}
