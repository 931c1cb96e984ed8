//! RPC request types

use std::fmt;
use std::str::FromStr;

use abikit_primitives::{encode_hex, Address, H256, U256};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::AbiError;

/// Block identifier for RPC queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockId {
    /// Block number
    Number(u64),
    /// Latest block
    #[default]
    Latest,
    /// Pending block (includes pending transactions)
    Pending,
    /// Earliest block (genesis)
    Earliest,
    /// Safe block
    Safe,
    /// Finalized block
    Finalized,
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Number(n) => write!(f, "0x{:x}", n),
            BlockId::Latest => f.write_str("latest"),
            BlockId::Pending => f.write_str("pending"),
            BlockId::Earliest => f.write_str("earliest"),
            BlockId::Safe => f.write_str("safe"),
            BlockId::Finalized => f.write_str("finalized"),
        }
    }
}

impl FromStr for BlockId {
    type Err = AbiError;

    /// Accepts the tag names, `0x`-prefixed hex numbers and decimal numbers
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(BlockId::Latest),
            "pending" => Ok(BlockId::Pending),
            "earliest" => Ok(BlockId::Earliest),
            "safe" => Ok(BlockId::Safe),
            "finalized" => Ok(BlockId::Finalized),
            _ => {
                let number = match s.strip_prefix("0x") {
                    Some(hex) => parse_hex_u64(hex),
                    None => s
                        .parse::<u64>()
                        .map_err(|e| AbiError::InvalidHex(format!("block `{s}`: {e}"))),
                };
                number.map(BlockId::Number)
            }
        }
    }
}

impl Serialize for BlockId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Call request for `eth_call` and `eth_sendTransaction`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallRequest {
    /// Sender address
    pub from: Option<Address>,
    /// Recipient address (`None` for contract creation)
    pub to: Option<Address>,
    /// Gas limit
    pub gas: Option<u64>,
    /// Value to transfer
    pub value: Option<U256>,
    /// Input data
    pub data: Option<Bytes>,
}

impl Serialize for CallRequest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let count = [
            self.from.is_some(),
            self.to.is_some(),
            self.gas.is_some(),
            self.value.is_some(),
            self.data.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count();

        let mut map = serializer.serialize_map(Some(count))?;

        if let Some(from) = &self.from {
            map.serialize_entry("from", &from.to_hex())?;
        }
        if let Some(to) = &self.to {
            map.serialize_entry("to", &to.to_hex())?;
        }
        if let Some(gas) = &self.gas {
            map.serialize_entry("gas", &format!("0x{:x}", gas))?;
        }
        if let Some(value) = &self.value {
            // Quantities are minimal hex
            map.serialize_entry("value", &format!("0x{:x}", value))?;
        }
        if let Some(data) = &self.data {
            map.serialize_entry("data", &encode_hex(data))?;
        }

        map.end()
    }
}

/// Pending transaction handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransaction {
    /// Transaction hash
    pub hash: H256,
}

impl PendingTransaction {
    /// Create a new pending transaction
    pub fn new(hash: H256) -> Self {
        Self { hash }
    }

    /// Get the transaction hash
    pub fn hash(&self) -> &H256 {
        &self.hash
    }
}

pub(crate) fn parse_hex_u64(s: &str) -> Result<u64, AbiError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).map_err(|e| AbiError::InvalidHex(e.to_string()))
}
