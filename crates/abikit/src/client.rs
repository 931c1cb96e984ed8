//! ContractClient - contract calls over a JSON-RPC transport

use abikit_primitives::{decode_hex, Address, H256, U256};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::abi::{DecodeOptions, Token};
use crate::contract::Abi;
use crate::item::FunctionDef;
use crate::transport::{deserialize_response, MockTransport, Transport};
use crate::types::{parse_hex_u64, BlockId, CallRequest, PendingTransaction};
use crate::AbiError;

#[cfg(feature = "http")]
use crate::transport::HttpTransport;

/// Client-side defaults applied to every request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Sender for calls and transactions; the node picks one when unset
    pub from: Option<Address>,
    /// Gas limit attached to transactions; estimated by the node when unset
    pub gas: Option<u64>,
    /// Block that `eth_call` runs against
    pub block: BlockId,
    /// Decoder switches for return data
    pub decode: DecodeOptions,
}

/// RPC client that encodes contract calls and decodes their results
pub struct ContractClient {
    transport: Box<dyn Transport>,
    config: ClientConfig,
    chain_id: Option<u64>,
}

impl ContractClient {
    /// Create a new client with HTTP transport
    #[cfg(feature = "http")]
    pub async fn connect(url: &str, config: ClientConfig) -> Result<Self, AbiError> {
        let mut client = Self {
            transport: Box::new(HttpTransport::new(url)),
            config,
            chain_id: None,
        };

        // Fetch and cache chain ID
        let chain_id = client.fetch_chain_id().await?;
        tracing::debug!("Connected to {} (chain {})", url, chain_id);
        client.chain_id = Some(chain_id);

        Ok(client)
    }

    /// Create a new client with mock transport (for testing)
    pub fn new_mock() -> Self {
        Self {
            transport: Box::new(MockTransport::new()),
            config: ClientConfig::default(),
            chain_id: Some(1),
        }
    }

    /// Create a client with a custom transport
    pub fn with_transport(transport: impl Transport + 'static, config: ClientConfig) -> Self {
        Self {
            transport: Box::new(transport),
            config,
            chain_id: None,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Helper method to make RPC request and deserialize
    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, AbiError> {
        let value = self.transport.request_json(method, params).await?;
        deserialize_response(value)
    }

    /// Get the chain ID
    pub async fn chain_id(&self) -> Result<u64, AbiError> {
        if let Some(id) = self.chain_id {
            return Ok(id);
        }
        self.fetch_chain_id().await
    }

    async fn fetch_chain_id(&self) -> Result<u64, AbiError> {
        let result: String = self.request("eth_chainId", vec![]).await?;
        parse_hex_u64(&result)
    }

    // ==================== Raw RPC ====================

    /// Execute a call (read-only, does not create transaction)
    pub async fn call(&self, request: &CallRequest, block: BlockId) -> Result<Bytes, AbiError> {
        let result: String = self
            .request(
                "eth_call",
                vec![serde_json::to_value(request)?, serde_json::to_value(block)?],
            )
            .await?;
        parse_hex_bytes(&result)
    }

    /// Submit a transaction for the node to sign with an unlocked account
    pub async fn send_transaction(
        &self,
        request: &CallRequest,
    ) -> Result<PendingTransaction, AbiError> {
        let result: String = self
            .request("eth_sendTransaction", vec![serde_json::to_value(request)?])
            .await?;
        let hash = H256::from_hex(&result)?;
        Ok(PendingTransaction::new(hash))
    }

    // ==================== Contract calls ====================

    /// Call `function` on `to` and decode its outputs.
    ///
    /// No mutability check is applied; see [`ContractClient::read`].
    pub async fn call_function(
        &self,
        to: Address,
        function: &FunctionDef,
        args: &[Token],
    ) -> Result<Vec<Token>, AbiError> {
        let data = Bytes::from(function.encode_input(args)?);
        self.call_encoded(to, function, data).await
    }

    /// Call a `view`/`pure` function of `abi` deployed at `to`
    pub async fn read(
        &self,
        abi: &Abi,
        to: Address,
        name: &str,
        args: &[Token],
    ) -> Result<Vec<Token>, AbiError> {
        let data = abi.encode_read_call(name, args)?;
        self.call_encoded(to, abi.function(name)?, data).await
    }

    async fn call_encoded(
        &self,
        to: Address,
        function: &FunctionDef,
        data: Bytes,
    ) -> Result<Vec<Token>, AbiError> {
        let request = CallRequest {
            from: self.config.from,
            to: Some(to),
            data: Some(data),
            ..Default::default()
        };
        let output = self.call(&request, self.config.block).await?;
        // A call to an account without code, or one that ran out of gas, returns nothing
        if output.is_empty() && !function.outputs.is_empty() {
            return Err(AbiError::EvmFailedToExecute);
        }
        tracing::debug!("{} returned {} bytes", function.name, output.len());
        function.decode_output(&output, &self.config.decode)
    }

    /// Send a transaction to a `payable`/`nonpayable` function of `abi`
    pub async fn write(
        &self,
        abi: &Abi,
        to: Address,
        name: &str,
        args: &[Token],
        value: U256,
    ) -> Result<PendingTransaction, AbiError> {
        let data = abi.encode_write_call(name, args, value)?;
        self.send_transaction(&self.transaction(Some(to), data, value))
            .await
    }

    /// Deploy `bytecode` with constructor `args`
    pub async fn deploy(
        &self,
        abi: &Abi,
        bytecode: &[u8],
        args: &[Token],
        value: U256,
    ) -> Result<PendingTransaction, AbiError> {
        let data = abi.encode_deploy(bytecode, args, value)?;
        self.send_transaction(&self.transaction(None, data, value))
            .await
    }

    fn transaction(&self, to: Option<Address>, data: Bytes, value: U256) -> CallRequest {
        CallRequest {
            from: self.config.from,
            to,
            gas: self.config.gas,
            value: (!value.is_zero()).then_some(value),
            data: Some(data),
        }
    }
}

fn parse_hex_bytes(s: &str) -> Result<Bytes, AbiError> {
    Ok(Bytes::from(decode_hex(s)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{encode, ParamType};
    use crate::contract::erc20;
    use abikit_primitives::encode_hex;

    fn client_with(transport: &MockTransport) -> ContractClient {
        ContractClient::with_transport(transport.clone(), ClientConfig::default())
    }

    #[tokio::test]
    async fn test_client_mock_chain_id() {
        let client = ContractClient::new_mock();
        assert_eq!(client.chain_id().await.unwrap(), 1);

        let client = client_with(&MockTransport::new());
        assert_eq!(client.chain_id().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_read_decodes_output() {
        let transport = MockTransport::new();
        let balance = encode(&[ParamType::Uint(256)], &[Token::Uint(U256::from(1000))]).unwrap();
        transport.set_response("eth_call", Value::String(encode_hex(&balance)));

        let client = client_with(&transport);
        let token = Address::from_bytes([0x11; 20]);
        let result = client
            .read(&erc20(), token, "balanceOf", &[Token::Address(Address::ZERO)])
            .await
            .unwrap();
        assert_eq!(result, vec![Token::Uint(U256::from(1000))]);

        let requests = transport.requests();
        assert_eq!(requests[0].method, "eth_call");
        assert_eq!(requests[0].params[0]["to"], token.to_hex());
        assert!(requests[0].params[0]["data"]
            .as_str()
            .unwrap()
            .starts_with("0x70a08231"));
        assert_eq!(requests[0].params[1], "latest");
    }

    #[tokio::test]
    async fn test_read_empty_result_fails() {
        let client = ContractClient::new_mock();
        let result = client
            .read(&erc20(), Address::ZERO, "totalSupply", &[])
            .await;
        assert_eq!(result, Err(AbiError::EvmFailedToExecute));
    }

    #[tokio::test]
    async fn test_read_rejects_write_function() {
        let client = ContractClient::new_mock();
        let result = client
            .read(
                &erc20(),
                Address::ZERO,
                "transfer",
                &[Token::Address(Address::ZERO), Token::Uint(U256::one())],
            )
            .await;
        assert!(matches!(
            result,
            Err(AbiError::InvalidFunctionMutability { operation: "read", .. })
        ));
    }

    #[tokio::test]
    async fn test_write_sends_transaction() {
        let transport = MockTransport::new();
        let sender = Address::from_bytes([0x22; 20]);
        let client = ContractClient::with_transport(
            transport.clone(),
            ClientConfig {
                from: Some(sender),
                gas: Some(60_000),
                ..Default::default()
            },
        );

        let pending = client
            .write(
                &erc20(),
                Address::ZERO,
                "transfer",
                &[Token::Address(sender), Token::Uint(U256::from(5))],
                U256::zero(),
            )
            .await
            .unwrap();
        assert_eq!(
            pending.hash().to_hex(),
            "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b"
        );

        let request = &transport.requests()[0];
        assert_eq!(request.method, "eth_sendTransaction");
        assert_eq!(request.params[0]["from"], sender.to_hex());
        assert_eq!(request.params[0]["gas"], "0xea60");
        assert!(request.params[0].get("value").is_none());
    }

    #[tokio::test]
    async fn test_deploy_without_to() {
        let transport = MockTransport::new();
        let client = client_with(&transport);
        let abi = Abi::parse_human_readable("constructor(uint8 decimals) payable").unwrap();

        client
            .deploy(&abi, &[0x60, 0x80], &[Token::Uint(U256::from(18))], U256::from(7))
            .await
            .unwrap();

        let request = &transport.requests()[0];
        assert!(request.params[0].get("to").is_none());
        assert_eq!(request.params[0]["value"], "0x7");
        assert_eq!(
            request.params[0]["data"],
            format!("0x6080{:064x}", 18)
        );
    }

    #[test]
    fn test_client_config_defaults() {
        let config: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());

        let config: ClientConfig =
            serde_json::from_str(r#"{"block":"0x10","decode":{"allow_junk_data":true}}"#).unwrap();
        assert_eq!(config.block, BlockId::Number(16));
        assert!(config.decode.allow_junk_data);
    }

    #[test]
    fn test_parse_hex_bytes() {
        let result = parse_hex_bytes("0x1234").unwrap();
        assert_eq!(result.as_ref(), &[0x12, 0x34]);
        assert!(parse_hex_bytes("0x").unwrap().is_empty());
    }
}
