//! JSON-RPC transport seam

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::AbiError;

/// Transport trait for RPC communication (object-safe)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send an RPC request and get the JSON `result`
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, AbiError>;
}

/// Helper to deserialize a response
pub fn deserialize_response<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, AbiError> {
    serde_json::from_value(value).map_err(|e| AbiError::Serialization(e.to_string()))
}

/// A request seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// RPC method
    pub method: String,
    /// RPC params
    pub params: Vec<Value>,
}

/// In-memory transport for tests: canned responses per method, and a log of
/// every request it served
#[derive(Clone)]
pub struct MockTransport {
    responses: Arc<Mutex<HashMap<String, Value>>>,
    default_responses: Arc<Mutex<HashMap<String, Value>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        let mut defaults = HashMap::new();
        defaults.insert("eth_chainId".to_string(), Value::String("0x1".to_string()));
        // Empty return data: what a node answers for a call to an account without code
        defaults.insert("eth_call".to_string(), Value::String("0x".to_string()));
        defaults.insert(
            "eth_sendTransaction".to_string(),
            Value::String(
                "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b".to_string(),
            ),
        );

        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            default_responses: Arc::new(Mutex::new(defaults)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set a mock response for a specific method
    pub fn set_response(&self, method: &str, response: Value) {
        lock(&self.responses).insert(method.to_string(), response);
    }

    /// Clear custom responses
    pub fn clear_responses(&self) {
        lock(&self.responses).clear();
    }

    /// Requests served so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }
}

/// A poisoned lock only means another test thread panicked; the map is still usable
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, AbiError> {
        lock(&self.requests).push(RecordedRequest {
            method: method.to_string(),
            params,
        });

        // Check custom responses first
        if let Some(response) = lock(&self.responses).get(method).cloned() {
            return Ok(response);
        }
        if let Some(response) = lock(&self.default_responses).get(method).cloned() {
            return Ok(response);
        }

        Err(AbiError::Rpc {
            code: -32601,
            message: format!("Method not found: {}", method),
        })
    }
}

/// HTTP transport for real RPC communication
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    request_id: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            request_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    fn next_id(&self) -> u64 {
        self.request_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> Result<Value, AbiError> {
        let id = self.next_id();
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::trace!("RPC request #{} {} to {}", id, method, self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AbiError::Transport(e.to_string()))?;

        let response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| AbiError::Transport(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(AbiError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        response.result.ok_or_else(|| AbiError::Rpc {
            code: -32603,
            message: "No result in response".to_string(),
        })
    }
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}
