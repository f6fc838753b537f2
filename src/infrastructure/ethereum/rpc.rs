//! Minimal JSON-RPC 2.0 client over a pluggable transport

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors from a JSON-RPC round trip
#[derive(Debug, Error)]
pub enum RpcError {
    /// The request never got a response (connect, timeout, TLS...)
    #[error("rpc transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success HTTP status
    #[error("rpc endpoint returned HTTP {0}")]
    Status(u16),

    /// The response body or its `result` could not be interpreted
    #[error("malformed rpc response: {0}")]
    Decode(String),

    /// The node does not know the transaction
    #[error("transaction {0} not found")]
    NotFound(String),
}

impl RpcError {
    /// Whether the failure is about reaching the node rather than the data it returned
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport(_) | RpcError::Status(_))
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => RpcError::Status(status.as_u16()),
            None => RpcError::Transport(err.to_string()),
        }
    }
}

/// Carries one request envelope to the node and returns the response body
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn post(&self, body: &Value) -> Result<Value, RpcError>;

    /// Endpoint display name
    fn endpoint_name(&self) -> String;
}

/// HTTP POST transport
pub struct HttpTransport {
    http: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn post(&self, body: &Value) -> Result<Value, RpcError> {
        let response = self.http.post(&self.url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| RpcError::Decode(err.to_string()))
    }

    fn endpoint_name(&self) -> String {
        self.url.clone()
    }
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

/// JSON-RPC client with a per-client request id counter
pub struct JsonRpcClient<T> {
    transport: T,
    last_id: AtomicU64,
}

impl<T: Transport> JsonRpcClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            last_id: AtomicU64::new(0),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Call `method` with positional `params` and return the `result` field
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        let envelope = Envelope {
            jsonrpc: "2.0",
            method,
            params: Value::Array(params),
            id,
        };
        let body = serde_json::to_value(&envelope).map_err(|err| RpcError::Decode(err.to_string()))?;

        debug!(method, id, "rpc call");
        let mut response = self.transport.post(&body).await?;
        let error = response.get("error").map(Value::to_string);

        match response.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(RpcError::Decode(match error {
                Some(error) => format!("no result for {method}: {error}"),
                None => format!("no result for {method}"),
            })),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records every request body
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        pub(crate) requests: Mutex<Vec<Value>>,
        pub(crate) responses: Mutex<VecDeque<Result<Value, RpcError>>>,
    }

    impl ScriptedTransport {
        pub(crate) fn with(responses: Vec<Result<Value, RpcError>>) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait::async_trait]
    impl Transport for ScriptedTransport {
        async fn post(&self, body: &Value) -> Result<Value, RpcError> {
            self.requests.lock().unwrap().push(body.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RpcError::Transport("no scripted response".into())))
        }

        fn endpoint_name(&self) -> String {
            "scripted".into()
        }
    }

    #[tokio::test]
    async fn test_envelope_and_increasing_ids() {
        let client = JsonRpcClient::new(ScriptedTransport::with(vec![
            Ok(json!({"jsonrpc": "2.0", "id": 1, "result": "0x10"})),
            Ok(json!({"jsonrpc": "2.0", "id": 2, "result": "0x11"})),
        ]));

        assert_eq!(client.call("eth_blockNumber", vec![]).await.unwrap(), json!("0x10"));
        assert_eq!(
            client.call("eth_getTransactionByHash", vec![json!("0xab")]).await.unwrap(),
            json!("0x11")
        );

        let requests = client.transport().requests.lock().unwrap();
        assert_eq!(
            requests[0],
            json!({"jsonrpc": "2.0", "method": "eth_blockNumber", "params": [], "id": 1})
        );
        assert_eq!(requests[1]["id"], json!(2));
        assert_eq!(requests[1]["params"], json!(["0xab"]));
    }

    #[tokio::test]
    async fn test_missing_result_is_decode_error() {
        let client = JsonRpcClient::new(ScriptedTransport::with(vec![Ok(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "method not found"}
        }))]));

        let err = client.call("eth_nope", vec![]).await.unwrap_err();
        assert!(matches!(err, RpcError::Decode(ref msg) if msg.contains("method not found")));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_transport_errors_pass_through() {
        let client = JsonRpcClient::new(ScriptedTransport::with(vec![Err(RpcError::Status(502))]));
        let err = client.call("eth_blockNumber", vec![]).await.unwrap_err();
        assert!(err.is_transport());
    }
}
