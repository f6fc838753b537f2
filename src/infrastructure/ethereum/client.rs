//! Typed Ethereum RPC wrappers

use serde_json::{json, Value};
use tracing::debug;

use crate::domain::abi::AbiDecoder;
use crate::infrastructure::ethereum::rpc::{HttpTransport, JsonRpcClient, RpcError, Transport};
use crate::infrastructure::ethereum::types::{parse_hex_u64, Transaction};

/// Ethereum client exposing the methods the verifier needs
pub struct EthClient<T = HttpTransport> {
    rpc: JsonRpcClient<T>,
}

impl EthClient<HttpTransport> {
    /// Client for an HTTP JSON-RPC endpoint
    pub fn http(url: impl Into<String>) -> Result<Self, RpcError> {
        Ok(Self::new(HttpTransport::new(url)?))
    }
}

impl<T: Transport> EthClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            rpc: JsonRpcClient::new(transport),
        }
    }

    /// Arbitrary method call, for anything without a typed wrapper
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        self.rpc.call(method, params).await
    }

    pub fn transport(&self) -> &T {
        self.rpc.transport()
    }

    pub fn endpoint_name(&self) -> String {
        self.rpc.transport().endpoint_name()
    }

    /// Get the current block number
    pub async fn get_block_number(&self) -> Result<u64, RpcError> {
        let result = self.rpc.call("eth_blockNumber", Vec::new()).await?;
        let hex = result
            .as_str()
            .ok_or_else(|| RpcError::Decode(format!("eth_blockNumber returned {result}")))?;
        parse_hex_u64(hex)
    }

    /// Fetch a transaction by hash.
    ///
    /// With a decoder the input is decoded too; a failed decode only leaves
    /// [`Transaction::input`] unset.
    pub async fn get_transaction(
        &self,
        hash: &str,
        decoder: Option<&dyn AbiDecoder>,
    ) -> Result<Transaction, RpcError> {
        let result = self
            .rpc
            .call("eth_getTransactionByHash", vec![json!(hash)])
            .await?;
        if result.is_null() {
            return Err(RpcError::NotFound(hash.to_string()));
        }

        let mut tx = Transaction::from_json(&result)?;
        if let Some(decoder) = decoder {
            if let Err(err) = tx.decode_input(decoder) {
                debug!(tx_hash = hash, error = %err, "transaction input not decodable");
            }
        }
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::{ContractInterface, Descriptor, Param};
    use crate::infrastructure::abi::InterfaceDecoder;
    use crate::infrastructure::ethereum::rpc::tests::ScriptedTransport;
    use crate::infrastructure::ethereum::types::tests::sample_tx_json;

    const TRANSFER: &str = "0xa9059cbb000000000000000000000000123456789012345678901234567890123456789000000000000000000000000000000000000000000000000000000000000003e8";

    fn transfer_decoder() -> InterfaceDecoder {
        InterfaceDecoder::new(&ContractInterface::new(vec![Descriptor::function(
            "transfer",
            vec![Param::new("to", "address"), Param::new("amount", "uint256")],
        )]))
        .unwrap()
    }

    fn respond(result: Value) -> Result<Value, RpcError> {
        Ok(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
    }

    #[tokio::test]
    async fn test_get_block_number() {
        let client = EthClient::new(ScriptedTransport::with(vec![respond(json!("0x5daf3b"))]));
        assert_eq!(client.get_block_number().await.unwrap(), 6139707);
    }

    #[tokio::test]
    async fn test_get_block_number_rejects_non_string() {
        let client = EthClient::new(ScriptedTransport::with(vec![respond(json!(12))]));
        assert!(matches!(client.get_block_number().await, Err(RpcError::Decode(_))));
    }

    #[tokio::test]
    async fn test_get_transaction_with_decoder() {
        let client = EthClient::new(ScriptedTransport::with(vec![respond(sample_tx_json(TRANSFER))]));
        let decoder = transfer_decoder();

        let tx = client
            .get_transaction("0x88df", Some(&decoder))
            .await
            .unwrap();

        let input = tx.input().unwrap();
        assert_eq!(input.name, "transfer");
        assert_eq!(input.arguments[1].display_value(), "1000");

        let requests = client.rpc.transport().requests.lock().unwrap();
        assert_eq!(requests[0]["method"], json!("eth_getTransactionByHash"));
        assert_eq!(requests[0]["params"], json!(["0x88df"]));
    }

    #[tokio::test]
    async fn test_get_transaction_undecodable_input_is_not_an_error() {
        let client = EthClient::new(ScriptedTransport::with(vec![respond(sample_tx_json("0xdeadbeef"))]));
        let decoder = transfer_decoder();

        let tx = client.get_transaction("0x88df", Some(&decoder)).await.unwrap();
        assert!(tx.input().is_none());
    }

    #[tokio::test]
    async fn test_get_transaction_without_decoder() {
        let client = EthClient::new(ScriptedTransport::with(vec![respond(sample_tx_json(TRANSFER))]));
        let tx = client.get_transaction("0x88df", None).await.unwrap();
        assert!(tx.input().is_none());
        assert_eq!(tx.raw_input.len(), 68);
    }

    #[tokio::test]
    async fn test_get_transaction_not_found() {
        let client = EthClient::new(ScriptedTransport::with(vec![respond(Value::Null)]));
        let err = client.get_transaction("0x01", None).await.unwrap_err();
        assert!(matches!(err, RpcError::NotFound(ref hash) if hash == "0x01"));
        assert!(!err.is_transport());
    }
}
