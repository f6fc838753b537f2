//! Ethereum infrastructure - JSON-RPC client and transaction types

mod client;
pub(crate) mod rpc;
pub(crate) mod types;

pub use client::EthClient;
pub use rpc::{HttpTransport, JsonRpcClient, RpcError, Transport};
pub use types::Transaction;
