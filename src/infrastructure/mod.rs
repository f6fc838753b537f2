//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - ABI indexing and decoding using alloy-dyn-abi
//! - The Ethereum JSON-RPC client
//! - Content-addressed blob stores
//! - The background task scheduler and its tasks

pub mod abi;
pub mod content;
pub mod ethereum;
pub mod runtime;

pub use abi::{InterfaceDecoder, InterfaceIndexer};
pub use ethereum::{EthClient, RpcError};
pub use runtime::{ReclaimExpiredTask, Scheduler, Task, VerifyContentTask};
