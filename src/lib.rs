//! Verifies uploaded content against NFT mint transactions
//!
//! - `domain`: contract interface model, decoder contract and records
//! - `infrastructure`: ABI decoding, JSON-RPC client, blob stores and the
//!   background task runtime
//! - `store`: persistence of records
//! - `config`: TOML configuration

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod store;
