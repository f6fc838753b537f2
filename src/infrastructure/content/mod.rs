//! Content-addressed blob storage

mod ipfs;
mod memory;

use anyhow::Result;

pub use ipfs::{IpfsClusterClient, IpfsClusterConfig};
pub use memory::MemoryContentStore;

/// Content-addressed store used for uploads and metadata documents
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `bytes` and return their content reference
    async fn add(&self, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Drop the blob behind `reference`. Unknown references are not an error.
    async fn remove(&self, reference: &str) -> Result<()>;
}
