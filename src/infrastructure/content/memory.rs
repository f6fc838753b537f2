//! In-process content store

use std::collections::HashMap;
use std::sync::Mutex;

use alloy_primitives::keccak256;
use anyhow::{anyhow, Result};

use super::ContentStore;

/// Keeps blobs in memory, keyed by the hex keccak of their bytes
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    blobs: Mutex<HashMap<String, (String, Vec<u8>)>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.blobs
            .lock()
            .map(|blobs| blobs.contains_key(reference))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().map(|blobs| blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ContentStore for MemoryContentStore {
    async fn add(&self, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let reference = hex::encode(keccak256(&bytes));
        self.blobs
            .lock()
            .map_err(|_| anyhow!("content store lock poisoned"))?
            .insert(reference.clone(), (content_type.to_string(), bytes));
        Ok(reference)
    }

    async fn remove(&self, reference: &str) -> Result<()> {
        self.blobs
            .lock()
            .map_err(|_| anyhow!("content store lock poisoned"))?
            .remove(reference);
        Ok(())
    }
}
