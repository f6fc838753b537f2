//! Persistence contract for the records the background tasks touch

mod sqlite;

use anyhow::Result;

use crate::domain::records::{ContentFilter, ContentRecord, ObjectFilter, StorageObject};

pub use sqlite::SqliteStore;

/// A persisted record type and the filter used to query it
pub trait Record: Send + Sync + Sized + 'static {
    type Filter: Send + Sync;
}

impl Record for ContentRecord {
    type Filter = ContentFilter;
}

impl Record for StorageObject {
    type Filter = ObjectFilter;
}

/// Filtered get/save/delete over one typed table
#[async_trait::async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    async fn get_by_filter(&self, filter: &R::Filter) -> Result<Vec<R>>;

    /// Insert or update
    async fn save(&self, record: &R) -> Result<()>;

    /// Delete the stored row if it still matches `record` where it matters.
    ///
    /// Returns whether a row was removed. A storage object is only removed
    /// while it is still scheduled for removal at `record.remove_at`.
    async fn delete(&self, record: &R) -> Result<bool>;
}
