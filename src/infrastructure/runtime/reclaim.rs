//! Remove provisional uploads that were never attached

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, warn};

use super::Task;
use crate::domain::records::{ObjectFilter, StorageObject};
use crate::infrastructure::content::ContentStore;
use crate::store::RecordStore;

/// Deletes expired storage objects together with their blobs
pub struct ReclaimExpiredTask {
    objects: Arc<dyn RecordStore<StorageObject>>,
    content: Arc<dyn ContentStore>,
}

impl ReclaimExpiredTask {
    pub fn new(objects: Arc<dyn RecordStore<StorageObject>>, content: Arc<dyn ContentStore>) -> Self {
        Self { objects, content }
    }
}

#[async_trait::async_trait]
impl Task for ReclaimExpiredTask {
    fn name(&self) -> &'static str {
        "reclaim_expired"
    }

    async fn run(&self) -> Result<()> {
        let now = Utc::now();
        let scheduled: Vec<StorageObject> = self
            .objects
            .get_by_filter(&ObjectFilter::ScheduledForRemoval)
            .await?;
        let total = scheduled.len();
        let mut removed = 0;

        for object in scheduled.iter().filter(|object| object.is_expired(now)) {
            if !self.objects.delete(object).await? {
                debug!(cid = %object.cid, "storage object attached or gone, kept");
                continue;
            }
            if let Err(err) = self.content.remove(&object.cid).await {
                warn!(cid = %object.cid, "row removed but blob left behind: {err:#}");
                continue;
            }
            removed += 1;
            debug!(cid = %object.cid, mime = %object.mime_type, "storage object removed");
        }

        info!("removed {removed} of {total}");
        Ok(())
    }
}
