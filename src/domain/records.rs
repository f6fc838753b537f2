//! Application records the background tasks reconcile

use chrono::{DateTime, Utc};

/// Verification progress of a content record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    /// No mint transaction submitted yet
    Pending,
    /// A transaction hash is stored but not yet verified
    AwaitingConfirmation,
    /// The mint was verified on chain (terminal)
    Confirmed,
}

/// Uploaded content claiming an on-chain mint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub id: i64,
    /// Chain address of the uploader
    pub owner_address: String,
    /// Metadata reference the mint must carry (e.g. `ipfs://<cid>`)
    pub metadata_ref: Option<String>,
    pub tx_hash: Option<String>,
    pub confirmed: bool,
}

impl ContentRecord {
    pub fn new(id: i64, owner_address: impl Into<String>) -> Self {
        Self {
            id,
            owner_address: owner_address.into(),
            metadata_ref: None,
            tx_hash: None,
            confirmed: false,
        }
    }

    pub fn state(&self) -> VerificationState {
        match (self.confirmed, &self.tx_hash) {
            (true, _) => VerificationState::Confirmed,
            (false, Some(_)) => VerificationState::AwaitingConfirmation,
            (false, None) => VerificationState::Pending,
        }
    }

    /// Mark the record confirmed. Returns `false` if it already was.
    pub fn confirm(&mut self) -> bool {
        if self.confirmed {
            return false;
        }
        self.confirmed = true;
        true
    }
}

/// Filters over content records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentFilter {
    /// Unconfirmed records with a transaction hash
    AwaitingConfirmation,
    ById(i64),
    All,
}

impl ContentFilter {
    pub fn matches(&self, record: &ContentRecord) -> bool {
        match self {
            ContentFilter::AwaitingConfirmation => {
                record.state() == VerificationState::AwaitingConfirmation
            }
            ContentFilter::ById(id) => record.id == *id,
            ContentFilter::All => true,
        }
    }
}

/// An uploaded blob tracked in the content-addressed store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageObject {
    /// Content identifier in the blob store
    pub cid: String,
    pub mime_type: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    /// Set while the upload is provisional; cleared once attached to a record
    pub remove_at: Option<DateTime<Utc>>,
}

impl StorageObject {
    pub fn provisional(
        cid: impl Into<String>,
        mime_type: impl Into<String>,
        owner_id: i64,
        remove_at: DateTime<Utc>,
    ) -> Self {
        Self {
            cid: cid.into(),
            mime_type: mime_type.into(),
            owner_id,
            created_at: Utc::now(),
            remove_at: Some(remove_at),
        }
    }

    /// Keep the object permanently
    pub fn attach(&mut self) {
        self.remove_at = None;
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remove_at.is_some_and(|at| at < now)
    }
}

/// Filters over storage objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectFilter {
    /// Objects with a removal timestamp, expired or not
    ScheduledForRemoval,
    ByCid(String),
    All,
}

impl ObjectFilter {
    pub fn matches(&self, object: &StorageObject) -> bool {
        match self {
            ObjectFilter::ScheduledForRemoval => object.remove_at.is_some(),
            ObjectFilter::ByCid(cid) => object.cid == *cid,
            ObjectFilter::All => true,
        }
    }
}
