use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Row};

use super::RecordStore;
use crate::domain::records::{ContentFilter, ContentRecord, ObjectFilter, StorageObject};

/// SQLite-backed record store
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("open db {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory().context("open in-memory db")?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.with_conn(init)?;
        Ok(store)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("store connection lock poisoned"))?;
        f(&conn)
    }
}

fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS content_records (
            id            INTEGER PRIMARY KEY,
            owner_address TEXT NOT NULL,
            metadata_ref  TEXT,
            tx_hash       TEXT,
            confirmed     INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS storage_objects (
            cid        TEXT PRIMARY KEY,
            mime_type  TEXT NOT NULL,
            owner_id   INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            remove_at  INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_content_pending ON content_records(confirmed, tx_hash);
        CREATE INDEX IF NOT EXISTS idx_objects_remove_at ON storage_objects(remove_at);",
    )?;
    Ok(())
}

// === Content records ===

fn content_from_row(row: &Row<'_>) -> rusqlite::Result<ContentRecord> {
    Ok(ContentRecord {
        id: row.get(0)?,
        owner_address: row.get(1)?,
        metadata_ref: row.get(2)?,
        tx_hash: row.get(3)?,
        confirmed: row.get(4)?,
    })
}

#[async_trait::async_trait]
impl RecordStore<ContentRecord> for SqliteStore {
    async fn get_by_filter(&self, filter: &ContentFilter) -> Result<Vec<ContentRecord>> {
        let (clause, args): (&str, Vec<SqlValue>) = match filter {
            ContentFilter::AwaitingConfirmation => {
                ("WHERE confirmed = 0 AND tx_hash IS NOT NULL", Vec::new())
            }
            ContentFilter::ById(id) => ("WHERE id = ?1", vec![SqlValue::Integer(*id)]),
            ContentFilter::All => ("", Vec::new()),
        };

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, owner_address, metadata_ref, tx_hash, confirmed
                 FROM content_records {clause} ORDER BY id"
            ))?;
            let records = stmt
                .query_map(params_from_iter(args), content_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
    }

    async fn save(&self, record: &ContentRecord) -> Result<()> {
        self.with_conn(|conn| {
            // A stored confirmation is never cleared
            conn.execute(
                "INSERT INTO content_records(id, owner_address, metadata_ref, tx_hash, confirmed)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    owner_address=excluded.owner_address,
                    metadata_ref=excluded.metadata_ref,
                    tx_hash=excluded.tx_hash,
                    confirmed=MAX(content_records.confirmed, excluded.confirmed)",
                params![
                    record.id,
                    record.owner_address,
                    record.metadata_ref,
                    record.tx_hash,
                    record.confirmed
                ],
            )
            .with_context(|| format!("save content record {}", record.id))?;
            Ok(())
        })
    }

    async fn delete(&self, record: &ContentRecord) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM content_records WHERE id = ?1", params![record.id])?;
            Ok(removed > 0)
        })
    }
}

// === Storage objects ===

fn timestamp(idx: usize, secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs))
}

fn object_from_row(row: &Row<'_>) -> rusqlite::Result<StorageObject> {
    let remove_at: Option<i64> = row.get(4)?;
    Ok(StorageObject {
        cid: row.get(0)?,
        mime_type: row.get(1)?,
        owner_id: row.get(2)?,
        created_at: timestamp(3, row.get(3)?)?,
        remove_at: remove_at.map(|secs| timestamp(4, secs)).transpose()?,
    })
}

#[async_trait::async_trait]
impl RecordStore<StorageObject> for SqliteStore {
    async fn get_by_filter(&self, filter: &ObjectFilter) -> Result<Vec<StorageObject>> {
        let (clause, args): (&str, Vec<SqlValue>) = match filter {
            ObjectFilter::ScheduledForRemoval => ("WHERE remove_at IS NOT NULL", Vec::new()),
            ObjectFilter::ByCid(cid) => ("WHERE cid = ?1", vec![SqlValue::Text(cid.clone())]),
            ObjectFilter::All => ("", Vec::new()),
        };

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT cid, mime_type, owner_id, created_at, remove_at
                 FROM storage_objects {clause} ORDER BY created_at, cid"
            ))?;
            let objects = stmt
                .query_map(params_from_iter(args), object_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(objects)
        })
    }

    async fn save(&self, object: &StorageObject) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO storage_objects(cid, mime_type, owner_id, created_at, remove_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(cid) DO UPDATE SET
                    mime_type=excluded.mime_type,
                    owner_id=excluded.owner_id,
                    remove_at=excluded.remove_at",
                params![
                    object.cid,
                    object.mime_type,
                    object.owner_id,
                    object.created_at.timestamp(),
                    object.remove_at.map(|at| at.timestamp())
                ],
            )
            .with_context(|| format!("save storage object {}", object.cid))?;
            Ok(())
        })
    }

    async fn delete(&self, object: &StorageObject) -> Result<bool> {
        self.with_conn(|conn| {
            // An object attached or rescheduled since it was read is kept
            let removed = conn.execute(
                "DELETE FROM storage_objects WHERE cid = ?1 AND remove_at IS ?2",
                params![object.cid, object.remove_at.map(|at| at.timestamp())],
            )?;
            Ok(removed > 0)
        })
    }
}
