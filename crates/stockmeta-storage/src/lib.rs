//! stockmeta-storage: SQLite-backed key-value state for the metadata tool.
//!
//! The iStock map and the per-file metadata records are stored as two
//! independent JSON blobs. Loading is lenient: the first balanced object in a
//! blob is used and anything unreadable falls back to an empty default.

pub mod export;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use stockmeta_types::json::parse_lenient;
use stockmeta_types::{FileId, IStockMap, MetadataRecord};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Blocking task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl From<StorageError> for stockmeta_types::MetadataError {
    fn from(err: StorageError) -> Self {
        stockmeta_types::MetadataError::Storage(err.to_string())
    }
}

/// Per-file records keyed by file identity.
pub type RecordMap = BTreeMap<FileId, MetadataRecord>;

const ISTOCK_KEY: &str = "istock_map";
const RECORDS_KEY: &str = "records";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);";

/// SQLite-based key-value store for local state.
pub struct StateStore {
    conn: Arc<Mutex<Connection>>,
}

impl StateStore {
    /// Open (or create) the SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        tracing::info!("State store opened: {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // ─── Raw blobs ───────────────────────────────────

    /// Read a raw blob.
    pub async fn get_blob(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let value = conn
                .query_row(
                    "SELECT value FROM kv_state WHERE key = ?1",
                    rusqlite::params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
        .await?
    }

    /// Insert or replace a raw blob.
    pub async fn put_blob(&self, key: &str, value: String) -> Result<()> {
        let conn = self.conn.clone();
        let key = key.to_string();
        let now = chrono::Utc::now().timestamp_millis();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO kv_state (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                rusqlite::params![key, value, now],
            )?;
            Ok(())
        })
        .await?
    }

    /// Remove a blob. Returns whether it existed.
    pub async fn delete_blob(&self, key: &str) -> Result<bool> {
        let conn = self.conn.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let count = conn.execute(
                "DELETE FROM kv_state WHERE key = ?1",
                rusqlite::params![key],
            )?;
            Ok(count > 0)
        })
        .await?
    }

    async fn load_or_default<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let Some(blob) = self.get_blob(key).await? else {
            return Ok(T::default());
        };
        match parse_lenient::<T>(&blob) {
            Some(value) => Ok(value),
            None => {
                tracing::warn!(key, "Stored state is unreadable, starting empty");
                Ok(T::default())
            }
        }
    }

    async fn save_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let blob = serde_json::to_string(value)?;
        self.put_blob(key, blob).await
    }

    // ─── iStock map ───────────────────────────────────

    pub async fn load_istock_map(&self) -> Result<IStockMap> {
        self.load_or_default(ISTOCK_KEY).await
    }

    pub async fn save_istock_map(&self, map: &IStockMap) -> Result<()> {
        self.save_json(ISTOCK_KEY, map).await
    }

    // ─── Metadata records ───────────────────────────────────

    pub async fn load_records(&self) -> Result<RecordMap> {
        self.load_or_default(RECORDS_KEY).await
    }

    pub async fn save_records(&self, records: &RecordMap) -> Result<()> {
        self.save_json(RECORDS_KEY, records).await
    }

    /// Drop every stored record (whole-session reset).
    pub async fn clear_records(&self) -> Result<()> {
        self.delete_blob(RECORDS_KEY).await?;
        Ok(())
    }
}
