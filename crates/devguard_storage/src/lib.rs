//! State store for the devguard server.
//!
//! One `Store` wraps a `sqlx::SqlitePool`; each domain module (`project`,
//! `entities`, `sessions`, `decisions`, `notes`, `todos`, `quality`,
//! `firewall`) adds an `impl Store` block with the queries for its tables.

pub mod decisions;
pub mod entities;
pub mod error;
pub mod firewall;
pub mod notes;
pub mod pool;
pub mod project;
pub mod quality;
pub mod sessions;
pub mod todos;
pub mod types;

pub use error::{Result, StorageError};

use sqlx::SqlitePool;

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Connect and migrate. `db_url` is a `sqlite:` URL.
    pub async fn open(db_url: &str) -> Result<Self> {
        let pool = pool::connect(db_url).await?;
        Ok(Self { pool })
    }

    /// Build a store around an already-connected, already-migrated pool
    /// (used by tests that share one in-memory pool across store modules).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub(crate) fn json_col<T: serde::de::DeserializeOwned>(
    column: &'static str,
    raw: &str,
) -> Result<T> {
    serde_json::from_str(raw).map_err(|source| StorageError::CorruptJson { column, source })
}

pub(crate) fn json_text<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).expect("value is always representable as json")
}
