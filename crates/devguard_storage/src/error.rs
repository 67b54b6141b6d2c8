//! Storage errors.
//!
//! Kept local and narrow; callers that cross a crate boundary wrap this in
//! `anyhow::Error` via `?`.

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("invalid stored json in column {column}: {source}")]
    CorruptJson {
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, StorageError>;
