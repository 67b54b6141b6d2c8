//! Connection management: one `open` entry point, URL-driven, async end to
//! end since every caller above this crate already runs on tokio.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

use crate::error::Result;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("migrations");

/// Open (creating if absent) the SQLite store at `db_url` and run pending
/// migrations. `db_url` is a `sqlite:` URL, e.g. `sqlite://./devguard.db` or
/// `sqlite::memory:` for tests.
pub async fn connect(db_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;
    info!(db_url, "storage pool ready");
    Ok(pool)
}
