//! Server-wide shared state handed to every tool and every transport.
//!
//! The store is `sqlx::SqlitePool`-backed and already async: the pool
//! itself is the single owner of connections and multiplexes concurrent
//! callers without a handler ever holding a lock across a suspension point,
//! so `AppState` holds a cloned `Store` directly rather than wrapping it
//! behind a `Command`/`Event` actor (see `DESIGN.md`). The read-only,
//! built-once-at-startup `Arc<ToolRegistry>` never needs interior
//! mutability.

use std::sync::Arc;

use devguard_storage::Store;

use crate::ai::{AiCapability, NullAi};
use crate::audit::AuditLog;
use crate::config::ServerConfig;
use crate::tools::ToolRegistry;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub tools: Arc<ToolRegistry>,
    pub ai: Arc<dyn AiCapability>,
    pub config: Arc<ServerConfig>,
    pub audit: Option<Arc<AuditLog>>,
}

impl AppState {
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let store = Store::open(&config.db_url).await?;
        let audit = config
            .audit_log_path
            .clone()
            .map(AuditLog::new)
            .transpose()?
            .map(Arc::new);

        Ok(Self {
            store,
            tools: Arc::new(ToolRegistry::new()),
            ai: Arc::new(NullAi),
            config: Arc::new(config),
            audit,
        })
    }

    #[cfg(test)]
    pub async fn in_memory() -> Self {
        let store = Store::open("sqlite::memory:").await.unwrap();
        Self {
            store,
            tools: Arc::new(ToolRegistry::new()),
            ai: Arc::new(NullAi),
            config: Arc::new(ServerConfig::default()),
            audit: None,
        }
    }
}
