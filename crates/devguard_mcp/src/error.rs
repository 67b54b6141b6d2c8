//! Dispatcher-wide error taxonomy.
//!
//! One variant per leaf in the error handling design: transport errors map to
//! a top-level JSON-RPC error object, everything else rides inside the result
//! envelope as `{content, isError:true}` (`is_transport_level`).

use devguard_protocol::{ErrorCode, JsonRpcError};

#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("server overloaded")]
    Overloaded,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("filesystem error: {0}")]
    FilesystemError(String),

    #[error("timeout")]
    Timeout,

    #[error("internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// `Parse` and `MethodNotFound` are JSON-RPC top-level errors; every other
    /// variant is reported inside a successful envelope with `isError:true`
    /// so the client still sees a 2.0-shaped reply.
    pub fn is_transport_level(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::MethodNotFound(_))
    }
}

impl From<&McpError> for JsonRpcError {
    fn from(err: &McpError) -> Self {
        match err {
            McpError::Parse(msg) => JsonRpcError::new(ErrorCode::ParseError, msg.clone()),
            McpError::MethodNotFound(method) => {
                JsonRpcError::new(ErrorCode::MethodNotFound, format!("Unknown method: {method}"))
            }
            other => JsonRpcError::new(ErrorCode::InternalError, other.to_string()),
        }
    }
}

impl From<devguard_storage::StorageError> for McpError {
    fn from(err: devguard_storage::StorageError) -> Self {
        match err {
            devguard_storage::StorageError::NotFound(what) => McpError::NotFound(what),
            other => McpError::StorageError(other.to_string()),
        }
    }
}

impl From<devguard_context::ContextError> for McpError {
    fn from(err: devguard_context::ContextError) -> Self {
        use devguard_context::ContextError as CE;
        match err {
            CE::Storage(s) => McpError::from(s),
            CE::UnknownDependency(..) | CE::DependencyCycle(..) | CE::SupersessionCycle(..) => {
                McpError::Conflict(err.to_string())
            }
            CE::SessionAlreadyClosed(_) => McpError::Conflict(err.to_string()),
        }
    }
}

impl From<devguard_firewall::error::FirewallError> for McpError {
    fn from(err: devguard_firewall::error::FirewallError) -> Self {
        McpError::StorageError(err.to_string())
    }
}

impl From<anyhow::Error> for McpError {
    fn from(err: anyhow::Error) -> Self {
        McpError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, McpError>;
