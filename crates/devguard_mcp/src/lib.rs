//! Tool registry, dispatcher, and transports for the devguard MCP server.

pub mod ai;
pub mod audit;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod state;
pub mod tools;
pub mod transport;

pub use config::ServerConfig;
pub use dispatch::dispatch;
pub use state::AppState;
