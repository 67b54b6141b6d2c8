//! Server configuration assembled from environment variables, modeled on
//! `McpServerConfig::default()` (home-dir-relative defaults, `CARGO_PKG_VERSION`).

use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_name: String,
    pub server_version: String,
    pub db_url: String,
    pub api_keys: Vec<String>,
    pub allowed_ips: Vec<IpAddr>,
    pub log_level: String,
    pub max_connections: usize,
    pub rate_limit: u32,
    pub rate_limit_per_seconds: u64,
    pub request_timeout_secs: u64,
    pub audit_log_path: Option<PathBuf>,
    pub max_response_bytes: usize,
    pub http_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let state_dir = home.join(".devguard");

        Self {
            server_name: "devguard-mcp".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            db_url: format!("sqlite://{}/devguard.db", state_dir.display()),
            api_keys: Vec::new(),
            allowed_ips: Vec::new(),
            log_level: "info".to_string(),
            max_connections: 100,
            rate_limit: 100,
            rate_limit_per_seconds: 60,
            request_timeout_secs: 300,
            audit_log_path: Some(state_dir.join("mcp_audit.ndjson")),
            max_response_bytes: 1024 * 1024,
            http_addr: "127.0.0.1:8787".to_string(),
        }
    }
}

impl ServerConfig {
    /// Reads `DB_URL`/`DB_PASSWORD`, `API_KEYS`, `ALLOWED_IPS`, `LOG_LEVEL`,
    /// `MAX_CONNECTIONS`, `RATE_LIMIT`, `REQUEST_TIMEOUT_SEC`, falling back to
    /// `Default::default()` for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("DB_URL") {
            config.db_url = url;
        } else if let Ok(password) = std::env::var("DB_PASSWORD") {
            config.db_url = format!("{}?password={password}", config.db_url);
        }

        if let Ok(keys) = std::env::var("API_KEYS") {
            config.api_keys = keys
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(ips) = std::env::var("ALLOWED_IPS") {
            config.allowed_ips = ips
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| s.parse().ok())
                .collect();
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        if let Ok(n) = std::env::var("MAX_CONNECTIONS") {
            if let Ok(n) = n.parse() {
                config.max_connections = n;
            }
        }

        if let Ok(n) = std::env::var("RATE_LIMIT") {
            if let Ok(n) = n.parse() {
                config.rate_limit = n;
            }
        }

        if let Ok(n) = std::env::var("REQUEST_TIMEOUT_SEC") {
            if let Ok(n) = n.parse() {
                config.request_timeout_secs = n;
            }
        }

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            config.http_addr = addr;
        }

        config
    }
}
