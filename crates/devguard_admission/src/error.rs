use thiserror::Error;

/// `Unauthorized`, `IpNotAllowed`, `RateLimited`, `Overloaded`;
/// `devguard_mcp` maps these onto `McpError` at the transport boundary.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("missing or invalid API key")]
    Unauthorized,
    #[error("remote ip not in allow-list")]
    IpNotAllowed,
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("connection cap reached")]
    Overloaded,
}
