//! Admission control & ops for the HTTP/SSE transports: API keys, IP
//! allow-list, per-IP token bucket, connection cap, and request metrics.
//! stdio is trusted and bypasses all of this.

pub mod api_key;
pub mod connections;
pub mod error;
pub mod ip_allowlist;
pub mod metrics;
pub mod rate_limit;

pub use api_key::ApiKeyGuard;
pub use connections::ConnectionGuard;
pub use error::AdmissionError;
pub use ip_allowlist::IpAllowlist;
pub use metrics::{Metrics, MetricsSnapshot};
pub use rate_limit::TokenBucketLimiter;

use std::net::IpAddr;

use tokio::sync::OwnedSemaphorePermit;

/// One admission check per inbound HTTP/SSE request, applied in order:
/// API key, IP allow-list, rate limit, connection cap.
pub struct AdmissionGate {
    pub api_keys: ApiKeyGuard,
    pub ip_allowlist: IpAllowlist,
    pub rate_limiter: TokenBucketLimiter,
    pub connections: ConnectionGuard,
    pub metrics: Metrics,
}

impl AdmissionGate {
    pub fn new(
        api_keys: Vec<String>,
        allowed_ips: Vec<IpAddr>,
        rate: u32,
        per_seconds: u64,
        max_connections: usize,
    ) -> Self {
        Self {
            api_keys: ApiKeyGuard::new(api_keys),
            ip_allowlist: IpAllowlist::new(allowed_ips),
            rate_limiter: TokenBucketLimiter::new(rate, per_seconds),
            connections: ConnectionGuard::new(max_connections),
            metrics: Metrics::new(),
        }
    }

    pub async fn admit(
        &self,
        remote_ip: IpAddr,
        authorization: Option<&str>,
    ) -> Result<OwnedSemaphorePermit, AdmissionError> {
        self.api_keys.check(authorization)?;
        self.ip_allowlist.check(remote_ip)?;
        self.rate_limiter.check(remote_ip).await?;
        self.connections.try_acquire()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admits_a_plain_request_when_unconfigured() {
        let gate = AdmissionGate::new(vec![], vec![], 100, 60, 10);
        let permit = gate.admit("127.0.0.1".parse().unwrap(), None).await;
        assert!(permit.is_ok());
    }

    #[tokio::test]
    async fn rejects_a_request_with_no_matching_api_key() {
        let gate = AdmissionGate::new(vec!["secret".into()], vec![], 100, 60, 10);
        let err = gate
            .admit("127.0.0.1".parse().unwrap(), Some("Bearer wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdmissionError::Unauthorized));
    }
}
