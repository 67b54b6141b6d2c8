//! `Authorization: Bearer <key>` matching against a configured key set.
//! A no-op when unconfigured.

use crate::error::AdmissionError;

#[derive(Debug, Clone, Default)]
pub struct ApiKeyGuard {
    keys: Vec<String>,
}

impl ApiKeyGuard {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    pub fn is_configured(&self) -> bool {
        !self.keys.is_empty()
    }

    /// `header` is the raw `Authorization` header value, if present.
    pub fn check(&self, header: Option<&str>) -> Result<(), AdmissionError> {
        if !self.is_configured() {
            return Ok(());
        }
        let presented = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .unwrap_or("");
        if self.keys.iter().any(|k| k == presented) {
            Ok(())
        } else {
            Err(AdmissionError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_guard_allows_everything() {
        let guard = ApiKeyGuard::default();
        assert!(guard.check(None).is_ok());
    }

    #[test]
    fn rejects_missing_or_wrong_key() {
        let guard = ApiKeyGuard::new(vec!["secret".to_string()]);
        assert!(guard.check(None).is_err());
        assert!(guard.check(Some("Bearer wrong")).is_err());
        assert!(guard.check(Some("Bearer secret")).is_ok());
    }
}
