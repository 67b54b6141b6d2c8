//! Remote-IP allow-list: empty list means no-op, a configured list means
//! deny-by-default.

use std::net::IpAddr;

use crate::error::AdmissionError;

#[derive(Debug, Clone, Default)]
pub struct IpAllowlist {
    allowed: Vec<IpAddr>,
}

impl IpAllowlist {
    pub fn new(allowed: Vec<IpAddr>) -> Self {
        Self { allowed }
    }

    pub fn is_configured(&self) -> bool {
        !self.allowed.is_empty()
    }

    pub fn check(&self, remote_ip: IpAddr) -> Result<(), AdmissionError> {
        if !self.is_configured() || self.allowed.contains(&remote_ip) {
            Ok(())
        } else {
            Err(AdmissionError::IpNotAllowed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_allowlist_allows_any_ip() {
        let list = IpAllowlist::default();
        assert!(list.check("10.0.0.5".parse().unwrap()).is_ok());
    }

    #[test]
    fn configured_allowlist_rejects_unknown_ip() {
        let list = IpAllowlist::new(vec!["127.0.0.1".parse().unwrap()]);
        assert!(list.check("127.0.0.1".parse().unwrap()).is_ok());
        assert!(list.check("10.0.0.5".parse().unwrap()).is_err());
    }
}
