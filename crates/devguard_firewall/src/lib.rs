//! Error firewall: "the same mistake only gets made once". Records error
//! patterns with a canonical-JSON fingerprint, matches future operations
//! against them by fractional key overlap, and blocks/warns accordingly.

pub mod check;
pub mod error;
pub mod fingerprint;
pub mod record;
pub mod stats;

pub use check::{check_operation, CheckResult, MatchedError};
pub use record::{record_error, RecordedError};
pub use stats::{error_firewall_stats, FirewallStats};
