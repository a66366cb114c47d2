//! Error types for health check operations

use crate::pool::PoolError;
use std::time::Duration;
use thiserror::Error;

/// A probe could not complete its check
///
/// This is distinct from a probe that completed and reported unhealthy: an
/// error means the check machinery itself broke, and the aggregator reports
/// it as `FAILED`.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The probe did not finish within its allotted time
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// No database connection could be obtained
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),

    /// The probe panicked while running
    #[error("probe panicked: {0}")]
    Panicked(String),

    /// Any other fault raised by a probe implementation
    #[error("check failed: {0}")]
    Check(String),
}

impl From<&str> for ProbeError {
    fn from(s: &str) -> Self {
        ProbeError::Check(s.to_string())
    }
}

impl From<String> for ProbeError {
    fn from(s: String) -> Self {
        ProbeError::Check(s)
    }
}
