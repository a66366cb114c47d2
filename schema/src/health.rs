//! Health status types shared between the evaluation engine and its callers
//!
//! - [`Status`]: the tri-state result of one aggregated evaluation
//! - [`Health`]: the structured, actuator-style report produced by a single
//!   health indicator

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Overall result of one aggregated health evaluation
///
/// Severity increases from `Healthy` to `Failed`; see [`Status::worst`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Every probe that ran reported healthy (or no probe ran at all)
    Healthy,
    /// At least one probe completed and reported unhealthy
    Unhealthy,
    /// At least one probe could not complete its check
    Failed,
}

impl Status {
    const fn severity(self) -> u8 {
        match self {
            Status::Healthy => 0,
            Status::Unhealthy => 1,
            Status::Failed => 2,
        }
    }

    /// Return the more severe of the two statuses
    #[must_use]
    pub fn worst(self, other: Status) -> Status {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    /// Whether this status is [`Status::Healthy`]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Status::Healthy)
    }

    /// HTTP status code for an evaluation result
    ///
    /// An absent status is an aggregation-level anomaly and maps to the same
    /// code as `Failed`.
    pub fn http_status(status: Option<Status>) -> u16 {
        match status {
            Some(Status::Healthy) => 200,
            Some(Status::Unhealthy) => 503,
            Some(Status::Failed) | None => 500,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Healthy => "HEALTHY",
            Status::Unhealthy => "UNHEALTHY",
            Status::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Up/down state reported by a health indicator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndicatorStatus {
    Up,
    Down,
}

/// Structured report for infrastructure tooling: a status plus free-form details
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Health {
    pub status: IndicatorStatus,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

impl Health {
    /// An `UP` report with no details
    #[must_use]
    pub fn up() -> Self {
        Self {
            status: IndicatorStatus::Up,
            details: BTreeMap::new(),
        }
    }

    /// A `DOWN` report with no details
    #[must_use]
    pub fn down() -> Self {
        Self {
            status: IndicatorStatus::Down,
            details: BTreeMap::new(),
        }
    }

    /// Attach a detail entry, replacing any previous value for `key`
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn is_up(&self) -> bool {
        self.status == IndicatorStatus::Up
    }
}
