//! Health checking and probing functionality
//!
//! This module provides the probe contract, the engine that aggregates probe
//! outcomes into one overall status, and the concrete probes the daemon
//! registers.
//!
//! ## Types
//!
//! - [`Probe`]: The main trait for health check implementations
//! - [`HealthAggregator`]: Runs registered probes and reduces their outcomes
//! - [`ProbeRegistry`] / [`ProbeId`]: Ordered registration and per-probe identity
//! - [`Parameters`]: Per-invocation parameters, including the quick flag
//! - [`DatabaseProbe`]: Pooled database connectivity check
//! - [`TcpProbe`]: TCP connection-based health checking
//! - [`HealthIndicator`]: Single-probe structured report
//! - [`ProbeError`]: Faults raised by probes

pub mod aggregator;
pub mod database;
pub mod error;
pub mod indicator;
pub mod params;
pub mod tcp;
pub mod types;


pub use aggregator::{Evaluation, HealthAggregator, ProbeRegistry};
pub use database::DatabaseProbe;
pub use error::ProbeError;
pub use indicator::{DatabaseHealthIndicator, HealthIndicator};
pub use params::{ParamValue, Parameters, PARAMETER_QUICK};
pub use tcp::TcpProbe;
pub use types::{Outcomes, Probe, ProbeId, RequiresHealthy};

pub use schema::Status;
