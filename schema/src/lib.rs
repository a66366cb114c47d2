//! Schema definitions for Sentinel
//!
//! This crate contains the data structures shared between the health
//! evaluation engine and the daemon that exposes it. All types here
//! implement JSON Schema generation for external consumption.

pub mod config;
pub mod health;

pub use config::{DaemonConfig, DataSourceConfig, HealthConfig, SentinelConfig, TcpCheckConfig};
pub use health::{Health, IndicatorStatus, Status};

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::schema_for;

    #[test]
    fn test_schema_generation() {
        let status_schema = schema_for!(Status);
        let json = serde_json::to_string(&status_schema).unwrap();
        assert!(json.contains("UNHEALTHY"));

        let _health_schema = schema_for!(Health);
        let _config_schema = schema_for!(SentinelConfig);
    }

    #[test]
    fn test_default_configs() {
        let daemon_config = DaemonConfig::default();
        assert_eq!(daemon_config.host, "127.0.0.1");
        assert_eq!(daemon_config.port, 8080);
        assert_eq!(daemon_config.log_level, "info");

        let datasource = DataSourceConfig::default();
        assert_eq!(datasource.url, "sqlite::memory:");
        assert_eq!(datasource.validation_timeout_ms, 1_000);
    }
}
