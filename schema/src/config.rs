//! Configuration types for the Sentinel daemon
//!
//! A configuration file has three sections, each of which may be omitted in
//! favour of its defaults:
//!
//! ```toml
//! [daemon]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [datasource]
//! url = "sqlite:///var/lib/app/app.db"
//! maxPoolSize = 4
//!
//! [health]
//! probeTimeoutMs = 5000
//!
//! [[health.tcp]]
//! name = "cache"
//! host = "127.0.0.1"
//! port = 6379
//! requiresDatabase = true
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SentinelConfig {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub datasource: DataSourceConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

/// HTTP listener configuration for the daemon
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DaemonConfig {
    /// Host to bind the daemon to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind the daemon to
    #[serde(default = "default_port")]
    pub port: u16,
    /// Log level for the daemon
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Upper bound on one `/health/status` evaluation; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

impl DaemonConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            request_timeout_ms: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Pooled database connection settings
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceConfig {
    /// `sqlite::memory:`, `sqlite://<path>` or a bare file path
    #[serde(default = "default_url")]
    pub url: String,
    /// Maximum number of connections handed out at once
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
    /// How long `acquire` waits for a free connection
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
    /// How long a connection validation may take
    #[serde(default = "default_validation_timeout_ms")]
    pub validation_timeout_ms: u64,
    /// Validation bound used when a quick check is requested
    #[serde(default = "default_quick_validation_timeout_ms")]
    pub quick_validation_timeout_ms: u64,
}

impl DataSourceConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn validation_timeout(&self) -> Duration {
        Duration::from_millis(self.validation_timeout_ms)
    }

    pub fn quick_validation_timeout(&self) -> Duration {
        Duration::from_millis(self.quick_validation_timeout_ms)
    }
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_pool_size: default_max_pool_size(),
            connection_timeout_ms: default_connection_timeout_ms(),
            validation_timeout_ms: default_validation_timeout_ms(),
            quick_validation_timeout_ms: default_quick_validation_timeout_ms(),
        }
    }
}

fn default_url() -> String {
    "sqlite::memory:".to_string()
}

const fn default_max_pool_size() -> u32 {
    4
}

const fn default_connection_timeout_ms() -> u64 {
    1_000
}

const fn default_validation_timeout_ms() -> u64 {
    1_000
}

const fn default_quick_validation_timeout_ms() -> u64 {
    250
}

/// Aggregator settings and additional probes
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthConfig {
    /// Per-probe bound; a probe exceeding it counts as failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_timeout_ms: Option<u64>,
    /// TCP connectivity probes, evaluated after the database probe in this order
    #[serde(default)]
    pub tcp: Vec<TcpCheckConfig>,
}

impl HealthConfig {
    pub fn probe_timeout(&self) -> Option<Duration> {
        self.probe_timeout_ms.map(Duration::from_millis)
    }
}

/// A TCP connectivity probe
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TcpCheckConfig {
    /// Name used in log output
    pub name: String,
    pub host: String,
    pub port: u16,
    /// Connection establishment timeout
    #[serde(default = "default_tcp_timeout_ms")]
    pub timeout_ms: u64,
    /// Skip this probe when the database probe has already reported unhealthy
    #[serde(default)]
    pub requires_database: bool,
}

impl TcpCheckConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

const fn default_tcp_timeout_ms() -> u64 {
    1_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let cfg: SentinelConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, SentinelConfig::default());
        assert_eq!(cfg.daemon.port, 8080);
        assert_eq!(cfg.datasource.validation_timeout(), Duration::from_secs(1));
        assert_eq!(cfg.datasource.max_pool_size, 4);
        assert!(cfg.health.probe_timeout().is_none());
        assert!(cfg.health.tcp.is_empty());
    }

    #[test]
    fn test_camel_case_keys() {
        let input = r#"
        [daemon]
        logLevel = "debug"
        requestTimeoutMs = 2500

        [datasource]
        url = "sqlite:///tmp/app.db"
        maxPoolSize = 2
        quickValidationTimeoutMs = 100

        [[health.tcp]]
        name = "cache"
        host = "127.0.0.1"
        port = 6379
        requiresDatabase = true
        "#;
        let cfg: SentinelConfig = toml::from_str(input).unwrap();
        assert_eq!(cfg.daemon.log_level, "debug");
        assert_eq!(cfg.daemon.request_timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(cfg.datasource.max_pool_size, 2);
        assert_eq!(cfg.datasource.quick_validation_timeout(), Duration::from_millis(100));
        assert_eq!(cfg.datasource.connection_timeout(), Duration::from_secs(1));

        let tcp = &cfg.health.tcp[0];
        assert_eq!(tcp.name, "cache");
        assert!(tcp.requires_database);
        assert_eq!(tcp.timeout(), Duration::from_secs(1));
    }
}
