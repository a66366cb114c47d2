//! Configuration loading and validation for the Sentinel daemon
//!
//! This module parses a TOML document into `schema::SentinelConfig`, applies
//! defaults (via serde defaults on schema types), and performs strict
//! validation with field-path error messages.

use crate::{CoreError, Result};
use crate::pool::connect_options;
use schema::SentinelConfig;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Validate a parsed configuration and return `Result<()>` with field-path errors
pub fn validate_config(cfg: &SentinelConfig) -> Result<()> {
    let daemon = &cfg.daemon;
    if daemon.host.trim().is_empty() {
        return Err(CoreError::ValidationError(
            "daemon.host: cannot be empty".to_string(),
        ));
    }
    if daemon.request_timeout_ms == Some(0) {
        return Err(CoreError::ValidationError(
            "daemon.requestTimeoutMs: must be > 0".to_string(),
        ));
    }

    let ds = &cfg.datasource;
    if connect_options(&ds.url).is_err() {
        return Err(CoreError::ValidationError(format!(
            "datasource.url: unsupported value '{}'",
            ds.url
        )));
    }
    if ds.max_pool_size == 0 {
        return Err(CoreError::ValidationError(
            "datasource.maxPoolSize: must be > 0".to_string(),
        ));
    }
    if ds.connection_timeout_ms == 0 {
        return Err(CoreError::ValidationError(
            "datasource.connectionTimeoutMs: must be > 0".to_string(),
        ));
    }
    if ds.validation_timeout_ms == 0 {
        return Err(CoreError::ValidationError(
            "datasource.validationTimeoutMs: must be > 0".to_string(),
        ));
    }
    if ds.quick_validation_timeout_ms == 0 {
        return Err(CoreError::ValidationError(
            "datasource.quickValidationTimeoutMs: must be > 0".to_string(),
        ));
    }

    if cfg.health.probe_timeout_ms == Some(0) {
        return Err(CoreError::ValidationError(
            "health.probeTimeoutMs: must be > 0".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for (i, tcp) in cfg.health.tcp.iter().enumerate() {
        if tcp.name.trim().is_empty() {
            return Err(CoreError::ValidationError(format!(
                "health.tcp[{}].name: cannot be empty",
                i
            )));
        }
        if !seen.insert(tcp.name.as_str()) {
            return Err(CoreError::ValidationError(format!(
                "health.tcp[{}].name: duplicate name '{}'",
                i, tcp.name
            )));
        }
        if tcp.host.trim().is_empty() {
            return Err(CoreError::ValidationError(format!(
                "health.tcp[{}].host: cannot be empty",
                i
            )));
        }
        if tcp.port == 0 {
            return Err(CoreError::ValidationError(format!(
                "health.tcp[{}].port: must be 1..=65535",
                i
            )));
        }
        if tcp.timeout_ms == 0 {
            return Err(CoreError::ValidationError(format!(
                "health.tcp[{}].timeoutMs: must be > 0",
                i
            )));
        }
    }

    Ok(())
}

/// Load configuration from a TOML file path
pub fn load_config_from_toml_path(path: impl AsRef<Path>) -> Result<SentinelConfig> {
    let data = fs::read_to_string(&path).map_err(|e| {
        CoreError::ConfigurationError(format!("Failed to read config {:?}: {}", path.as_ref(), e))
    })?;
    load_config_from_toml_str(&data)
}

/// Load configuration from a TOML string
pub fn load_config_from_toml_str(input: &str) -> Result<SentinelConfig> {
    let cfg: SentinelConfig = toml::from_str(input)
        .map_err(|e| CoreError::ConfigurationError(format!("TOML parse error: {}", e)))?;
    validate_config(&cfg)?;
    Ok(cfg)
}
