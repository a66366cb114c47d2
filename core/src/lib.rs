//! Core functionality for Sentinel
//!
//! This crate contains the health evaluation engine, the probes it runs,
//! the connection pool the database probe draws from, and configuration
//! loading shared by the daemon.

pub mod config;
pub mod error;
pub mod health;
pub mod pool;


// Re-export schema types for convenience
pub use schema::*;

pub use error::{CoreError, Result};
pub use pool::{ConnectionPool, PoolError};

/// Core utilities and helper functions
pub mod utils {
    use tracing::info;

    /// Initialize tracing for the application
    ///
    /// `RUST_LOG` takes precedence over `level` when set.
    pub fn init_tracing(level: &str) -> crate::Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| crate::CoreError::InitializationError(e.to_string()))?;

        info!("Tracing initialized with level: {}", level);
        Ok(())
    }
}
