//! Database connectivity probing

use async_trait::async_trait;
use schema::DataSourceConfig;
use std::time::Duration;
use tracing::{debug, error};

use super::{Parameters, Probe, ProbeError};
use crate::pool::{validate, ConnectionPool};

/// Checks that a pooled database connection can be obtained and answers a
/// trivial query
///
/// Failing to obtain a connection at all (pool exhausted, database cannot be
/// opened) is a fault. A connection that does not validate in time is an
/// ordinary unhealthy result.
#[derive(Debug, Clone)]
pub struct DatabaseProbe {
    pool: ConnectionPool,
    validation_timeout: Duration,
    quick_validation_timeout: Duration,
}

impl DatabaseProbe {
    pub fn new(pool: ConnectionPool, config: &DataSourceConfig) -> Self {
        Self {
            pool,
            validation_timeout: config.validation_timeout(),
            quick_validation_timeout: config.quick_validation_timeout(),
        }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Validation bound for a full or quick check
    pub fn validation_timeout(&self, quick: bool) -> Duration {
        if quick {
            self.quick_validation_timeout
        } else {
            self.validation_timeout
        }
    }

    /// Acquire a connection and validate it
    pub async fn probe(&self, quick: bool) -> Result<bool, ProbeError> {
        let wait = self.validation_timeout(quick);
        let mut conn = self.pool.acquire().await?;
        let valid = validate(&mut conn, wait).await;
        debug!("database connection valid = {} (wait {:?})", valid, wait);
        Ok(valid)
    }

    /// Flatten [`DatabaseProbe::probe`] to a plain yes/no, logging any fault
    pub async fn check(&self, quick: bool) -> bool {
        match self.probe(quick).await {
            Ok(valid) => valid,
            Err(e) => {
                error!("DB health check failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl Probe for DatabaseProbe {
    fn name(&self) -> &str {
        "database"
    }

    async fn is_healthy(&self, parameters: &Parameters) -> Result<bool, ProbeError> {
        self.probe(parameters.is_quick()).await
    }
}
