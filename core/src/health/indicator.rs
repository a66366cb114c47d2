//! Actuator-style health indicators
//!
//! An indicator wraps a single probe's yes/no answer into a [`Health`]
//! report for infrastructure tooling. It does not go through the aggregator.

use async_trait::async_trait;
use schema::Health;
use std::sync::Arc;

use super::DatabaseProbe;

#[async_trait]
pub trait HealthIndicator: Send + Sync {
    async fn health(&self) -> Health;
}

/// Reports whether the database is reachable
#[derive(Debug, Clone)]
pub struct DatabaseHealthIndicator {
    probe: Arc<DatabaseProbe>,
}

impl DatabaseHealthIndicator {
    pub fn new(probe: Arc<DatabaseProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl HealthIndicator for DatabaseHealthIndicator {
    async fn health(&self) -> Health {
        if self.probe.check(false).await {
            Health::up().with_detail("Database", "Reachable")
        } else {
            Health::down().with_detail("Database", "Unreachable")
        }
    }
}
