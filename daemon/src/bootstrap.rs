//! Daemon bootstrap: wire the connection pool, probes, aggregator and HTTP server
//!
//! Probes are registered in a fixed order: the database probe first, then
//! the configured TCP probes in file order. A TCP probe marked
//! `requiresDatabase` is skipped whenever the database probe reported
//! unhealthy earlier in the same evaluation.

use schema::SentinelConfig;
use sentinel_core::config::validate_config;
use sentinel_core::health::{
    DatabaseHealthIndicator, DatabaseProbe, HealthAggregator, ProbeRegistry, RequiresHealthy,
    TcpProbe,
};
use sentinel_core::ConnectionPool;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{AppState, DaemonError, HealthServer, Result};

/// Build the shared handler state from configuration
///
/// Must be called from within a Tokio runtime.
pub fn build_state(config: &SentinelConfig) -> Result<AppState> {
    let pool = ConnectionPool::open(&config.datasource).map_err(sentinel_core::CoreError::from)?;
    let database = Arc::new(DatabaseProbe::new(pool, &config.datasource));

    let mut registry = ProbeRegistry::new();
    let database_id = registry.register(database.clone());

    for tcp in &config.health.tcp {
        let probe = TcpProbe::new(tcp.name.clone(), tcp.host.clone(), tcp.port, tcp.timeout());
        if tcp.requires_database {
            registry.register(Arc::new(RequiresHealthy::new(probe, database_id)));
        } else {
            registry.register(Arc::new(probe));
        }
    }
    debug!("Registered health probes: {:?}", registry);

    let mut aggregator = HealthAggregator::new(registry);
    if let Some(limit) = config.health.probe_timeout() {
        aggregator = aggregator.with_probe_timeout(limit);
    }

    Ok(AppState {
        aggregator,
        indicator: Arc::new(DatabaseHealthIndicator::new(database.clone())),
        database,
        request_timeout: config.daemon.request_timeout(),
    })
}

/// Handle to manage the running server
#[allow(missing_debug_implementations)]
pub struct BootstrapHandle {
    local_addr: SocketAddr,
    state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_task: Option<JoinHandle<Result<()>>>,
}

impl BootstrapHandle {
    /// Address the server is listening on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Stop accepting requests, let in-flight ones finish, and close the pool
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let result = match self.server_task.take() {
            Some(task) => task
                .await
                .map_err(|e| DaemonError::ServerError(format!("server task failed: {e}")))?,
            None => Ok(()),
        };
        self.state.database.pool().close().await;
        info!("Bootstrap shutdown complete");
        result
    }
}

impl Drop for BootstrapHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            warn!("BootstrapHandle dropped without shutdown; stopping server");
            let _ = tx.send(());
        }
    }
}

/// Validate configuration, build the state, bind the listener and start serving
pub async fn bootstrap(config: &SentinelConfig) -> Result<BootstrapHandle> {
    validate_config(config)?;
    let state = Arc::new(build_state(config)?);

    let addr = format!("{}:{}", config.daemon.host, config.daemon.port);
    let listener = TcpListener::bind(&addr)
        .map_err(|e| DaemonError::ServerError(format!("Failed to bind to {addr}: {e}")))?;
    let local_addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = HealthServer::new(Arc::clone(&state));
    let server_task = tokio::spawn(async move {
        server
            .serve(listener, async move {
                shutdown_rx.await.ok();
            })
            .await
    });

    Ok(BootstrapHandle {
        local_addr,
        state,
        shutdown_tx: Some(shutdown_tx),
        server_task: Some(server_task),
    })
}
