//! SQLite connection pool used by the database probe
//!
//! Pooling itself is sqlx's `SqlitePool`. This module maps the datasource
//! configuration onto `SqlitePoolOptions` and sqlx's pool errors onto
//! [`PoolError`], so an acquisition that waits past the connection timeout
//! surfaces as [`PoolError::Exhausted`].

use schema::DataSourceConfig;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::debug;

/// Errors raised while obtaining a connection
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("invalid datasource url '{0}'")]
    InvalidUrl(String),

    #[error("no connection available within {0:?}")]
    Exhausted(Duration),

    #[error("pool is closed")]
    Closed,

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

/// Parse `sqlite::memory:`, `sqlite://<path>`, `sqlite:<path>` or a bare path
///
/// File databases are created on first connect if missing.
pub fn connect_options(url: &str) -> Result<SqliteConnectOptions, PoolError> {
    let url = url.trim();
    let database = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    if database.split('?').next().unwrap_or_default().is_empty() {
        return Err(PoolError::InvalidUrl(url.to_string()));
    }
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|_| PoolError::InvalidUrl(url.to_string()))?;
    Ok(options.create_if_missing(true))
}

/// A cloneable handle to the shared pool
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    pool: SqlitePool,
    acquire_timeout: Duration,
}

impl ConnectionPool {
    /// Build a pool from datasource configuration; no connection is opened yet
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(config: &DataSourceConfig) -> Result<Self, PoolError> {
        let options = connect_options(&config.url)?;
        let acquire_timeout = config.connection_timeout();
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_pool_size)
            .acquire_timeout(acquire_timeout)
            .connect_lazy_with(options);
        Ok(Self {
            pool,
            acquire_timeout,
        })
    }

    pub fn inner(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn max_size(&self) -> u32 {
        self.pool.options().get_max_connections()
    }

    /// Connections currently open, idle or checked out
    pub fn size(&self) -> u32 {
        self.pool.size()
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Take a connection, waiting up to the configured connection timeout
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>, PoolError> {
        self.pool.acquire().await.map_err(|e| match e {
            sqlx::Error::PoolTimedOut => {
                debug!("connection pool exhausted after {:?}", self.acquire_timeout);
                PoolError::Exhausted(self.acquire_timeout)
            }
            sqlx::Error::PoolClosed => PoolError::Closed,
            other => PoolError::Database(other),
        })
    }

    /// Refuse further acquisitions and close every connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Run `SELECT 1` on a checked-out connection, giving up after `wait`
///
/// A connection that fails or does not answer in time is closed when
/// released instead of going back to the pool.
pub async fn validate(conn: &mut PoolConnection<Sqlite>, wait: Duration) -> bool {
    let query = sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&mut **conn);
    let valid = match timeout(wait, query).await {
        Ok(Ok(one)) => one == 1,
        Ok(Err(e)) => {
            debug!("connection validation failed: {}", e);
            false
        }
        Err(_elapsed) => {
            debug!("connection validation timed out after {:?}", wait);
            false
        }
    };
    if !valid {
        conn.close_on_drop();
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str, size: u32, wait_ms: u64) -> DataSourceConfig {
        DataSourceConfig {
            url: url.to_string(),
            max_pool_size: size,
            connection_timeout_ms: wait_ms,
            ..DataSourceConfig::default()
        }
    }

    #[test]
    fn test_connect_options() {
        for url in [
            "sqlite::memory:",
            ":memory:",
            "sqlite:///var/lib/app.db",
            "sqlite:data.db",
            "data.db",
        ] {
            assert!(connect_options(url).is_ok(), "{url} should parse");
        }
        for url in ["sqlite://", "sqlite:", "", "sqlite://?mode=ro"] {
            assert!(
                matches!(connect_options(url), Err(PoolError::InvalidUrl(_))),
                "{url} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_released_connection_can_be_reacquired() {
        let pool = ConnectionPool::open(&config("sqlite::memory:", 1, 500)).unwrap();
        assert_eq!(pool.max_size(), 1);

        let mut conn = pool.acquire().await.expect("acquire");
        assert!(validate(&mut conn, Duration::from_secs(1)).await);
        drop(conn);

        let mut conn = pool.acquire().await.expect("acquire again");
        assert!(validate(&mut conn, Duration::from_secs(1)).await);
        assert_eq!(pool.size(), 1);
    }

    #[tokio::test]
    async fn test_acquire_times_out_when_exhausted() {
        let pool = ConnectionPool::open(&config("sqlite::memory:", 1, 50)).unwrap();
        let _held = pool.acquire().await.expect("first acquire");

        match pool.acquire().await {
            Err(PoolError::Exhausted(d)) => assert_eq!(d, Duration::from_millis(50)),
            other => panic!("Expected PoolError::Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_closed_pool_rejects_acquire() {
        let pool = ConnectionPool::open(&config("sqlite::memory:", 1, 50)).unwrap();
        pool.close().await;
        assert!(pool.is_closed());
        assert!(matches!(pool.acquire().await, Err(PoolError::Closed)));
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sentinel.db");
        let url = format!("sqlite://{}", path.display());
        let pool = ConnectionPool::open(&config(&url, 1, 500)).unwrap();

        let mut conn = pool.acquire().await.expect("acquire");
        assert!(validate(&mut conn, Duration::from_secs(1)).await);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_unopenable_file_is_not_exhaustion() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory that does not exist cannot hold the database file
        let url = format!(
            "sqlite://{}",
            dir.path().join("missing/nested/db.sqlite").display()
        );
        let pool = ConnectionPool::open(&config(&url, 1, 500)).unwrap();

        match pool.acquire().await {
            Err(PoolError::Database(_)) => {}
            other => panic!("Expected PoolError::Database, got {other:?}"),
        }
    }
}
