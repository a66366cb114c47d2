//! TCP connection health probing

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use super::{Parameters, Probe, ProbeError};

/// TCP health probe that tests connection establishment
///
/// The subsystem counts as healthy when a connection to `host:port` is
/// established within the timeout. A refused or timed-out connection is an
/// ordinary unhealthy result, not a fault.
///
/// # Example
///
/// ```rust
/// use sentinel_core::health::{Parameters, Probe, TcpProbe};
/// use std::time::Duration;
///
/// # async fn example() {
/// let probe = TcpProbe::new("cache", "127.0.0.1", 6379, Duration::from_secs(1));
///
/// // This will be unhealthy unless something is listening on port 6379
/// let healthy = probe.is_healthy(&Parameters::new()).await.unwrap_or(false);
/// println!("cache reachable: {healthy}");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TcpProbe {
    /// Name used in log output
    name: String,
    /// Target host to connect to
    host: String,
    /// Target port to connect to
    port: u16,
    /// Connection timeout
    timeout: Duration,
}

impl TcpProbe {
    /// Create a new TCP probe
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            timeout,
        }
    }

    /// Get the target address as a string
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[async_trait]
impl Probe for TcpProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_healthy(&self, _parameters: &Parameters) -> Result<bool, ProbeError> {
        let address = self.address();
        debug!("TCP probe connecting to {}", address);

        match timeout(self.timeout, TcpStream::connect(&address)).await {
            Ok(Ok(_stream)) => {
                debug!("TCP probe to {} succeeded", address);
                Ok(true)
            }
            Ok(Err(io_error)) => {
                debug!("TCP probe to {} failed: {}", address, io_error);
                Ok(false)
            }
            Err(_timeout_error) => {
                debug!(
                    "TCP probe to {} timed out after {:?}",
                    address, self.timeout
                );
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio::task;

    #[tokio::test]
    async fn test_tcp_probe_success() {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local address");

        let _handle = task::spawn(async move {
            while let Ok((_stream, _addr)) = listener.accept().await {}
        });

        let probe = TcpProbe::new("local", "127.0.0.1", addr.port(), Duration::from_secs(1));
        let result = probe.is_healthy(&Parameters::new()).await;
        assert!(matches!(result, Ok(true)), "TCP probe should succeed: {result:?}");
    }

    #[tokio::test]
    async fn test_tcp_probe_connection_refused_is_unhealthy() {
        // Bind then drop to find a port nothing is listening on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            listener.local_addr().expect("addr").port()
        };

        let probe = TcpProbe::new("closed", "127.0.0.1", port, Duration::from_secs(1));
        let result = probe.is_healthy(&Parameters::new()).await;
        assert!(matches!(result, Ok(false)), "expected unhealthy, got {result:?}");
    }

    #[tokio::test]
    async fn test_tcp_probe_timeout_is_unhealthy() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            listener.local_addr().expect("addr").port()
        };

        // Name resolution runs off-thread, so a zero timeout elapses before
        // the connect can start
        let probe = TcpProbe::new("slow", "localhost", port, Duration::ZERO);
        let result = probe.is_healthy(&Parameters::new()).await;
        assert!(matches!(result, Ok(false)), "expected unhealthy, got {result:?}");
    }

    #[test]
    fn test_tcp_probe_address_and_name() {
        let probe = TcpProbe::new("web", "localhost", 8080, Duration::from_secs(5));
        assert_eq!(probe.address(), "localhost:8080");
        assert_eq!(probe.name(), "web");
    }
}
