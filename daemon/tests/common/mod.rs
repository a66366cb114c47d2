//! Test utilities for integration tests in the daemon crate.

#![allow(dead_code)]

use hyper::{Body, Client, StatusCode};
use schema::SentinelConfig;
use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

/// Run the given future with a timeout, failing the test if it elapses.
pub async fn run_with_timeout<F, T>(duration: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(duration, fut)
        .await
        .expect("test timed out")
}

/// Run a future with a default timeout of 30 seconds.
pub async fn run_with_default_timeout<F, T>(fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    run_with_timeout(Duration::from_secs(30), fut).await
}

/// Default configuration bound to an ephemeral loopback port
pub fn test_config() -> SentinelConfig {
    let mut config = SentinelConfig::default();
    config.daemon.host = "127.0.0.1".to_string();
    config.daemon.port = 0;
    config
}

/// A loopback port nothing is listening on
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    port
}

/// Issue a GET and return the status code and body text
pub async fn get(addr: SocketAddr, path_and_query: &str) -> (StatusCode, String) {
    let uri = format!("http://{addr}{path_and_query}")
        .parse()
        .expect("valid uri");
    let response = Client::new().get(uri).await.expect("request");
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body())
        .await
        .expect("body");
    (status, String::from_utf8(bytes.to_vec()).expect("utf8"))
}

/// Issue a request with an arbitrary method and return the status code
pub async fn request(addr: SocketAddr, method: hyper::Method, path: &str) -> StatusCode {
    let req = hyper::Request::builder()
        .method(method)
        .uri(format!("http://{addr}{path}"))
        .body(Body::empty())
        .expect("request");
    Client::new().request(req).await.expect("response").status()
}
