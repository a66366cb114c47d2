//! HTTP health endpoints for Sentinel
//!
//! Routes:
//! - `GET /health`: liveness, always 200 while the process answers
//! - `GET /health/db`: database reachability, 200 or 503 with a short message
//! - `GET /health/status`: all registered probes, 200 / 503 / 500
//! - `GET /actuator/health`: JSON report from the database indicator

pub mod bootstrap;
pub mod simple_error;


pub use simple_error::{DaemonError, Result};

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use schema::Status;
use sentinel_core::health::{DatabaseProbe, HealthAggregator, HealthIndicator, Parameters};
use std::convert::Infallible;
use std::future::Future;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Everything the request handlers need
pub struct AppState {
    pub aggregator: HealthAggregator,
    pub database: Arc<DatabaseProbe>,
    pub indicator: Arc<dyn HealthIndicator>,
    /// Caller-side bound on one full evaluation
    pub request_timeout: Option<Duration>,
}

impl AppState {
    /// Run the aggregator, giving up after the request timeout if one is set
    ///
    /// `None` means no status could be produced in time.
    pub async fn evaluate(&self, parameters: &Parameters) -> Option<Status> {
        match self.request_timeout {
            Some(limit) => match timeout(limit, self.aggregator.evaluate(parameters)).await {
                Ok(status) => Some(status),
                Err(_elapsed) => {
                    warn!("Health evaluation did not finish within {:?}", limit);
                    None
                }
            },
            None => Some(self.aggregator.evaluate(parameters).await),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("aggregator", &self.aggregator)
            .field("database", &self.database)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

fn respond(status: StatusCode, body: impl Into<Body>) -> Response<Body> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response
}

fn status_code(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Dispatch one request
pub async fn route(state: Arc<AppState>, req: Request<Body>) -> Response<Body> {
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();
    debug!("{} {}", req.method(), req.uri());

    let known = matches!(
        path.as_str(),
        "/health" | "/health/db" | "/health/status" | "/actuator/health"
    );
    if !known {
        return respond(StatusCode::NOT_FOUND, "Not found");
    }
    if req.method() != Method::GET {
        return respond(StatusCode::METHOD_NOT_ALLOWED, Body::empty());
    }

    match path.as_str() {
        "/health" => respond(StatusCode::OK, Body::empty()),
        "/health/db" => {
            let quick = Parameters::from_query(&query).is_quick();
            if state.database.check(quick).await {
                respond(StatusCode::OK, "Database is healthy")
            } else {
                respond(StatusCode::SERVICE_UNAVAILABLE, "Database is unhealthy")
            }
        }
        "/health/status" => {
            let parameters = Parameters::from_query(&query);
            let status = state.evaluate(&parameters).await;
            info!(
                "Health status: {}",
                status.map_or_else(|| "ABSENT".to_string(), |s| s.to_string())
            );
            respond(status_code(Status::http_status(status)), Body::empty())
        }
        _ => {
            let health = state.indicator.health().await;
            let code = if health.is_up() {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            match serde_json::to_vec(&health) {
                Ok(json) => {
                    let mut response = respond(code, json);
                    response
                        .headers_mut()
                        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                    response
                }
                Err(e) => {
                    error!("Failed to encode health report: {}", e);
                    respond(StatusCode::INTERNAL_SERVER_ERROR, Body::empty())
                }
            }
        }
    }
}

/// HTTP server exposing the health endpoints
#[derive(Debug, Clone)]
pub struct HealthServer {
    state: Arc<AppState>,
}

impl HealthServer {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// # Errors
    /// Returns an error if the listener cannot be handed to the runtime or
    /// the server fails while running.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        let state = self.state;

        let make_svc = make_service_fn(move |_conn| {
            let state = Arc::clone(&state);
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    let state = Arc::clone(&state);
                    async move { Ok::<_, Infallible>(route(state, req).await) }
                }))
            }
        });

        info!("Health endpoints listening on http://{}", addr);
        Server::from_tcp(listener)?
            .serve(make_svc)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("Health server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use schema::{DataSourceConfig, Health};
    use sentinel_core::health::{Probe, ProbeError, ProbeRegistry};
    use sentinel_core::ConnectionPool;

    struct Sleepy;

    #[async_trait]
    impl Probe for Sleepy {
        async fn is_healthy(&self, _parameters: &Parameters) -> std::result::Result<bool, ProbeError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(true)
        }
    }

    struct FixedIndicator(bool);

    #[async_trait]
    impl HealthIndicator for FixedIndicator {
        async fn health(&self) -> Health {
            if self.0 {
                Health::up()
            } else {
                Health::down().with_detail("Database", "Unreachable")
            }
        }
    }

    fn state(registry: ProbeRegistry, indicator_up: bool, request_timeout: Option<Duration>) -> Arc<AppState> {
        let config = DataSourceConfig::default();
        let pool = ConnectionPool::open(&config).unwrap();
        Arc::new(AppState {
            aggregator: HealthAggregator::new(registry),
            database: Arc::new(DatabaseProbe::new(pool, &config)),
            indicator: Arc::new(FixedIndicator(indicator_up)),
            request_timeout,
        })
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_liveness_is_always_ok() {
        let state = state(ProbeRegistry::new(), false, None);
        let response = route(state, get("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_status_with_no_probes_is_ok() {
        let state = state(ProbeRegistry::new(), true, None);
        let response = route(state, get("/health/status?quick=true")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_timeout_maps_to_internal_error() {
        let mut registry = ProbeRegistry::new();
        registry.register(Arc::new(Sleepy));
        let state = state(registry, true, Some(Duration::from_millis(50)));

        let response = route(state, get("/health/status")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_db_endpoint_messages() {
        let state = state(ProbeRegistry::new(), true, None);
        let response = route(state, get("/health/db?quick=true")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "Database is healthy");
    }

    #[tokio::test]
    async fn test_actuator_down_is_service_unavailable() {
        let state = state(ProbeRegistry::new(), false, None);
        let response = route(state, get("/actuator/health")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let health: Health = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(!health.is_up());
        assert_eq!(health.details["Database"], "Unreachable");
    }

    #[tokio::test]
    async fn test_unknown_path_and_method() {
        let state = state(ProbeRegistry::new(), true, None);
        let response = route(Arc::clone(&state), get("/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let post = Request::builder()
            .method(Method::POST)
            .uri("/health/status")
            .body(Body::empty())
            .unwrap();
        let response = route(state, post).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
