//! Prediction API server implementation.

use super::handlers::{describe, health, metrics, predict};
use crate::compute::PredictionService;
use crate::config::ServiceConfig;
use crate::error::{PricingError, Result};
use crate::health::HealthChecker;
use crate::observability;
use crate::shutdown::ShutdownCoordinator;
use axum::{
    extract::{DefaultBodyLimit, MatchedPath, Request},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::IntoFuture;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, info_span, warn, Instrument};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub service: PredictionService,
    pub health: HealthChecker,
    pub metrics: Option<PrometheusHandle>,
    pub request_timeout: Duration,
}

impl ApiState {
    pub fn new(config: &ServiceConfig, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            service: PredictionService::new(config.model.artifact_path.clone()),
            health: HealthChecker::new(env!("CARGO_PKG_VERSION")),
            metrics,
            request_timeout: config.server.request_timeout,
        }
    }
}

/// Metric label for a request: the route pattern it matched, never the raw path.
fn route_label(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

/// Tags every request with an id and records it.
async fn track_requests(req: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let route = route_label(&req);
    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
        route = %route
    );

    let mut response = next.run(req).instrument(span).await;
    observability::record_request(&route, response.status().as_u16());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Build the API router.
pub fn router(state: ApiState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(describe))
        .route("/predict", post(predict))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn(track_requests))
        .with_state(state)
}

/// Run the prediction API until shutdown.
pub async fn run_server(
    config: ServiceConfig,
    metrics: Option<PrometheusHandle>,
    coordinator: ShutdownCoordinator,
) -> Result<()> {
    let state = ApiState::new(&config, metrics);

    match state.service.check_artifact().await {
        Ok(artifact) => info!(
            path = %config.model.artifact_path.display(),
            features = artifact.n_features(),
            "Model artifact available"
        ),
        Err(e) => warn!(error = %e, "Model artifact not usable yet, requests will fail until it is"),
    }

    let app = router(state, config.server.max_body_bytes);

    let listener = TcpListener::bind(config.server.bind_addr).await?;
    info!(addr = %config.server.bind_addr, "Prediction API listening");

    let signal = coordinator.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { signal.wait_for_shutdown().await })
        .into_future();

    let drain = async {
        coordinator.wait_for_shutdown().await;
        tokio::time::sleep(coordinator.drain_timeout()).await;
    };

    tokio::select! {
        result = server => result.map_err(|e| PricingError::Network(e.to_string()))?,
        _ = drain => warn!("Drain timeout elapsed, dropping open connections"),
    }

    Ok(())
}
