//! Common test utilities for integration tests.

pub mod fixtures;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use carprice::api::{router, ApiState};
use carprice::compute::ModelArtifact;
use carprice::config::ServiceConfig;
use http_body_util::BodyExt;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

pub use fixtures::*;

/// Test environment owning a temporary artifact directory.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub artifact_path: PathBuf,
}

impl TestEnv {
    /// Environment with the sample artifact written as JSON.
    pub fn new() -> Self {
        Self::with_artifact("Stacking_model.json", &sample_artifact())
    }

    pub fn with_artifact(file_name: &str, artifact: &ModelArtifact) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let artifact_path = temp_dir.path().join(file_name);
        artifact.save(&artifact_path).expect("Failed to write artifact");
        Self {
            temp_dir,
            artifact_path,
        }
    }

    /// Environment whose artifact path does not exist.
    pub fn without_artifact() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let artifact_path = temp_dir.path().join("missing.json");
        Self {
            temp_dir,
            artifact_path,
        }
    }

    pub fn config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.model.artifact_path = self.artifact_path.clone();
        config
    }

    /// Router serving this environment's artifact, metrics disabled.
    pub fn app(&self) -> Router {
        let config = self.config();
        router(ApiState::new(&config, None), config.server.max_body_bytes)
    }
}

/// Sends a request and returns the status with the parsed JSON body.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}
