//! Health reporting for the pricing server.

use crate::compute::{InferenceStatsSnapshot, PredictionService};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service can price requests.
    Healthy,
    /// Requests would fail.
    Unhealthy,
}

impl HealthStatus {
    /// Convert to HTTP status code.
    pub fn to_status_code(&self) -> u16 {
        match self {
            HealthStatus::Healthy => 200,
            HealthStatus::Unhealthy => 503,
        }
    }

    /// Combine two statuses (worst wins).
    pub fn combine(&self, other: &HealthStatus) -> HealthStatus {
        match (self, other) {
            (HealthStatus::Healthy, HealthStatus::Healthy) => HealthStatus::Healthy,
            _ => HealthStatus::Unhealthy,
        }
    }
}

/// Individual component health check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub details: HashMap<String, String>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            message: None,
            latency_ms: None,
            details: HashMap::new(),
        }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
            latency_ms: None,
            details: HashMap::new(),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency_ms = Some(latency.as_millis() as u64);
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Full health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: Vec<ComponentHealth>,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(version: impl Into<String>, start_time: Instant) -> Self {
        Self {
            status: HealthStatus::Healthy,
            version: version.into(),
            uptime_seconds: start_time.elapsed().as_secs(),
            components: Vec::new(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Add a component, degrading the overall status as needed.
    pub fn add_component(&mut self, component: ComponentHealth) {
        self.status = self.status.combine(&component.status);
        self.components.push(component);
    }
}

/// Tracks uptime and builds health responses.
#[derive(Debug, Clone)]
pub struct HealthChecker {
    version: String,
    start_time: Instant,
}

impl HealthChecker {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            start_time: Instant::now(),
        }
    }

    /// Runs every check and combines the results.
    pub async fn check_health(&self, service: &PredictionService) -> HealthResponse {
        let mut response = HealthResponse::new(&self.version, self.start_time);
        response.add_component(checks::artifact(service).await);
        response.add_component(checks::predictor(&service.stats()));
        response
    }
}

pub mod checks {
    use super::*;

    /// The artifact must load and validate, exactly as a request would.
    pub async fn artifact(service: &PredictionService) -> ComponentHealth {
        let start = Instant::now();
        let component = match service.check_artifact().await {
            Ok(artifact) => ComponentHealth::healthy("artifact")
                .with_detail("features", artifact.n_features().to_string())
                .with_detail("ensemble", artifact.ensemble.kind()),
            Err(e) => ComponentHealth::unhealthy("artifact", e.to_string()),
        };
        component
            .with_detail("path", service.artifact_path().display().to_string())
            .with_latency(start.elapsed())
    }

    /// Counters of the batches priced since startup.
    pub fn predictor(stats: &InferenceStatsSnapshot) -> ComponentHealth {
        ComponentHealth::healthy("predictor")
            .with_detail("total_batches", stats.total_batches.to_string())
            .with_detail("failed_batches", stats.failed_batches.to_string())
            .with_detail("total_records", stats.total_records.to_string())
            .with_detail("avg_batch_time_us", stats.avg_batch_time_us.to_string())
    }
}
