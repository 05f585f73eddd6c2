//! Observability for carprice.
//!
//! Provides logging and Prometheus metrics.

use crate::config::ObservabilityConfig;
use crate::error::{PricingError, Result};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging. `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| PricingError::Internal(format!("Failed to init logging: {}", e)))?;
    } else {
        subscriber
            .with(fmt::layer())
            .try_init()
            .map_err(|e| PricingError::Internal(format!("Failed to init logging: {}", e)))?;
    }

    info!("Observability initialized");
    Ok(())
}

/// Install the global Prometheus recorder.
pub fn install_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| PricingError::Internal(format!("Failed to install metrics recorder: {}", e)))?;

    register_metrics();
    Ok(handle)
}

fn register_metrics() {
    counter!("carprice_requests_total").absolute(0);
    counter!("carprice_predictions_total").absolute(0);
    counter!("carprice_errors_total").absolute(0);
}

/// Record an HTTP request.
pub fn record_request(route: &str, status: u16) {
    counter!(
        "carprice_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if status >= 400 {
        counter!("carprice_errors_total").increment(1);
    }
}

/// Record a priced batch.
pub fn record_inference(options: usize, elapsed: Duration) {
    counter!("carprice_predictions_total").increment(options as u64);
    histogram!("carprice_inference_seconds").record(elapsed.as_secs_f64());
}
