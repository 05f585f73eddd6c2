//! carprice - daily rental price estimation for cars.
//!
//! carprice serves a single prediction endpoint. Each request carries one or
//! more car option sets; every set is encoded into the feature space of a
//! trained ensemble regressor, priced, scaled back to euros and returned as
//! a human readable string.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  HTTP API: POST /predict | GET / | /health | /metrics       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Serving: load artifact per request | blocking worker       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Pipeline: feature encoder → ensemble → target scaler       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use carprice::config::ServiceConfig;
//!
//! #[tokio::main]
//! async fn main() -> carprice::Result<()> {
//!     let mut config = ServiceConfig::default();
//!     config.model.artifact_path = "Stacking_model.json".into();
//!
//!     carprice::run(config).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod types;

pub mod api;
pub mod cli;
pub mod compute;
pub mod health;
pub mod observability;
pub mod shutdown;

// Re-exports
pub use error::{PricingError, Result};
pub use types::*;

use config::ServiceConfig;
use shutdown::{ShutdownCoordinator, SignalHandler};
use tracing::info;

/// Run the pricing server with the given configuration.
///
/// Logging must already be initialised, see [`observability::init`].
pub async fn run(config: ServiceConfig) -> Result<()> {
    config.validate()?;
    info!(
        addr = %config.server.bind_addr,
        artifact = %config.model.artifact_path.display(),
        "Starting carprice"
    );

    let metrics = if config.observability.metrics_enabled {
        Some(observability::install_metrics()?)
    } else {
        None
    };

    let coordinator = ShutdownCoordinator::new();

    let signal_coordinator = coordinator.clone();
    tokio::spawn(async move {
        SignalHandler::new(signal_coordinator).run().await;
    });

    api::run_server(config, metrics, coordinator).await?;

    info!("carprice shutdown complete");
    Ok(())
}
