// Request-level prediction service

use super::inference::{format_predictions, InferenceStatsSnapshot, PricePredictor};
use super::model::ModelArtifact;
use crate::error::{PricingError, Result};
use crate::observability;
use crate::types::{CarOptions, PredictionResponse};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Prices car options against the artifact on disk.
///
/// The artifact is read again for every request, so replacing the file takes
/// effect on the next call without a restart.
#[derive(Clone)]
pub struct PredictionService {
    artifact_path: Arc<PathBuf>,
    predictor: Arc<PricePredictor>,
}

impl PredictionService {
    pub fn new(artifact_path: impl Into<PathBuf>) -> Self {
        Self {
            artifact_path: Arc::new(artifact_path.into()),
            predictor: Arc::new(PricePredictor::new()),
        }
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Loads the artifact and prices every option, in input order
    pub async fn predict(&self, options: CarOptions) -> Result<PredictionResponse> {
        let records = options.car_options;
        if records.is_empty() {
            debug!("Empty option list");
            return Ok(PredictionResponse { predictions: Vec::new() });
        }

        let path = Arc::clone(&self.artifact_path);
        let predictor = Arc::clone(&self.predictor);
        let count = records.len();
        let start = Instant::now();

        let prices = tokio::task::spawn_blocking(move || {
            let artifact = ModelArtifact::load(&path)?;
            predictor.predict(&artifact, &records)
        })
        .await
        .map_err(|e| PricingError::Internal(format!("inference task failed: {}", e)))??;

        observability::record_inference(count, start.elapsed());
        info!(options = count, elapsed_ms = start.elapsed().as_millis() as u64, "Prices predicted");

        Ok(PredictionResponse {
            predictions: format_predictions(&prices),
        })
    }

    /// Loads and validates the artifact without pricing anything
    pub async fn check_artifact(&self) -> Result<ModelArtifact> {
        let path = Arc::clone(&self.artifact_path);
        tokio::task::spawn_blocking(move || ModelArtifact::load(&path))
            .await
            .map_err(|e| PricingError::Internal(format!("artifact check failed: {}", e)))?
    }

    pub fn stats(&self) -> InferenceStatsSnapshot {
        self.predictor.stats()
    }
}
