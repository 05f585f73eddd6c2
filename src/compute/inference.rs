// Preprocessing-then-inference pipeline

use super::model::ModelArtifact;
use crate::error::{PricingError, Result};
use crate::types::CarRecord;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::debug;

/// Inference statistics
#[derive(Debug, Default)]
struct InferenceStats {
    total_batches: AtomicU64,
    total_records: AtomicU64,
    failed_batches: AtomicU64,
    total_inference_time_us: AtomicU64,
}

/// Runs encode, predict and inverse scaling over batches of records
#[derive(Debug, Default)]
pub struct PricePredictor {
    stats: InferenceStats,
}

impl PricePredictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prices every record in one batch, in input order
    pub fn predict(&self, artifact: &ModelArtifact, records: &[CarRecord]) -> Result<Vec<f64>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let result = run_pipeline(artifact, records);
        let elapsed_us = start.elapsed().as_micros() as u64;

        self.stats.total_batches.fetch_add(1, Ordering::Relaxed);
        match &result {
            Ok(_) => {
                self.stats.total_records.fetch_add(records.len() as u64, Ordering::Relaxed);
                self.stats.total_inference_time_us.fetch_add(elapsed_us, Ordering::Relaxed);
            }
            Err(_) => {
                self.stats.failed_batches.fetch_add(1, Ordering::Relaxed);
            }
        }

        debug!(records = records.len(), elapsed_us, ok = result.is_ok(), "Batch priced");
        result
    }

    /// Gets statistics snapshot
    pub fn stats(&self) -> InferenceStatsSnapshot {
        let total_batches = self.stats.total_batches.load(Ordering::Relaxed);
        let failed_batches = self.stats.failed_batches.load(Ordering::Relaxed);
        let successful = total_batches - failed_batches;
        let total_time = self.stats.total_inference_time_us.load(Ordering::Relaxed);

        InferenceStatsSnapshot {
            total_batches,
            failed_batches,
            total_records: self.stats.total_records.load(Ordering::Relaxed),
            avg_batch_time_us: if successful > 0 { total_time / successful } else { 0 },
        }
    }
}

fn run_pipeline(artifact: &ModelArtifact, records: &[CarRecord]) -> Result<Vec<f64>> {
    let features = artifact.feature_encoder.transform(records)?;
    let normalized = artifact.ensemble.predict(&features)?;
    let prices = artifact.scaler.inverse_transform(&normalized);

    if let Some(pos) = prices.iter().position(|p| !p.is_finite()) {
        return Err(PricingError::Inference(format!(
            "non-finite price for option {}",
            pos + 1
        )));
    }
    Ok(prices)
}

/// Statistics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceStatsSnapshot {
    pub total_batches: u64,
    pub failed_batches: u64,
    pub total_records: u64,
    pub avg_batch_time_us: u64,
}

/// Rounds a price to a whole, non-negative amount.
///
/// Halves round to even, like Python's `round`.
pub fn round_price(price: f64) -> u64 {
    let rounded = price.round_ties_even();
    if rounded <= 0.0 {
        0
    } else {
        rounded as u64
    }
}

/// Formats prices as `Option <i>: <price> €`, numbered from 1
pub fn format_predictions(prices: &[f64]) -> Vec<String> {
    prices
        .iter()
        .enumerate()
        .map(|(i, price)| format!("Option {}: {} €", i + 1, round_price(*price)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::encoder::{EncoderStep, FeatureEncoder};
    use super::super::ensemble::{BaseEstimator, EnsembleRegressor, LinearModel, NamedEstimator};
    use super::super::model::ModelMetadata;
    use super::super::scaler::TargetScaler;
    use super::*;

    fn artifact() -> ModelArtifact {
        ModelArtifact {
            metadata: ModelMetadata::default(),
            ensemble: EnsembleRegressor::Voting {
                n_features_in: 1,
                estimators: vec![NamedEstimator {
                    name: "lr".to_string(),
                    estimator: BaseEstimator::Linear(LinearModel { coef: vec![0.01], intercept: -1.0 }),
                }],
                weights: None,
            },
            feature_encoder: FeatureEncoder::new(vec![EncoderStep::Passthrough {
                name: "remainder".to_string(),
                columns: vec!["engine_power".to_string()],
            }]),
            scaler: TargetScaler::new(100.0, 50.0),
        }
    }

    fn record(engine_power: i64) -> CarRecord {
        CarRecord {
            model_key: "Peugeot".to_string(),
            mileage: 50000,
            engine_power,
            fuel: "diesel".to_string(),
            paint_color: "white".to_string(),
            car_type: "estate".to_string(),
            private_parking_available: true,
            has_gps: false,
            has_air_conditioning: true,
            automatic_car: false,
            has_getaround_connect: true,
            has_speed_regulator: true,
            winter_tires: true,
        }
    }

    #[test]
    fn test_predict_batch() {
        let predictor = PricePredictor::new();
        let prices = predictor.predict(&artifact(), &[record(100), record(200)]).unwrap();
        assert_eq!(prices, vec![100.0, 150.0]);

        let stats = predictor.stats();
        assert_eq!(stats.total_batches, 1);
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.failed_batches, 0);
    }

    #[test]
    fn test_empty_batch_skips_model() {
        let predictor = PricePredictor::new();
        assert!(predictor.predict(&artifact(), &[]).unwrap().is_empty());
        assert_eq!(predictor.stats().total_batches, 0);
    }

    #[test]
    fn test_round_price() {
        assert_eq!(round_price(87.6), 88);
        assert_eq!(round_price(88.5), 88);
        assert_eq!(round_price(89.5), 90);
        assert_eq!(round_price(-12.0), 0);
        assert_eq!(round_price(-0.4), 0);
    }

    #[test]
    fn test_format_predictions() {
        assert_eq!(
            format_predictions(&[87.6, 156.2]),
            vec!["Option 1: 88 €", "Option 2: 156 €"]
        );
        assert!(format_predictions(&[]).is_empty());
    }
}
