//! Car price inference for carprice
//!
//! Provides the pieces of the pricing pipeline:
//! - Feature encoding of car records
//! - Tree and linear ensemble regressors
//! - Target scaling back to currency units
//! - The artifact file bundling all three
//! - Batch inference and request-level serving

pub mod encoder;
pub mod ensemble;
pub mod inference;
pub mod model;
pub mod scaler;
pub mod serving;

pub use encoder::{EncoderStep, FeatureEncoder, FeatureMatrix};
pub use ensemble::{BaseEstimator, EnsembleRegressor, LinearModel, NamedEstimator, RegressionTree};
pub use inference::{format_predictions, round_price, InferenceStatsSnapshot, PricePredictor};
pub use model::{ArtifactFormat, ArtifactSummary, ModelArtifact, ModelMetadata};
pub use scaler::TargetScaler;
pub use serving::PredictionService;
