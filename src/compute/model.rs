// Model artifact: ensemble, feature encoder and target scaler in one file

use super::encoder::FeatureEncoder;
use super::ensemble::EnsembleRegressor;
use super::scaler::TargetScaler;
use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// On-disk encoding of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// serde_json document
    Json,
    /// bincode blob
    Bincode,
}

impl ArtifactFormat {
    /// Picks the format from the file extension, JSON when unknown
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") | Some("bincode") => ArtifactFormat::Bincode,
            _ => ArtifactFormat::Json,
        }
    }
}

/// Descriptive metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Training timestamp (RFC 3339)
    #[serde(default)]
    pub trained_at: Option<String>,
}

/// Everything needed to price a car record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub metadata: ModelMetadata,
    pub ensemble: EnsembleRegressor,
    pub feature_encoder: FeatureEncoder,
    pub scaler: TargetScaler,
}

impl ModelArtifact {
    /// Reads, decodes and validates an artifact file
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PricingError::ArtifactNotFound(path.display().to_string()),
            _ => PricingError::ArtifactLoad(format!("{}: {}", path.display(), e)),
        })?;

        let format = ArtifactFormat::from_path(path);
        let artifact = Self::decode(&bytes, format)
            .map_err(|e| PricingError::ArtifactLoad(format!("{}: {}", path.display(), e)))?;
        artifact.validate()?;

        debug!(
            path = %path.display(),
            ?format,
            features = artifact.n_features(),
            "Loaded model artifact"
        );
        Ok(artifact)
    }

    /// Decodes an artifact without validating it
    pub fn decode(bytes: &[u8], format: ArtifactFormat) -> Result<Self> {
        let artifact = match format {
            ArtifactFormat::Json => serde_json::from_slice(bytes)?,
            ArtifactFormat::Bincode => bincode::deserialize(bytes)?,
        };
        Ok(artifact)
    }

    /// Encodes the artifact
    pub fn encode(&self, format: ArtifactFormat) -> Result<Vec<u8>> {
        let bytes = match format {
            ArtifactFormat::Json => serde_json::to_vec_pretty(self)?,
            ArtifactFormat::Bincode => bincode::serialize(self)?,
        };
        Ok(bytes)
    }

    /// Writes the artifact in the format implied by `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.encode(ArtifactFormat::from_path(path))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Checks that the three parts fit together
    pub fn validate(&self) -> Result<()> {
        self.feature_encoder.validate()?;
        self.ensemble.validate()?;
        self.scaler.validate()?;

        let expected = self.ensemble.n_features_in();
        let actual = self.feature_encoder.n_features();
        if expected != actual {
            return Err(PricingError::FeatureMismatch { expected, actual });
        }
        Ok(())
    }

    /// Model input width
    pub fn n_features(&self) -> usize {
        self.feature_encoder.n_features()
    }

    /// Human readable summary
    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            name: self.metadata.name.clone(),
            version: self.metadata.version.clone(),
            trained_at: self.metadata.trained_at.clone(),
            ensemble: self.ensemble.kind().to_string(),
            estimators: self
                .ensemble
                .estimators()
                .iter()
                .map(|m| format!("{} ({})", m.name, m.estimator.kind()))
                .collect(),
            n_features: self.n_features(),
            feature_names: self.feature_encoder.feature_names(),
            target_mean: self.scaler.mean,
            target_scale: self.scaler.scale,
        }
    }
}

/// Summary printed by `carprice inspect`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub name: String,
    pub version: String,
    pub trained_at: Option<String>,
    pub ensemble: String,
    pub estimators: Vec<String>,
    pub n_features: usize,
    pub feature_names: Vec<String>,
    pub target_mean: f64,
    pub target_scale: f64,
}
