// Target scaling

use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};

/// Standard scaler fitted on the rental price column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetScaler {
    pub mean: f64,
    pub scale: f64,
}

impl TargetScaler {
    pub fn new(mean: f64, scale: f64) -> Self {
        Self { mean, scale }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mean.is_finite() || !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(PricingError::InvalidArtifact(format!(
                "target scaler has mean {} and scale {}",
                self.mean, self.scale
            )));
        }
        Ok(())
    }

    /// Price units to normalized units
    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|y| (y - self.mean) / self.scale).collect()
    }

    /// Normalized units back to price units
    pub fn inverse_transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|y| y * self.scale + self.mean).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_transform() {
        let scaler = TargetScaler::new(120.0, 40.0);
        assert_eq!(scaler.inverse_transform(&[0.0, 1.0, -0.5]), vec![120.0, 160.0, 100.0]);
        assert_eq!(scaler.transform(&[160.0]), vec![1.0]);
    }

    #[test]
    fn test_validate() {
        assert!(TargetScaler::new(120.0, 40.0).validate().is_ok());
        assert!(TargetScaler::new(120.0, 0.0).validate().is_err());
        assert!(TargetScaler::new(f64::NAN, 1.0).validate().is_err());
    }
}
