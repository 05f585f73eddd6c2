// Test fixtures for integration tests

use carprice::compute::{
    BaseEstimator, EncoderStep, EnsembleRegressor, FeatureEncoder, LinearModel, ModelArtifact,
    ModelMetadata, NamedEstimator, RegressionTree, TargetScaler,
};
use carprice::types::CarRecord;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub const BRANDS: [&str; 5] = ["Audi", "BMW", "Citroën", "Peugeot", "Renault"];
pub const FUELS: [&str; 4] = ["diesel", "electro", "hybrid_petrol", "petrol"];
pub const COLORS: [&str; 4] = ["black", "blue", "grey", "white"];
pub const CAR_TYPES: [&str; 4] = ["convertible", "estate", "sedan", "suv"];

const BOOLEAN_COLUMNS: [&str; 7] = [
    "private_parking_available",
    "has_gps",
    "has_air_conditioning",
    "automatic_car",
    "has_getaround_connect",
    "has_speed_regulator",
    "winter_tires",
];

// Feature indices of the sample encoder
const BMW: usize = 1;
const MILEAGE: usize = 17;
const ENGINE_POWER: usize = 18;
const GETAROUND_CONNECT: usize = 23;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Encoder: one-hot brand/fuel/color/type, standardized mileage and power,
/// booleans passed through. 26 features.
pub fn sample_encoder() -> FeatureEncoder {
    FeatureEncoder::new(vec![
        EncoderStep::OneHot {
            name: "cat".to_string(),
            columns: strings(&["model_key", "fuel", "paint_color", "car_type"]),
            categories: vec![strings(&BRANDS), strings(&FUELS), strings(&COLORS), strings(&CAR_TYPES)],
            drop: None,
        },
        EncoderStep::Standard {
            name: "num".to_string(),
            columns: strings(&["mileage", "engine_power"]),
            mean: vec![100000.0, 120.0],
            scale: vec![50000.0, 40.0],
        },
        EncoderStep::Passthrough {
            name: "remainder".to_string(),
            columns: strings(&BOOLEAN_COLUMNS),
        },
    ])
}

/// Stacking of a small forest and a boosted model, target mean 120 and scale 40.
pub fn sample_artifact() -> ModelArtifact {
    ModelArtifact {
        metadata: ModelMetadata {
            name: "stacking".to_string(),
            version: "test".to_string(),
            trained_at: Some("2024-01-01T00:00:00Z".to_string()),
        },
        ensemble: EnsembleRegressor::Stacking {
            n_features_in: 26,
            estimators: vec![
                NamedEstimator {
                    name: "rf".to_string(),
                    estimator: BaseEstimator::RandomForest {
                        trees: vec![
                            RegressionTree::stump(ENGINE_POWER, 0.0, -0.5, 0.8),
                            RegressionTree::stump(MILEAGE, 0.0, 0.3, -0.3),
                        ],
                    },
                },
                NamedEstimator {
                    name: "gb".to_string(),
                    estimator: BaseEstimator::GradientBoosting {
                        init: 0.0,
                        learning_rate: 0.5,
                        trees: vec![
                            RegressionTree::stump(GETAROUND_CONNECT, 0.5, -0.2, 0.4),
                            RegressionTree::stump(BMW, 0.5, 0.0, 0.6),
                        ],
                    },
                },
            ],
            final_estimator: LinearModel {
                coef: vec![0.6, 0.4],
                intercept: 0.0,
            },
            passthrough: false,
        },
        feature_encoder: sample_encoder(),
        scaler: TargetScaler::new(120.0, 40.0),
    }
}

/// First option of the service documentation, priced at 114 €.
pub fn citroen_diesel() -> CarRecord {
    CarRecord {
        model_key: "Citroën".to_string(),
        mileage: 140411,
        engine_power: 100,
        fuel: "diesel".to_string(),
        paint_color: "black".to_string(),
        car_type: "convertible".to_string(),
        private_parking_available: true,
        has_gps: true,
        has_air_conditioning: false,
        automatic_car: false,
        has_getaround_connect: true,
        has_speed_regulator: true,
        winter_tires: true,
    }
}

/// Second option of the service documentation, priced at 132 €.
pub fn citroen_petrol() -> CarRecord {
    CarRecord {
        model_key: "Citroën".to_string(),
        mileage: 13929,
        engine_power: 317,
        fuel: "petrol".to_string(),
        paint_color: "grey".to_string(),
        car_type: "convertible".to_string(),
        private_parking_available: true,
        has_gps: true,
        has_air_conditioning: false,
        automatic_car: false,
        has_getaround_connect: false,
        has_speed_regulator: true,
        winter_tires: true,
    }
}

/// Deterministic random car records for reproducible tests
pub struct RecordGenerator {
    rng: StdRng,
}

impl RecordGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn pick(&mut self, values: &[&str]) -> String {
        values.choose(&mut self.rng).map(|v| v.to_string()).unwrap_or_default()
    }

    /// A record whose levels are all known to the sample encoder
    pub fn record(&mut self) -> CarRecord {
        CarRecord {
            model_key: self.pick(&BRANDS),
            mileage: self.rng.gen_range(0..400_000),
            engine_power: self.rng.gen_range(40..400),
            fuel: self.pick(&FUELS),
            paint_color: self.pick(&COLORS),
            car_type: self.pick(&CAR_TYPES),
            private_parking_available: self.rng.gen(),
            has_gps: self.rng.gen(),
            has_air_conditioning: self.rng.gen(),
            automatic_car: self.rng.gen(),
            has_getaround_connect: self.rng.gen(),
            has_speed_regulator: self.rng.gen(),
            winter_tires: self.rng.gen(),
        }
    }

    pub fn records(&mut self, count: usize) -> Vec<CarRecord> {
        (0..count).map(|_| self.record()).collect()
    }
}
