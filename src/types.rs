//! Core request and response types for carprice.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One set of car criteria submitted for pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarRecord {
    /// Brand of the car.
    pub model_key: String,
    /// Odometer reading in kilometres.
    pub mileage: i64,
    /// Engine power in horsepower.
    pub engine_power: i64,
    pub fuel: String,
    pub paint_color: String,
    pub car_type: String,
    pub private_parking_available: bool,
    pub has_gps: bool,
    pub has_air_conditioning: bool,
    pub automatic_car: bool,
    pub has_getaround_connect: bool,
    pub has_speed_regulator: bool,
    pub winter_tires: bool,
}

impl CarRecord {
    /// Column names in declaration order.
    pub const COLUMNS: [&'static str; 13] = [
        "model_key",
        "mileage",
        "engine_power",
        "fuel",
        "paint_color",
        "car_type",
        "private_parking_available",
        "has_gps",
        "has_air_conditioning",
        "automatic_car",
        "has_getaround_connect",
        "has_speed_regulator",
        "winter_tires",
    ];

    /// Read a column by name.
    pub fn value(&self, column: &str) -> Option<FeatureValue> {
        let value = match column {
            "model_key" => FeatureValue::Category(self.model_key.clone()),
            "mileage" => FeatureValue::Number(self.mileage as f64),
            "engine_power" => FeatureValue::Number(self.engine_power as f64),
            "fuel" => FeatureValue::Category(self.fuel.clone()),
            "paint_color" => FeatureValue::Category(self.paint_color.clone()),
            "car_type" => FeatureValue::Category(self.car_type.clone()),
            "private_parking_available" => FeatureValue::Flag(self.private_parking_available),
            "has_gps" => FeatureValue::Flag(self.has_gps),
            "has_air_conditioning" => FeatureValue::Flag(self.has_air_conditioning),
            "automatic_car" => FeatureValue::Flag(self.automatic_car),
            "has_getaround_connect" => FeatureValue::Flag(self.has_getaround_connect),
            "has_speed_regulator" => FeatureValue::Flag(self.has_speed_regulator),
            "winter_tires" => FeatureValue::Flag(self.winter_tires),
            _ => return None,
        };
        Some(value)
    }

    /// Kind of a column, or `None` for an unknown name.
    pub fn column_kind(column: &str) -> Option<ColumnKind> {
        match column {
            "model_key" | "fuel" | "paint_color" | "car_type" => Some(ColumnKind::Categorical),
            "mileage" | "engine_power" => Some(ColumnKind::Numeric),
            c if Self::COLUMNS.contains(&c) => Some(ColumnKind::Boolean),
            _ => None,
        }
    }
}

/// Kind of a car record column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Categorical,
    Numeric,
    Boolean,
}

/// A single column value, as read from a record or decoded from features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Category(String),
    Number(f64),
    Flag(bool),
}

impl FeatureValue {
    /// Numeric view: numbers as-is, flags as 0/1, categories have none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            FeatureValue::Flag(b) => Some(if *b { 1.0 } else { 0.0 }),
            FeatureValue::Category(_) => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            FeatureValue::Category(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Category(s) => write!(f, "{}", s),
            FeatureValue::Number(n) => write!(f, "{}", n),
            FeatureValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

/// Request body of the prediction endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarOptions {
    pub car_options: Vec<CarRecord>,
}

/// Response body of the prediction endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predictions: Vec<String>,
}
