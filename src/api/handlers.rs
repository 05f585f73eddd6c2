//! Prediction API request handlers.

use super::server::ApiState;
use crate::error::PricingError;
use crate::health::HealthResponse;
use crate::types::{CarOptions, CarRecord, PredictionResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, warn};

/// Predicts the daily rental price of every submitted option set.
pub async fn predict(
    State(state): State<ApiState>,
    payload: Result<Json<CarOptions>, JsonRejection>,
) -> Result<Json<PredictionResponse>, PricingError> {
    let Json(options) = payload.map_err(reject)?;
    debug!(options = options.car_options.len(), "Predict");

    let timeout = state.request_timeout;
    let response = tokio::time::timeout(timeout, state.service.predict(options))
        .await
        .map_err(|_| PricingError::Timeout(timeout.as_millis() as u64))??;

    Ok(Json(response))
}

/// Turns a body rejection into the client error it stands for.
fn reject(rejection: JsonRejection) -> PricingError {
    let message = rejection.body_text();
    warn!(status = %rejection.status(), %message, "Rejected request body");
    PricingError::InvalidRequest {
        status: rejection.status(),
        message,
    }
}

/// Service description.
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub title: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoint: &'static str,
    pub example_request: CarOptions,
    pub example_response: PredictionResponse,
}

pub async fn describe() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        title: "Car rental price API",
        version: env!("CARGO_PKG_VERSION"),
        description: "Predicts the rental price per day in euros of cars described by their \
                      criteria (brand, mileage, engine power, fuel, color, options). Several \
                      option sets can be priced in one request; predictions come back in the \
                      same order.",
        endpoint: "POST /predict",
        example_request: CarOptions {
            car_options: vec![
                example_record(140411, 100, "diesel", true),
                example_record(13929, 317, "petrol", false),
            ],
        },
        example_response: PredictionResponse {
            predictions: vec!["Option 1: 88 €".to_string(), "Option 2: 156 €".to_string()],
        },
    })
}

fn example_record(mileage: i64, engine_power: i64, fuel: &str, connect: bool) -> CarRecord {
    CarRecord {
        model_key: "Citroën".to_string(),
        mileage,
        engine_power,
        fuel: fuel.to_string(),
        paint_color: if connect { "black" } else { "grey" }.to_string(),
        car_type: "convertible".to_string(),
        private_parking_available: true,
        has_gps: true,
        has_air_conditioning: false,
        automatic_car: false,
        has_getaround_connect: connect,
        has_speed_regulator: true,
        winter_tires: true,
    }
}

pub async fn health(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let report = state.health.check_health(&state.service).await;
    let status = StatusCode::from_u16(report.status.to_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(report))
}

pub async fn metrics(State(state): State<ApiState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
