//! Error types for the carprice service.
//!
//! This module provides a unified error type [`PricingError`] for all carprice
//! operations, along with a convenient [`Result`] type alias.
//!
//! # Error Categories
//!
//! - **Request**: the body could not be turned into car records
//! - **Artifact**: the model file is missing, unreadable or inconsistent
//! - **Inference**: encoding or prediction failed on a loaded artifact
//! - **Configuration**: invalid settings or missing configuration
//!
//! # Example
//!
//! ```rust
//! use carprice::error::{PricingError, Result};
//!
//! fn check_width(expected: usize, actual: usize) -> Result<()> {
//!     if expected != actual {
//!         return Err(PricingError::FeatureMismatch { expected, actual });
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_width(3, 4).unwrap_err().is_server_error());
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::io;
use thiserror::Error;

/// Main error type for carprice operations.
#[derive(Error, Debug)]
pub enum PricingError {
    // Request errors
    #[error("Invalid request: {message}")]
    InvalidRequest { status: StatusCode, message: String },

    // Artifact errors
    #[error("Model artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Failed to load model artifact: {0}")]
    ArtifactLoad(String),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Feature width mismatch: expected {expected}, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    // Inference errors
    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // External errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PricingError {
    /// HTTP status used when the error reaches a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PricingError::InvalidRequest { status, .. } => *status,
            PricingError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for failures on the service side rather than in the request.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Create a schema validation error (422).
    pub fn unprocessable(message: impl Into<String>) -> Self {
        PricingError::InvalidRequest {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }
}

impl From<bincode::Error> for PricingError {
    fn from(e: bincode::Error) -> Self {
        PricingError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for PricingError {
    fn from(e: serde_json::Error) -> Self {
        PricingError::Serialization(e.to_string())
    }
}

/// JSON error body, `{"detail": "..."}`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for PricingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match self {
            PricingError::InvalidRequest { message, .. } => message,
            other => other.to_string(),
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

/// Result type alias for carprice operations.
pub type Result<T> = std::result::Result<T, PricingError>;
