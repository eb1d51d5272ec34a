//! Error types for WheelForge

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum WfError {
    #[error("Invalid range: min ({min}) must be less than max ({max})")]
    Range { min: f64, max: f64 },

    #[error("No candidates to select from")]
    EmptyInput,

    #[error("Invalid weight at index {index}: {value} (weights must be finite and >= 0)")]
    InvalidWeight { index: usize, value: f64 },

    #[error("Sum of weights is zero")]
    DegenerateWeights,

    #[error("Invalid wheel '{wheel}': {reason}")]
    InvalidWheel { wheel: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WfError {
    pub(crate) fn invalid_wheel(wheel: &str, reason: impl Into<String>) -> Self {
        Self::InvalidWheel {
            wheel: wheel.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias
pub type WfResult<T> = Result<T, WfError>;
