//! Error types for the local backend.

use soundcomposer_core::OperatorError;
use thiserror::Error;

/// Result type for local operator calls.
pub type LocalResult<T> = Result<T, LocalError>;

/// Errors that can occur while rendering in the local backend.
#[derive(Debug, Error)]
pub enum LocalError {
    /// Invalid sampling frequency.
    #[error("invalid sampling frequency: {rate} Hz")]
    InvalidSamplingFrequency {
        /// The invalid rate.
        rate: f64,
    },

    /// Invalid duration.
    #[error("invalid duration: {duration} seconds")]
    InvalidDuration {
        /// The invalid duration.
        duration: f64,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// Input data whose dimensions do not agree.
    #[error("shape mismatch: {message}")]
    ShapeMismatch {
        /// Error message.
        message: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// Configuration that is not valid JSON.
    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LocalError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a shape mismatch error.
    pub fn shape(message: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            LocalError::InvalidSamplingFrequency { .. } => "LOCAL_001",
            LocalError::InvalidDuration { .. } => "LOCAL_002",
            LocalError::InvalidParameter { .. } => "LOCAL_003",
            LocalError::ShapeMismatch { .. } => "LOCAL_004",
            LocalError::Config { .. } => "LOCAL_005",
            LocalError::Json(_) => "LOCAL_006",
        }
    }

    /// Converts into the error reported across the session boundary.
    pub fn into_operator_error(self, operator: &str) -> OperatorError {
        OperatorError::new(operator, self.code(), self.to_string())
    }
}
