//! Error types for the composition model.

use thiserror::Error;

/// Result type for composition operations.
pub type ComposerResult<T> = Result<T, ComposerError>;

/// Result type for calls into the operator runtime.
pub type OperatorResult<T> = Result<T, OperatorError>;

/// A failure reported by the operator runtime behind a [`crate::Session`].
///
/// The composition core never interprets or retries these; they travel to the
/// caller unchanged inside [`ComposerError::Operator`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("operator '{operator}' failed [{code}]: {message}")]
pub struct OperatorError {
    /// Name of the operator that failed (e.g. "generate_spectrum").
    pub operator: String,
    /// Backend-specific error code (e.g. "LOCAL_002").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl OperatorError {
    /// Creates a new operator error.
    pub fn new(
        operator: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operator: operator.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur while configuring, rendering or persisting a
/// composition.
#[derive(Debug, Error)]
pub enum ComposerError {
    /// A required input (source, control, data) was never set.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// A value failed a domain check.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A value of the wrong kind was assigned dynamically.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Project file version or source type tag is not recognized.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Output requested for plotting before `process()` was called.
    #[error("output is not processed yet: {0}")]
    NotProcessed(String),

    /// The operator runtime failed.
    #[error(transparent)]
    Operator(#[from] OperatorError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ComposerError {
    /// Creates a missing input error.
    pub fn missing_input(message: impl Into<String>) -> Self {
        Self::MissingInput(message.into())
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch(message.into())
    }

    /// Creates an unsupported format error.
    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat(message.into())
    }

    /// Creates a not processed error.
    pub fn not_processed(message: impl Into<String>) -> Self {
        Self::NotProcessed(message.into())
    }

    /// Returns a stable error code for reporting.
    pub fn code(&self) -> &'static str {
        match self {
            ComposerError::MissingInput(_) => "SC_001",
            ComposerError::InvalidInput(_) => "SC_002",
            ComposerError::TypeMismatch(_) => "SC_003",
            ComposerError::UnsupportedFormat(_) => "SC_004",
            ComposerError::NotProcessed(_) => "SC_005",
            ComposerError::Operator(_) => "SC_006",
            ComposerError::Io(_) => "SC_007",
            ComposerError::Json(_) => "SC_008",
        }
    }

    /// Returns the error category for grouping related errors.
    pub fn category(&self) -> &'static str {
        match self {
            ComposerError::Operator(_) => "operator",
            ComposerError::Io(_) | ComposerError::Json(_) => "io",
            _ => "composer",
        }
    }
}

/// Checks that a sampling frequency is strictly positive and finite.
pub(crate) fn check_sampling_frequency(sampling_frequency: f64) -> ComposerResult<()> {
    if sampling_frequency.is_finite() && sampling_frequency > 0.0 {
        Ok(())
    } else {
        Err(ComposerError::invalid_input(format!(
            "sampling frequency must be strictly positive (got {sampling_frequency})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_are_distinct() {
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let errors = [
            ComposerError::missing_input("a"),
            ComposerError::invalid_input("b"),
            ComposerError::type_mismatch("c"),
            ComposerError::unsupported_format("d"),
            ComposerError::not_processed("e"),
            OperatorError::new("resample", "LOCAL_001", "f").into(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "g").into(),
            json.into(),
        ];
        let codes: BTreeSet<&str> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
        assert_eq!(codes.first().copied(), Some("SC_001"));
        assert_eq!(codes.last().copied(), Some("SC_008"));
    }

    #[test]
    fn test_io_and_json_category() {
        let io: ComposerError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert_eq!(io.category(), "io");
        assert_eq!(ComposerError::invalid_input("x").category(), "composer");
    }

    #[test]
    fn test_operator_error_is_transparent() {
        let err: ComposerError =
            OperatorError::new("filter_signal", "LOCAL_001", "denominator is zero").into();
        assert_eq!(
            err.to_string(),
            "operator 'filter_signal' failed [LOCAL_001]: denominator is zero"
        );
        assert_eq!(err.category(), "operator");
    }

    #[test]
    fn test_check_sampling_frequency() {
        assert!(check_sampling_frequency(44100.0).is_ok());
        assert!(matches!(
            check_sampling_frequency(0.0),
            Err(ComposerError::InvalidInput(_))
        ));
        assert!(matches!(
            check_sampling_frequency(-1.0),
            Err(ComposerError::InvalidInput(_))
        ));
        assert!(matches!(
            check_sampling_frequency(f64::NAN),
            Err(ComposerError::InvalidInput(_))
        ));
    }
}
