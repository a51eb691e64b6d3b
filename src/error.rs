//! Error types for line scan analysis

use thiserror::Error;

/// Result type alias for pa_linescan operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors raised while analysing a masked calibration photograph.
///
/// The first three variants are unrecoverable for the current image and are
/// never coerced into a default geometry or an empty ranking.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The image handed to a stage carries no transparency channel
    #[error("{stage}: {reason}")]
    InputContract { stage: &'static str, reason: String },

    /// The printed rectangle could not be located
    #[error("Rectangle detection failed: {reason}")]
    GeometryDetection { reason: String },

    /// Nothing usable survived blob filtering
    #[error("No lines found: {reason}")]
    EmptyInput { reason: String },

    /// Configuration could not be read or is invalid
    #[error("Invalid configuration: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An analysis report could not be serialized
    #[error("Cannot serialize report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl AnalysisError {
    pub fn missing_alpha(stage: &'static str) -> Self {
        Self::InputContract {
            stage,
            reason: "image must have an alpha channel".to_string(),
        }
    }

    pub fn geometry(reason: impl Into<String>) -> Self {
        Self::GeometryDetection {
            reason: reason.into(),
        }
    }

    pub fn empty(reason: impl Into<String>) -> Self {
        Self::EmptyInput {
            reason: reason.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error wrapping its cause
    pub fn config_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether taking a new photograph could plausibly fix the failure.
    ///
    /// Contract violations are caller bugs and will fail identically on retry.
    pub fn is_reacquirable(&self) -> bool {
        matches!(
            self,
            AnalysisError::GeometryDetection { .. } | AnalysisError::EmptyInput { .. }
        )
    }
}
