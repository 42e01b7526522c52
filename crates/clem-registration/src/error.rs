//! Error types for registration operations.

use clem_core::transform::TransformError;
use thiserror::Error;

/// Main error type for registration operations.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Error in metric selection or evaluation.
    #[error("Metric error: {0}")]
    MetricError(String),

    /// Invalid transform kind or parameters.
    #[error("Transform error: {0}")]
    TransformError(#[from] TransformError),

    /// An input image cannot be registered.
    #[error("Image validation error: {0}")]
    ImageValidationError(String),

    /// The loss stopped being a finite number.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// Invalid optimizer or schedule settings.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for registration operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;

impl RegistrationError {
    /// Create a metric error.
    pub fn metric(msg: impl Into<String>) -> Self {
        Self::MetricError(msg.into())
    }

    /// Create an image validation error.
    pub fn image_validation(msg: impl Into<String>) -> Self {
        Self::ImageValidationError(msg.into())
    }

    /// Create a numerical instability error.
    pub fn numerical_instability(msg: impl Into<String>) -> Self {
        Self::NumericalInstability(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
