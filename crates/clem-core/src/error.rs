//! Error types for image filtering operations.

use thiserror::Error;
use crate::image::PixelType;

/// Error type shared by every fallible operation of the filter library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// A numeric parameter is outside its valid domain.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },

    /// The operation is not defined for this pixel type.
    #[error("{operation} does not support pixel type {pixel_type}")]
    UnsupportedPixelType {
        operation: &'static str,
        pixel_type: PixelType,
    },

    /// Two images that must share a grid do not.
    #[error("Geometry mismatch: {0}")]
    GeometryMismatch(String),

    /// A pixel type name could not be parsed.
    #[error("Unknown pixel type: {0}")]
    UnknownPixelType(String),
}

/// Result type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;

impl FilterError {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { name, reason: reason.into() }
    }

    /// Create an unsupported pixel type error.
    pub fn unsupported(operation: &'static str, pixel_type: PixelType) -> Self {
        Self::UnsupportedPixelType { operation, pixel_type }
    }

    /// Create a geometry mismatch error.
    pub fn geometry_mismatch(msg: impl Into<String>) -> Self {
        Self::GeometryMismatch(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FilterError::unsupported("rescale_intensity", PixelType::UInt16);
        assert_eq!(err.to_string(), "rescale_intensity does not support pixel type uint16");

        let err = FilterError::invalid_parameter("variance", "must be non-negative");
        assert_eq!(err.to_string(), "Invalid parameter `variance`: must be non-negative");
    }
}
