//! Error types for the correlation pipeline.

use std::path::PathBuf;

use clem_core::FilterError;
use clem_registration::RegistrationError;
use thiserror::Error;

/// Problems with the run configuration, detected before any image is read.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A required input path was not given.
    #[error("{0} image not specified")]
    MissingInput(&'static str),

    /// A resolved input path does not name a file.
    #[error("No such file: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Neither `register` nor `transform` was requested.
    #[error("You must specify an operation: --register or --transform")]
    NoMode,

    /// Both `register` and `transform` were requested.
    #[error("--register and --transform are mutually exclusive")]
    ConflictingModes,

    /// The transform file for transform mode does not exist.
    #[error("Not a valid transform file: {}", .0.display())]
    TransformNotFound(PathBuf),

    /// The working directory cannot be used.
    #[error("Invalid working directory {}: {reason}", .path.display())]
    WorkingDirectory { path: PathBuf, reason: String },

    /// An option value is malformed or out of range.
    #[error("Invalid value for `{name}`: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

impl ConfigError {
    /// Create an invalid value error.
    pub fn invalid_value(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue { name, reason: reason.into() }
    }
}

/// Failures while executing a resolved configuration.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A degradation stage or the composite failed.
    #[error("{stage} failed: {source}")]
    Filter {
        stage: &'static str,
        #[source]
        source: FilterError,
    },

    /// The registration engine failed.
    #[error("Registration failed: {0}")]
    Registration(#[from] RegistrationError),

    /// Reading or writing a file failed.
    #[error("I/O error: {0:#}")]
    Io(#[from] anyhow::Error),
}

/// Result type for pipeline runs.
pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// Wrap a filter error raised by `stage`.
    pub fn filter(stage: &'static str, source: FilterError) -> Self {
        Self::Filter { stage, source }
    }
}
