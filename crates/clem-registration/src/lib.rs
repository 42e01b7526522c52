//! Gradient-based 2D registration for correlative microscopy.
//!
//! [`GradientRegistrationEngine`] estimates a translation, rigid or affine
//! [`SpatialTransform`](clem_core::SpatialTransform) between a fixed and a
//! moving image by minimising a similarity [`metric`] with Adam.

pub mod error;
pub mod metric;
pub mod optimizer;
pub mod registration;
pub mod progress;
pub mod method;
pub mod engine;

pub use error::{RegistrationError, Result};
pub use engine::{GradientRegistrationEngine, RegistrationEngine};
pub use method::{MethodConfig, MetricKind};
pub use progress::{ConsoleProgressCallback, HistoryCallback, ProgressCallback, ProgressInfo, ProgressTracker};
pub use registration::{Registration, RegistrationOutcome};
