//! Correlative STED/EM registration pipeline.
//!
//! A run resolves its options into a [`PipelineConfig`], degrades working
//! copies of both images through the [`stage`] chain, aligns the moving
//! image either by registration or with a saved transform, and writes an
//! RGB composite of the originals.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod stage;

pub use artifacts::RunArtifacts;
pub use config::{AlignMode, DegradationConfig, PipelineConfig, PipelineOptions};
pub use error::{ConfigError, PipelineError, Result};
pub use pipeline::{run, run_with_artifacts, RunOutcome};
pub use stage::{degrade, stages, Stage, WorkingPair};
