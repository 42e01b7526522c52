//! The correlation run: load, degrade, align, compose and write.

use std::path::PathBuf;

use anyhow::Context;
use burn::tensor::backend::Backend;
use clem_core::filter::{compose, resample};
use clem_core::{Image, SpatialTransform};
use clem_registration::RegistrationEngine;
use tracing::info;

use crate::artifacts::RunArtifacts;
use crate::config::{AlignMode, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::stage::{degrade, WorkingPair};

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The RGB composite: fixed original in red, aligned moving in green.
    pub composite: PathBuf,
    /// The estimated transform file; `None` in transform mode.
    pub transform_file: Option<PathBuf>,
    /// Transform used to resample the moving image.
    pub transform: SpatialTransform,
    /// Degradation stages that ran, in order.
    pub stages: Vec<&'static str>,
}

fn load<B: Backend>(role: &str, path: &std::path::Path, device: &B::Device) -> Result<Image<B, 2>> {
    let image = clem_io::read_image::<B, _>(path, device)
        .with_context(|| format!("Failed to load {} image {}", role, path.display()))?;
    info!(
        role,
        path = %path.display(),
        size = ?image.size(),
        pixel_type = %image.pixel_type(),
        "loaded image"
    );
    Ok(image)
}

/// Run `config` with output names derived from the current time.
pub fn run<B, E>(config: &PipelineConfig, engine: &E, device: &B::Device) -> Result<RunOutcome>
where
    B: Backend,
    E: RegistrationEngine<B>,
{
    run_with_artifacts(config, engine, device, &RunArtifacts::now(config.working_directory()))
}

/// Run `config`, writing to the paths of `artifacts`.
///
/// The originals are never modified: the degradation stages work on copies,
/// and the moving original is what gets resampled into the composite.
pub fn run_with_artifacts<B, E>(
    config: &PipelineConfig,
    engine: &E,
    device: &B::Device,
    artifacts: &RunArtifacts,
) -> Result<RunOutcome>
where
    B: Backend,
    E: RegistrationEngine<B>,
{
    let fixed_original = load::<B>("STED", config.sted(), device)?;
    let moving_original = load::<B>("EM", config.em(), device)?;

    let working = WorkingPair::new(fixed_original.clone(), moving_original.clone());
    let (working, stages) = degrade(config.degradation(), working)?;

    let transform = match config.mode() {
        AlignMode::Register(method) => {
            info!(method = %method.metric, transform = %method.transform, "registering images");
            engine.estimate(&working.fixed, &working.moving, method)?
        }
        AlignMode::Transform { path } => {
            info!(path = %path.display(), "applying saved transform");
            clem_io::read_transform(path)?
        }
    };
    let aligned = resample(&moving_original, &transform, Some(&working.fixed));

    let composite = compose(&fixed_original, &aligned, None).map_err(|e| PipelineError::filter("compose", e))?;

    artifacts.create_output_dir()?;
    // The transform is only written once the composite is on disk, so a
    // failed run never leaves a transform without its composite.
    let composite_path = artifacts.composite_path(config.mode());
    clem_io::write_color_image(&composite_path, &composite)?;
    info!(path = %composite_path.display(), "wrote composite");
    let transform_file = match config.mode() {
        AlignMode::Register(_) => {
            let path = artifacts.transform_path();
            clem_io::write_transform(&path, &transform)?;
            info!(path = %path.display(), "wrote transform");
            Some(path)
        }
        AlignMode::Transform { .. } => None,
    };

    Ok(RunOutcome {
        composite: composite_path,
        transform_file,
        transform,
        stages,
    })
}
