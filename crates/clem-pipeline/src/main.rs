use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use burn_ndarray::NdArray;
use clap::Parser;
use clem_pipeline::{run, PipelineConfig, PipelineOptions};
use clem_registration::GradientRegistrationEngine;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

type Backend = NdArray<f32>;

#[derive(Parser, Debug)]
#[command(name = "clem")]
#[command(about = "Register an EM image onto a STED image and write an RGB composite")]
struct Cli {
    /// Directory that relative paths are resolved against
    #[arg(long)]
    working_directory: Option<PathBuf>,

    /// Fixed (STED) image
    #[arg(long)]
    sted: Option<PathBuf>,

    /// Moving (EM) image
    #[arg(long)]
    em: Option<PathBuf>,

    /// Estimate the transform by registration
    #[arg(long)]
    register: bool,

    /// Apply a saved transform file instead of registering
    #[arg(long, value_name = "FILE")]
    transform: Option<PathBuf>,

    /// Grayscale dilation radius applied to both images
    #[arg(long, default_value_t = 0)]
    dilation_size: usize,

    /// Gaussian blur variance applied to the EM image
    #[arg(long, default_value_t = 0.0)]
    gaussian_variance: f64,

    /// Mean filter radius applied to both images
    #[arg(long, default_value_t = 0)]
    mean_kernel: usize,

    /// Cast both images to --image-type before thresholding
    #[arg(long)]
    use_internal_type: bool,

    /// Pixel type used by --use-internal-type (default float32)
    #[arg(long)]
    image_type: Option<String>,

    /// Zero samples above this value in both images
    #[arg(long, default_value_t = 0.0)]
    threshold: f64,

    /// Normalize both images to zero mean and unit variance
    #[arg(long)]
    normalize: bool,

    /// Rescale both images to the full range of their pixel type
    #[arg(long)]
    rescale_to_full_range: bool,

    /// Similarity metric: correlation or mean-squared-difference
    #[arg(long)]
    registration_method: Option<String>,

    /// Transform family: translation, rigid or affine
    #[arg(long)]
    transform_type: Option<String>,

    /// Optimizer iterations
    #[arg(long)]
    iterations: Option<usize>,

    /// Initial optimizer learning rate
    #[arg(long)]
    learning_rate: Option<f64>,
}

impl From<Cli> for PipelineOptions {
    fn from(cli: Cli) -> Self {
        PipelineOptions {
            working_directory: cli.working_directory,
            sted: cli.sted,
            em: cli.em,
            register: cli.register,
            transform: cli.transform,
            dilation_size: cli.dilation_size,
            gaussian_variance: cli.gaussian_variance,
            mean_kernel: cli.mean_kernel,
            use_internal_type: cli.use_internal_type,
            image_type: cli.image_type,
            threshold: cli.threshold,
            normalize: cli.normalize,
            rescale_to_full_range: cli.rescale_to_full_range,
            registration_method: cli.registration_method,
            transform_type: cli.transform_type,
            iterations: cli.iterations,
            learning_rate: cli.learning_rate,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match PipelineConfig::resolve(cli.into()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(1);
        }
    };

    let device = Default::default();
    let engine = GradientRegistrationEngine::new();
    match run::<Backend, _>(&config, &engine, &device).context("Correlation run failed") {
        Ok(outcome) => {
            info!(
                composite = %outcome.composite.display(),
                transform = ?outcome.transform.parameters(),
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_maps_onto_options() {
        let cli = Cli::try_parse_from([
            "clem",
            "--working-directory",
            "/data",
            "--sted",
            "sted.tif",
            "--em",
            "em.nii.gz",
            "--register",
            "--dilation-size",
            "2",
            "--gaussian-variance",
            "1.5",
            "--use-internal-type",
            "--image-type",
            "uint8",
            "--registration-method",
            "mean-squared-difference",
            "--transform-type",
            "translation",
            "--iterations",
            "20",
        ])
        .unwrap();
        let options = PipelineOptions::from(cli);
        assert_eq!(options.working_directory, Some(PathBuf::from("/data")));
        assert_eq!(options.em, Some(PathBuf::from("em.nii.gz")));
        assert!(options.register);
        assert_eq!(options.transform, None);
        assert_eq!(options.dilation_size, 2);
        assert_eq!(options.gaussian_variance, 1.5);
        assert!(options.use_internal_type);
        assert_eq!(options.image_type.as_deref(), Some("uint8"));
        assert_eq!(options.iterations, Some(20));
        assert_eq!(options.learning_rate, None);
    }

    #[test]
    fn test_no_arguments_is_neutral() {
        let cli = Cli::try_parse_from(["clem"]).unwrap();
        assert_eq!(PipelineOptions::from(cli), PipelineOptions::default());
    }
}
