//! Run configuration.
//!
//! Raw [`PipelineOptions`] carry whatever the caller supplied. They are
//! checked and resolved once by [`PipelineConfig::resolve`]; the resulting
//! [`PipelineConfig`] is immutable.

use std::path::{Path, PathBuf};

use clem_core::{PixelType, TransformKind};
use clem_registration::{MethodConfig, MetricKind};

use crate::error::ConfigError;

/// Unvalidated run options. `Default` leaves every stage and mode off.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOptions {
    /// Base for relative paths; the current directory when absent.
    pub working_directory: Option<PathBuf>,
    /// Fixed (STED) image.
    pub sted: Option<PathBuf>,
    /// Moving (EM) image.
    pub em: Option<PathBuf>,
    pub register: bool,
    /// Transform file to apply instead of registering.
    pub transform: Option<PathBuf>,
    pub dilation_size: usize,
    pub gaussian_variance: f64,
    pub mean_kernel: usize,
    pub use_internal_type: bool,
    pub image_type: Option<String>,
    pub threshold: f64,
    pub normalize: bool,
    pub rescale_to_full_range: bool,
    pub registration_method: Option<String>,
    pub transform_type: Option<String>,
    pub iterations: Option<usize>,
    pub learning_rate: Option<f64>,
}

/// How the moving image is brought onto the fixed grid.
#[derive(Debug, Clone, PartialEq)]
pub enum AlignMode {
    /// Estimate a transform from the working pair.
    Register(MethodConfig),
    /// Apply a previously written transform file.
    Transform { path: PathBuf },
}

/// Settings of the degradation stages. A zero, `false` or absent value
/// disables the corresponding stage.
#[derive(Debug, Clone, PartialEq)]
pub struct DegradationConfig {
    /// Grayscale dilation radius in pixels.
    pub dilation_size: usize,
    /// Gaussian variance in physical units, applied to the moving image.
    pub gaussian_variance: f64,
    /// Mean filter radius in pixels.
    pub mean_kernel: usize,
    /// Target of the cast stage, if enabled.
    pub cast_type: Option<PixelType>,
    /// When positive, samples above this value are zeroed.
    pub threshold: f64,
    pub normalize: bool,
    pub rescale_to_full_range: bool,
}

impl Default for DegradationConfig {
    fn default() -> Self {
        Self {
            dilation_size: 0,
            gaussian_variance: 0.0,
            mean_kernel: 0,
            cast_type: None,
            threshold: 0.0,
            normalize: false,
            rescale_to_full_range: false,
        }
    }
}

impl DegradationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dilation(mut self, radius: usize) -> Self {
        self.dilation_size = radius;
        self
    }

    pub fn with_gaussian_variance(mut self, variance: f64) -> Self {
        self.gaussian_variance = variance;
        self
    }

    pub fn with_mean_kernel(mut self, radius: usize) -> Self {
        self.mean_kernel = radius;
        self
    }

    /// Cast both working images to `pixel_type`.
    pub fn with_cast(mut self, pixel_type: PixelType) -> Self {
        self.cast_type = Some(pixel_type);
        self
    }

    pub fn with_threshold(mut self, cutoff: f64) -> Self {
        self.threshold = cutoff;
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_rescale(mut self, rescale: bool) -> Self {
        self.rescale_to_full_range = rescale;
        self
    }

    /// Check the numeric settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.gaussian_variance.is_finite() && self.gaussian_variance >= 0.0) {
            return Err(ConfigError::invalid_value(
                "gaussian_variance",
                format!("must be a non-negative number, got {}", self.gaussian_variance),
            ));
        }
        if !(self.threshold.is_finite() && self.threshold >= 0.0) {
            return Err(ConfigError::invalid_value(
                "threshold",
                format!("must be a non-negative number, got {}", self.threshold),
            ));
        }
        Ok(())
    }
}

/// Resolved, immutable run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    working_directory: PathBuf,
    sted: PathBuf,
    em: PathBuf,
    mode: AlignMode,
    degradation: DegradationConfig,
}

fn parse<T: std::str::FromStr>(name: &'static str, value: Option<&str>) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .map(|v| v.parse::<T>().map_err(|e| ConfigError::invalid_value(name, e.to_string())))
        .transpose()
}

fn resolve_working_directory(dir: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let dir = dir.unwrap_or_else(|| Path::new("."));
    let resolved = dir.canonicalize().map_err(|e| ConfigError::WorkingDirectory {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !resolved.is_dir() {
        return Err(ConfigError::WorkingDirectory {
            path: dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    Ok(resolved)
}

fn method_config(options: &PipelineOptions) -> Result<MethodConfig, ConfigError> {
    let mut method = MethodConfig::new();
    if let Some(metric) = parse::<MetricKind>("registration_method", options.registration_method.as_deref())? {
        method = method.with_metric(metric);
    }
    if let Some(kind) = parse::<TransformKind>("transform_type", options.transform_type.as_deref())? {
        method = method.with_transform(kind);
    }
    if let Some(iterations) = options.iterations {
        method = method.with_iterations(iterations);
    }
    if let Some(rate) = options.learning_rate {
        method = method.with_learning_rate(rate);
    }
    method
        .validate()
        .map_err(|e| ConfigError::invalid_value("learning_rate", e.to_string()))?;
    Ok(method)
}

fn degradation_config(options: &PipelineOptions) -> Result<DegradationConfig, ConfigError> {
    let mut degradation = DegradationConfig::new()
        .with_dilation(options.dilation_size)
        .with_gaussian_variance(options.gaussian_variance)
        .with_mean_kernel(options.mean_kernel)
        .with_threshold(options.threshold)
        .with_normalize(options.normalize)
        .with_rescale(options.rescale_to_full_range);
    let image_type = parse::<PixelType>("image_type", options.image_type.as_deref())?;
    if options.use_internal_type {
        degradation = degradation.with_cast(image_type.unwrap_or(PixelType::Float32));
    }
    degradation.validate()?;
    Ok(degradation)
}

impl PipelineConfig {
    /// Validate `options` and resolve every path against the working
    /// directory.
    ///
    /// Fails before touching any image when an input is missing, when not
    /// exactly one of `register` and `transform` is set, or when the
    /// transform file does not exist.
    pub fn resolve(options: PipelineOptions) -> Result<Self, ConfigError> {
        let sted = options.sted.as_ref().ok_or(ConfigError::MissingInput("STED"))?;
        let em = options.em.as_ref().ok_or(ConfigError::MissingInput("EM"))?;

        match (options.register, options.transform.is_some()) {
            (false, false) => return Err(ConfigError::NoMode),
            (true, true) => return Err(ConfigError::ConflictingModes),
            _ => {}
        }

        let working_directory = resolve_working_directory(options.working_directory.as_deref())?;
        let sted = working_directory.join(sted);
        if !sted.is_file() {
            return Err(ConfigError::FileNotFound(sted));
        }
        let em = working_directory.join(em);
        if !em.is_file() {
            return Err(ConfigError::FileNotFound(em));
        }

        let mode = match &options.transform {
            Some(path) => {
                let path = working_directory.join(path);
                if !path.is_file() {
                    return Err(ConfigError::TransformNotFound(path));
                }
                AlignMode::Transform { path }
            }
            None => AlignMode::Register(method_config(&options)?),
        };
        let degradation = degradation_config(&options)?;

        Ok(Self {
            working_directory,
            sted,
            em,
            mode,
            degradation,
        })
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Absolute path of the fixed image.
    pub fn sted(&self) -> &Path {
        &self.sted
    }

    /// Absolute path of the moving image.
    pub fn em(&self) -> &Path {
        &self.em
    }

    pub fn mode(&self) -> &AlignMode {
        &self.mode
    }

    pub fn degradation(&self) -> &DegradationConfig {
        &self.degradation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn workspace() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sted.tif"), b"x").unwrap();
        fs::write(dir.path().join("em.tif"), b"x").unwrap();
        fs::write(dir.path().join("saved.txt"), b"x").unwrap();
        dir
    }

    fn options(dir: &TempDir) -> PipelineOptions {
        PipelineOptions {
            working_directory: Some(dir.path().to_path_buf()),
            sted: Some("sted.tif".into()),
            em: Some("em.tif".into()),
            register: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_register_defaults() {
        let dir = workspace();
        let config = PipelineConfig::resolve(options(&dir)).unwrap();

        assert!(config.sted().is_absolute());
        assert!(config.sted().ends_with("sted.tif"));
        assert!(config.em().ends_with("em.tif"));
        assert_eq!(config.mode(), &AlignMode::Register(MethodConfig::default()));
        assert_eq!(config.degradation(), &DegradationConfig::default());
    }

    #[test]
    fn test_resolve_transform_mode() {
        let dir = workspace();
        let opts = PipelineOptions {
            register: false,
            transform: Some("saved.txt".into()),
            ..options(&dir)
        };
        let config = PipelineConfig::resolve(opts).unwrap();
        match config.mode() {
            AlignMode::Transform { path } => assert!(path.ends_with("saved.txt")),
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn test_missing_inputs() {
        let dir = workspace();
        let opts = PipelineOptions { sted: None, ..options(&dir) };
        assert_eq!(PipelineConfig::resolve(opts), Err(ConfigError::MissingInput("STED")));

        let opts = PipelineOptions { em: None, ..options(&dir) };
        assert_eq!(PipelineConfig::resolve(opts), Err(ConfigError::MissingInput("EM")));

        let opts = PipelineOptions { em: Some("absent.tif".into()), ..options(&dir) };
        assert!(matches!(PipelineConfig::resolve(opts), Err(ConfigError::FileNotFound(p)) if p.ends_with("absent.tif")));
    }

    #[test]
    fn test_mode_selection() {
        let dir = workspace();
        let opts = PipelineOptions { register: false, ..options(&dir) };
        assert_eq!(PipelineConfig::resolve(opts), Err(ConfigError::NoMode));

        let opts = PipelineOptions { transform: Some("saved.txt".into()), ..options(&dir) };
        assert_eq!(PipelineConfig::resolve(opts), Err(ConfigError::ConflictingModes));

        let opts = PipelineOptions {
            register: false,
            transform: Some("missing.txt".into()),
            ..options(&dir)
        };
        assert!(matches!(PipelineConfig::resolve(opts), Err(ConfigError::TransformNotFound(_))));
    }

    #[test]
    fn test_method_options() {
        let dir = workspace();
        let opts = PipelineOptions {
            registration_method: Some("mean-squared-difference".into()),
            transform_type: Some("translation".into()),
            iterations: Some(12),
            learning_rate: Some(0.25),
            ..options(&dir)
        };
        let config = PipelineConfig::resolve(opts).unwrap();
        let expected = MethodConfig::new()
            .with_metric(MetricKind::MeanSquares)
            .with_transform(TransformKind::Translation)
            .with_iterations(12)
            .with_learning_rate(0.25);
        assert_eq!(config.mode(), &AlignMode::Register(expected));

        let opts = PipelineOptions { registration_method: Some("mattes".into()), ..options(&dir) };
        assert!(matches!(
            PipelineConfig::resolve(opts),
            Err(ConfigError::InvalidValue { name: "registration_method", .. })
        ));

        let opts = PipelineOptions { learning_rate: Some(0.0), ..options(&dir) };
        assert!(matches!(PipelineConfig::resolve(opts), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_degradation_options() {
        let dir = workspace();
        let opts = PipelineOptions {
            dilation_size: 2,
            gaussian_variance: 1.5,
            mean_kernel: 1,
            use_internal_type: true,
            threshold: 10.0,
            normalize: true,
            ..options(&dir)
        };
        let config = PipelineConfig::resolve(opts).unwrap();
        let expected = DegradationConfig::new()
            .with_dilation(2)
            .with_gaussian_variance(1.5)
            .with_mean_kernel(1)
            .with_cast(PixelType::Float32)
            .with_threshold(10.0)
            .with_normalize(true);
        assert_eq!(config.degradation(), &expected);

        // The cast target only matters when the cast is enabled.
        let opts = PipelineOptions { image_type: Some("uint16".into()), ..options(&dir) };
        assert_eq!(PipelineConfig::resolve(opts).unwrap().degradation().cast_type, None);

        let opts = PipelineOptions { gaussian_variance: -1.0, ..options(&dir) };
        assert!(matches!(
            PipelineConfig::resolve(opts),
            Err(ConfigError::InvalidValue { name: "gaussian_variance", .. })
        ));
    }

    #[test]
    fn test_bad_working_directory() {
        let dir = workspace();
        let opts = PipelineOptions {
            working_directory: Some(dir.path().join("nowhere")),
            ..options(&dir)
        };
        assert!(matches!(PipelineConfig::resolve(opts), Err(ConfigError::WorkingDirectory { .. })));
    }
}
