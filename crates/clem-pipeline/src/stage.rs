//! Degradation stages applied to the working copies before alignment.

use burn::tensor::backend::Backend;
use clem_core::filter::{blur, cast, dilate, mean, normalize, rescale_intensity, threshold, ThresholdMode};
use clem_core::{FilterError, Image, PixelType};

use crate::config::DegradationConfig;
use crate::error::{PipelineError, Result};

/// Fixed and moving working images.
#[derive(Debug, Clone)]
pub struct WorkingPair<B: Backend> {
    pub fixed: Image<B, 2>,
    pub moving: Image<B, 2>,
}

impl<B: Backend> WorkingPair<B> {
    pub fn new(fixed: Image<B, 2>, moving: Image<B, 2>) -> Self {
        Self { fixed, moving }
    }

    fn map_both<F>(self, f: F) -> std::result::Result<Self, FilterError>
    where
        F: Fn(&Image<B, 2>) -> std::result::Result<Image<B, 2>, FilterError>,
    {
        Ok(Self {
            fixed: f(&self.fixed)?,
            moving: f(&self.moving)?,
        })
    }
}

type StageFn<B> = fn(&DegradationConfig, WorkingPair<B>) -> std::result::Result<WorkingPair<B>, FilterError>;

/// One step of the degradation chain.
pub struct Stage<B: Backend> {
    pub name: &'static str,
    /// Whether the stage runs for a configuration.
    pub enabled: fn(&DegradationConfig) -> bool,
    pub apply: StageFn<B>,
}

impl<B: Backend> std::fmt::Debug for Stage<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage").field("name", &self.name).finish()
    }
}

fn as_float<B: Backend>(image: &Image<B, 2>) -> Image<B, 2> {
    if image.pixel_type().is_float() {
        image.clone()
    } else {
        cast(image, PixelType::Float32)
    }
}

/// The stages in execution order.
pub fn stages<B: Backend>() -> Vec<Stage<B>> {
    vec![
        Stage {
            name: "dilate",
            enabled: |c| c.dilation_size > 0,
            apply: |c, pair| pair.map_both(|im| Ok(dilate(im, c.dilation_size))),
        },
        // Only the moving image is blurred.
        Stage {
            name: "gaussian blur",
            enabled: |c| c.gaussian_variance > 0.0,
            apply: |c, pair| {
                Ok(WorkingPair {
                    moving: blur(&pair.moving, c.gaussian_variance)?,
                    fixed: pair.fixed,
                })
            },
        },
        Stage {
            name: "mean",
            enabled: |c| c.mean_kernel > 0,
            apply: |c, pair| pair.map_both(|im| Ok(mean(im, c.mean_kernel))),
        },
        Stage {
            name: "cast",
            enabled: |c| c.cast_type.is_some(),
            apply: |c, pair| match c.cast_type {
                Some(target) => pair.map_both(|im| Ok(cast(im, target))),
                None => Ok(pair),
            },
        },
        // Keeps samples in [0, cutoff] and zeroes the rest.
        Stage {
            name: "threshold",
            enabled: |c| c.threshold > 0.0,
            apply: |c, pair| pair.map_both(|im| Ok(threshold(im, c.threshold, 0.0, ThresholdMode::Below))),
        },
        Stage {
            name: "normalize",
            enabled: |c| c.normalize,
            apply: |_, pair| pair.map_both(|im| normalize(&as_float(im))),
        },
        // Toggled on its own rather than only after normalize; after
        // normalize the images are float and this stage fails.
        Stage {
            name: "rescale to full range",
            enabled: |c| c.rescale_to_full_range,
            apply: |_, pair| pair.map_both(|im| rescale_intensity(im)),
        },
    ]
}

/// Run every enabled stage over `pair` in order.
///
/// Returns the degraded pair and the names of the stages that ran.
pub fn degrade<B: Backend>(
    config: &DegradationConfig,
    pair: WorkingPair<B>,
) -> Result<(WorkingPair<B>, Vec<&'static str>)> {
    let mut pair = pair;
    let mut applied = Vec::new();
    for stage in stages::<B>() {
        if !(stage.enabled)(config) {
            tracing::debug!(stage = stage.name, "stage skipped");
            continue;
        }
        tracing::info!(stage = stage.name, "degrading working images");
        pair = (stage.apply)(config, pair).map_err(|e| PipelineError::filter(stage.name, e))?;
        applied.push(stage.name);
    }
    Ok((pair, applied))
}
