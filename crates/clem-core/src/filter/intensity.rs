//! Point-wise intensity filters and image statistics.

use burn::tensor::backend::Backend;

use crate::error::{FilterError, Result};
use crate::image::{Image, PixelType};

/// Which side of the cutoff [`threshold`] keeps.
///
/// Named after SimpleITK's `ThresholdImageFilter` usage: `Below` sets the
/// upper bound and leaves the lower one at its default of 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdMode {
    /// Keep samples in `[0, cutoff]`; replace brighter and negative ones.
    #[default]
    Below,
    /// Keep samples at or above the cutoff; replace those below it.
    Above,
}

/// Summary statistics of an image's samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageStatistics {
    pub mean: f64,
    /// Unbiased sample variance (`n - 1` denominator).
    pub variance: f64,
    pub min: f64,
    pub max: f64,
}

impl ImageStatistics {
    pub fn sigma(&self) -> f64 {
        self.variance.sqrt()
    }
}

/// Compute mean, unbiased variance, minimum and maximum.
pub fn statistics<B: Backend, const D: usize>(image: &Image<B, D>) -> ImageStatistics {
    let values = image.to_values();
    let n = values.len().max(1) as f64;

    let mut sum = 0.0f64;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in &values {
        let v = v as f64;
        sum += v;
        min = min.min(v);
        max = max.max(v);
    }
    let mean = sum / n;
    let squares: f64 = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum();
    let variance = if values.len() > 1 { squares / (n - 1.0) } else { 0.0 };

    ImageStatistics { mean, variance, min, max }
}

/// Replace the samples `mode` does not keep with `outside_value`.
///
/// The pixel type is preserved and `outside_value` is conformed to it.
pub fn threshold<B: Backend, const D: usize>(
    image: &Image<B, D>,
    cutoff: f64,
    outside_value: f64,
    mode: ThresholdMode,
) -> Image<B, D> {
    let data = image.data().clone();
    let fill = image.pixel_type().conform(outside_value);
    let kept = match mode {
        ThresholdMode::Below => {
            let negative = data.clone().lower_elem(0.0);
            let bright = data.clone().greater_elem(cutoff);
            data.mask_fill(bright, fill).mask_fill(negative, fill)
        }
        ThresholdMode::Above => {
            let dim = data.clone().lower_elem(cutoff);
            data.mask_fill(dim, fill)
        }
    };
    image.with_data(kept)
}

/// Shift and scale to zero mean and unit variance.
///
/// Only floating-point images are accepted. A constant image maps to zeros.
pub fn normalize<B: Backend, const D: usize>(image: &Image<B, D>) -> Result<Image<B, D>> {
    if !image.pixel_type().is_float() {
        return Err(FilterError::unsupported("normalize", image.pixel_type()));
    }
    let stats = statistics(image);
    let sigma = stats.sigma();
    let centered = image.data().clone() - stats.mean;
    let data = if sigma > 0.0 {
        centered / sigma
    } else {
        centered.zeros_like()
    };
    Ok(image.with_data(data))
}

/// Linearly map `[min, max]` onto the full range of the pixel type.
///
/// Only `UInt8` images are supported; any other pixel type is rejected
/// rather than passed through. A constant image maps to the range minimum.
pub fn rescale_intensity<B: Backend, const D: usize>(image: &Image<B, D>) -> Result<Image<B, D>> {
    let (out_min, out_max) = match image.pixel_type() {
        PixelType::UInt8 => (u8::MIN as f64, u8::MAX as f64),
        other => return Err(FilterError::unsupported("rescale_intensity", other)),
    };
    let stats = statistics(image);
    let span = stats.max - stats.min;
    let scale = if span > 0.0 { (out_max - out_min) / span } else { 0.0 };
    let data = (image.data().clone() - stats.min) * scale + out_min;
    Ok(image.with_data(image.pixel_type().conform_tensor(data)))
}

/// Conform samples to `target` and relabel the image.
pub fn cast<B: Backend, const D: usize>(image: &Image<B, D>, target: PixelType) -> Image<B, D> {
    if target == image.pixel_type() {
        return image.clone();
    }
    image
        .with_data(target.conform_tensor(image.data().clone()))
        .with_pixel_type(target)
}
