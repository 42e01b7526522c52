use std::marker::PhantomData;

use burn::tensor::backend::Backend;
use burn::tensor::module::conv1d;
use burn::tensor::ops::ConvOptions;
use burn::tensor::{Shape, Tensor};

use crate::error::{FilterError, Result};
use crate::image::Image;
use crate::spatial::Spacing;

/// Discrete Gaussian smoothing filter.
///
/// The variance is given in physical units; the per-axis standard deviation
/// in pixels is `sqrt(variance) / spacing`. Smoothing runs as one separable
/// 1D convolution per axis with edge samples replicated at the border.
pub struct GaussianFilter<B: Backend> {
    variance: f64,
    max_kernel_width: usize,
    _b: PhantomData<B>,
}

impl<B: Backend> GaussianFilter<B> {
    /// Create a new Gaussian filter.
    ///
    /// # Arguments
    /// * `variance` - Gaussian variance in physical units squared
    pub fn new(variance: f64) -> Self {
        Self {
            variance,
            max_kernel_width: 32,
            _b: PhantomData,
        }
    }

    /// Set the maximum kernel width (radius * 2 + 1).
    pub fn with_max_kernel_width(mut self, width: usize) -> Self {
        self.max_kernel_width = width.max(1);
        self
    }

    /// Apply the filter to an image.
    pub fn apply<const D: usize>(&self, image: &Image<B, D>) -> Result<Image<B, D>> {
        if !self.variance.is_finite() || self.variance < 0.0 {
            return Err(FilterError::invalid_parameter(
                "variance",
                format!("must be a non-negative number, got {}", self.variance),
            ));
        }
        if self.variance == 0.0 {
            return Ok(image.clone());
        }

        let data = self.apply_tensor(image.data().clone(), image.spacing());
        Ok(image.with_data(image.pixel_type().conform_tensor(data)))
    }

    /// Smooth a tensor laid out slowest axis first, using `spacing`
    /// (fastest axis first) to size the kernels.
    pub fn apply_tensor<const D: usize>(&self, input: Tensor<B, D>, spacing: &Spacing<D>) -> Tensor<B, D> {
        let sigma = self.variance.sqrt();
        let mut data = input;

        for axis in 0..D {
            let pixel_sigma = sigma / spacing[D - 1 - axis];
            if pixel_sigma <= 1e-6 {
                continue;
            }
            let radius = (3.0 * pixel_sigma).ceil() as usize;
            let width = (2 * radius + 1).min(self.max_kernel_width);
            let radius = (width - 1) / 2;
            if radius == 0 {
                continue;
            }

            tracing::debug!(axis, pixel_sigma, width = 2 * radius + 1, "gaussian kernel");
            let kernel = gaussian_kernel(pixel_sigma, radius);
            data = convolve_axis(data, &kernel, axis);
        }
        data
    }
}

/// Normalised sampled Gaussian of `2 * radius + 1` taps.
fn gaussian_kernel(sigma: f64, radius: usize) -> Vec<f32> {
    let two_sigma2 = 2.0 * sigma * sigma;
    let taps: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-x * x / two_sigma2).exp()
        })
        .collect();
    let sum: f64 = taps.iter().sum();
    taps.into_iter().map(|v| (v / sum) as f32).collect()
}

/// Convolve along one tensor axis, replicating edge samples.
pub(crate) fn convolve_axis<B: Backend, const D: usize>(input: Tensor<B, D>, kernel: &[f32], axis: usize) -> Tensor<B, D> {
    let device = input.device();
    let radius = kernel.len() / 2;

    // Bring the target axis last and fold the rest into the batch.
    let swapped = input.swap_dims(axis, D - 1);
    let swapped_dims: [usize; D] = swapped.dims();
    let length = swapped_dims[D - 1];
    let batch = swapped_dims.iter().product::<usize>() / length;
    let rows = swapped.reshape([batch, 1, length]);

    let first = rows.clone().narrow(2, 0, 1).repeat(&[1, 1, radius]);
    let last = rows.clone().narrow(2, length - 1, 1).repeat(&[1, 1, radius]);
    let padded = Tensor::cat(vec![first, rows, last], 2);

    let weights = Tensor::<B, 1>::from_floats(kernel, &device).reshape([1, 1, kernel.len()]);
    let smoothed = conv1d(padded, weights, None, ConvOptions::new([1], [0], [1], 1));

    smoothed
        .reshape(Shape::new(swapped_dims))
        .swap_dims(axis, D - 1)
}

/// Discrete Gaussian blur with `variance` in physical units.
pub fn blur<B: Backend, const D: usize>(image: &Image<B, D>, variance: f64) -> Result<Image<B, D>> {
    GaussianFilter::new(variance).apply(image)
}
