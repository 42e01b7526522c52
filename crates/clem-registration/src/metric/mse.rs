//! Mean squares metric.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use clem_core::image::Image;
use clem_core::interpolation::LinearInterpolator;
use clem_core::transform::Transform;

use super::trait_::{sample_pairs, Metric};

/// Mean squared intensity difference:
/// `MSE = (1/N) * sum((Fixed(x) - Moving(T(x)))^2)`
///
/// Only fixed samples whose mapped point lies inside the moving image
/// contribute, and `N` counts those samples.
#[derive(Debug, Clone, Default)]
pub struct MeanSquaredError {
    interpolator: LinearInterpolator,
}

impl MeanSquaredError {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: Backend, const D: usize> Metric<B, D> for MeanSquaredError {
    fn forward(
        &self,
        fixed: &Image<B, D>,
        moving: &Image<B, D>,
        transform: &impl Transform<B, D>,
    ) -> Tensor<B, 1> {
        let pairs = sample_pairs(fixed, moving, transform, &self.interpolator);
        let count = pairs.count();
        let diff = (pairs.moving - pairs.fixed) * pairs.mask;
        diff.powf_scalar(2.0).sum() / count
    }

    fn name(&self) -> &'static str {
        "mean-squared-difference"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use clem_core::image::PixelType;
    use clem_core::spatial::{Direction2, Point2, Spacing2, Vector2};
    use clem_core::transform::SpatialTransform;

    type B = NdArray<f32>;

    fn ramp(offset: f32) -> Image<B, 2> {
        let device = Default::default();
        let values = (0..25).map(|i| (i % 5) as f32 + offset).collect();
        Image::from_values(
            values,
            [5, 5],
            Point2::origin(),
            Spacing2::uniform(1.0),
            Direction2::identity(),
            PixelType::Float32,
            &device,
        )
        .unwrap()
    }

    #[test]
    fn test_mse_identity() {
        let image = ramp(0.0);
        let transform = SpatialTransform::from_translation(Vector2::zeros());
        let loss = MeanSquaredError::new().forward(&image, &image, &transform).into_scalar();
        assert!(loss < 1e-6, "MSE should be 0 for identical images, got {}", loss);
    }

    #[test]
    fn test_mse_constant_offset() {
        let transform = SpatialTransform::from_translation(Vector2::zeros());
        let loss = MeanSquaredError::new()
            .forward(&ramp(0.0), &ramp(2.0), &transform)
            .into_scalar();
        assert!((loss - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_mse_ignores_samples_mapped_outside() {
        // Shifting by one pixel along x: the last column maps to x = 5,
        // outside [-0.5, 4.5], and is dropped. Every remaining pair differs
        // by exactly one.
        let image = ramp(0.0);
        let transform = SpatialTransform::from_translation(Vector2::new([1.0, 0.0]));
        let loss = MeanSquaredError::new().forward(&image, &image, &transform).into_scalar();
        assert!((loss - 1.0).abs() < 1e-5, "got {}", loss);
    }
}
