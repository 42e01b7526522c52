//! Negative normalized cross correlation.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use clem_core::image::Image;
use clem_core::interpolation::LinearInterpolator;
use clem_core::transform::Transform;

use super::trait_::{sample_pairs, Metric};

/// `-sum(f' m') / sqrt(sum(f'^2) sum(m'^2))` with `f'`, `m'` the samples
/// minus their means, all taken over the overlap.
///
/// Invariant to linear intensity changes of either image, which suits a
/// STED/EM pair. A perfect match gives -1.
#[derive(Debug, Clone, Default)]
pub struct NormalizedCrossCorrelation {
    interpolator: LinearInterpolator,
}

impl NormalizedCrossCorrelation {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: Backend, const D: usize> Metric<B, D> for NormalizedCrossCorrelation {
    fn forward(
        &self,
        fixed: &Image<B, D>,
        moving: &Image<B, D>,
        transform: &impl Transform<B, D>,
    ) -> Tensor<B, 1> {
        let pairs = sample_pairs(fixed, moving, transform, &self.interpolator);
        let count = pairs.count();
        let mask = pairs.mask;

        let fixed_values = pairs.fixed * mask.clone();
        let moving_values = pairs.moving * mask.clone();
        let mean_f = fixed_values.clone().sum() / count.clone();
        let mean_m = moving_values.clone().sum() / count;

        // Re-mask after centering so outside samples stay at zero.
        let f_centered = (fixed_values - mean_f) * mask.clone();
        let m_centered = (moving_values - mean_m) * mask;

        let numerator = (f_centered.clone() * m_centered.clone()).sum();
        let denom_f = f_centered.powf_scalar(2.0).sum();
        let denom_m = m_centered.powf_scalar(2.0).sum();

        let epsilon = 1e-10;
        let denominator = (denom_f * denom_m).sqrt() + epsilon;

        (numerator / denominator).neg()
    }

    fn name(&self) -> &'static str {
        "correlation"
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

    fn create_test_image(data: Vec<f32>, shape: [usize; 2]) -> Image<B, 2> {
        let device = Default::default();
        Image::from_values(
            data,
            shape,
            Point2::origin(),
            Spacing2::uniform(1.0),
            Direction2::identity(),
            PixelType::Float32,
            &device,
        )
        .unwrap()
    }

    fn identity() -> SpatialTransform {
        SpatialTransform::from_translation(Vector2::zeros())
    }

    #[test]
    fn test_ncc_identical() {
        let data: Vec<f32> = (0..100).map(|x| x as f32).collect();
        let image = create_test_image(data, [10, 10]);

        let loss = NormalizedCrossCorrelation::new()
            .forward(&image, &image, &identity())
            .into_scalar();
        assert!((loss + 1.0).abs() < 1e-5, "identical images should give loss -1, got {}", loss);
    }

    #[test]
    fn test_ncc_linear_relationship() {
        let data1: Vec<f32> = (0..100).map(|x| x as f32).collect();
        let data2: Vec<f32> = data1.iter().map(|&x| 2.0 * x + 10.0).collect();

        let fixed = create_test_image(data1, [10, 10]);
        let moving = create_test_image(data2, [10, 10]);

        let loss = NormalizedCrossCorrelation::new()
            .forward(&fixed, &moving, &identity())
            .into_scalar();
        assert!((loss + 1.0).abs() < 1e-4, "linear relationship should give loss -1, got {}", loss);
    }

    #[test]
    fn test_ncc_inverse_relationship() {
        let data1: Vec<f32> = (0..100).map(|x| x as f32).collect();
        let data2: Vec<f32> = data1.iter().map(|&x| -x).collect();

        let fixed = create_test_image(data1, [10, 10]);
        let moving = create_test_image(data2, [10, 10]);

        let loss = NormalizedCrossCorrelation::new()
            .forward(&fixed, &moving, &identity())
            .into_scalar();
        assert!((loss - 1.0).abs() < 1e-4, "inverse relationship should give loss 1, got {}", loss);
    }

    #[test]
    fn test_ncc_uncorrelated() {
        let data1: Vec<f32> = (0..100).map(|x| x as f32).collect();
        let data2: Vec<f32> = (0..100).map(|x| if x % 2 == 0 { 10.0 } else { -10.0 }).collect();

        let fixed = create_test_image(data1, [1, 100]);
        let moving = create_test_image(data2, [1, 100]);

        let loss = NormalizedCrossCorrelation::new()
            .forward(&fixed, &moving, &identity())
            .into_scalar();
        assert!(loss.abs() < 0.5, "uncorrelated data should give a loss near 0, got {}", loss);
    }

    #[test]
    fn test_ncc_uses_overlap_only() {
        // A pure x-ramp shifted by one pixel still correlates perfectly on
        // the overlap once the column mapped outside is masked.
        let data: Vec<f32> = (0..100).map(|i| (i % 10) as f32).collect();
        let image = create_test_image(data, [10, 10]);
        let shift = SpatialTransform::from_translation(Vector2::new([1.0, 0.0]));

        let loss = NormalizedCrossCorrelation::new()
            .forward(&image, &image, &shift)
            .into_scalar();
        assert!((loss + 1.0).abs() < 1e-4, "got {}", loss);
    }
}
