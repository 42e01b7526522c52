//! Similarity metrics over the overlap of two images.

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use clem_core::filter::inside_mask;
use clem_core::image::{generate_grid, Image};
use clem_core::interpolation::{Interpolator, LinearInterpolator};
use clem_core::transform::Transform;

/// Dissimilarity between a fixed image and a transformed moving image.
///
/// `forward` returns a `[1]` tensor that is lower for better alignment and
/// differentiable with respect to the transform parameters.
pub trait Metric<B: Backend, const D: usize> {
    /// `transform` maps fixed physical points to moving physical points.
    fn forward(
        &self,
        fixed: &Image<B, D>,
        moving: &Image<B, D>,
        transform: &impl Transform<B, D>,
    ) -> Tensor<B, 1>;

    /// Name used on the command line and in output file names.
    fn name(&self) -> &'static str;
}

/// Fixed samples, moving samples at the mapped points and a validity mask,
/// all `[N]` over the fixed grid.
pub(crate) struct SamplePairs<B: Backend> {
    pub fixed: Tensor<B, 1>,
    pub moving: Tensor<B, 1>,
    /// `1.0` where the mapped point lies inside the moving image.
    pub mask: Tensor<B, 1>,
}

impl<B: Backend> SamplePairs<B> {
    /// Number of valid pairs, at least 1 so it can divide.
    pub fn count(&self) -> Tensor<B, 1> {
        self.mask.clone().sum().clamp_min(1.0)
    }
}

/// Map every fixed sample through `transform` and interpolate the moving
/// image there.
pub(crate) fn sample_pairs<B: Backend, const D: usize>(
    fixed: &Image<B, D>,
    moving: &Image<B, D>,
    transform: &impl Transform<B, D>,
    interpolator: &LinearInterpolator,
) -> SamplePairs<B> {
    let device = fixed.device();
    let fixed_indices = generate_grid::<B, D>(fixed.shape(), &device);
    let [n, _] = fixed_indices.dims();

    let fixed_points = fixed.index_to_world_tensor(fixed_indices);
    let moving_points = transform.transform_points(fixed_points);
    let moving_indices = moving.world_to_index_tensor(moving_points);

    let mask = inside_mask(&moving_indices, moving.size());
    let moving_values = interpolator.interpolate(moving.data(), moving_indices);
    let fixed_values = fixed.data().clone().reshape([n]);

    SamplePairs {
        fixed: fixed_values,
        moving: moving_values,
        mask,
    }
}
