//! Resample image filter.
//!
//! Resamples an image onto a reference grid through a transform and an
//! interpolator.

use std::marker::PhantomData;

use burn::tensor::{Shape, Tensor};
use burn::tensor::backend::Backend;

use crate::image::{generate_grid, Image};
use crate::interpolation::{Interpolator, LinearInterpolator};
use crate::transform::Transform;

/// Resample image filter.
///
/// For each sample of the reference grid, the transform maps its physical
/// point into the input's physical space, where the input is interpolated.
/// The transform therefore maps Output Space -> Input Space, which is the
/// direction a registration transform (fixed -> moving) already has.
///
/// Samples whose continuous index falls outside `[-0.5, size - 0.5]` on any
/// axis of the input receive the default pixel value. The result carries
/// the input's pixel type and its values are conformed to it.
pub struct ResampleImageFilter<B, T, I, const D: usize>
where
    B: Backend,
    T: Transform<B, D>,
    I: Interpolator<B>,
{
    reference: Image<B, D>,
    transform: T,
    interpolator: I,
    default_pixel_value: f64,
    _phantom: PhantomData<B>,
}

impl<B, T, I, const D: usize> ResampleImageFilter<B, T, I, D>
where
    B: Backend,
    T: Transform<B, D>,
    I: Interpolator<B>,
{
    /// Create from a reference image whose size, origin, spacing and
    /// direction define the output grid.
    pub fn new_from_reference(reference: &Image<B, D>, transform: T, interpolator: I) -> Self {
        Self {
            reference: reference.clone(),
            transform,
            interpolator,
            default_pixel_value: 0.0,
            _phantom: PhantomData,
        }
    }

    /// Set default pixel value for outside the field of view.
    pub fn with_default_pixel_value(mut self, value: f64) -> Self {
        self.default_pixel_value = value;
        self
    }

    /// Apply filter to an input image.
    pub fn apply(&self, input: &Image<B, D>) -> Image<B, D> {
        let device = input.device();
        let shape = self.reference.shape();
        tracing::debug!(?shape, input = ?input.shape(), "resampling");

        let output_indices = generate_grid::<B, D>(shape, &device);
        let output_points = self.reference.index_to_world_tensor(output_indices);
        let input_points = self.transform.transform_points(output_points);
        let input_indices = input.world_to_index_tensor(input_points);

        let inside = inside_mask(&input_indices, input.size());
        let sampled = self.interpolator.interpolate(input.data(), input_indices);
        let values = sampled * inside.clone()
            + (inside.neg() + 1.0) * self.default_pixel_value;

        let data = input
            .pixel_type()
            .conform_tensor(values.reshape(Shape::new(shape)));

        Image::new(
            data,
            *self.reference.origin(),
            *self.reference.spacing(),
            *self.reference.direction(),
            input.pixel_type(),
        )
    }
}

/// `1.0` where every continuous index of `indices` (`[N, D]`, fastest axis
/// first) lies in `[-0.5, size - 0.5]`, else `0.0`.
pub fn inside_mask<B: Backend, const D: usize>(indices: &Tensor<B, 2>, size: [usize; D]) -> Tensor<B, 1> {
    let [n, _] = indices.dims();
    let mut mask = Tensor::<B, 1>::ones([n], &indices.device());
    for (k, &extent) in size.iter().enumerate() {
        let coord = indices.clone().narrow(1, k, 1).squeeze::<1>(1);
        let above = coord.clone().greater_equal_elem(-0.5).float();
        let below = coord.lower_equal_elem(extent as f64 - 0.5).float();
        mask = mask * above * below;
    }
    mask
}

/// Resample `image` through `transform` with linear interpolation.
///
/// The output grid is `reference`'s, or the input's own grid when `None`.
pub fn resample<B, T>(image: &Image<B, 2>, transform: &T, reference: Option<&Image<B, 2>>) -> Image<B, 2>
where
    B: Backend,
    T: Transform<B, 2>,
{
    let reference = reference.unwrap_or(image);
    ResampleImageFilter::new_from_reference(reference, transform, LinearInterpolator::new()).apply(image)
}
