//! Linear interpolation in any dimension.

use burn::tensor::{Int, Tensor};
use burn::tensor::backend::Backend;

use super::trait_::Interpolator;

/// N-linear interpolator (bilinear in 2D, trilinear in 3D).
///
/// Neighbour indices are clamped to the grid, so queries outside the image
/// take the nearest edge value. Callers that need a fill value mask the
/// result themselves. The output is differentiable with respect to the
/// query indices.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolator;

impl LinearInterpolator {
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Interpolator<B> for LinearInterpolator {
    fn interpolate<const D: usize>(&self, data: &Tensor<B, D>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let shape: [usize; D] = data.dims();
        let [batch, _] = indices.dims();
        let device = indices.device();
        let total: usize = shape.iter().product();
        let flat = data.clone().reshape([total]);

        // Row-major stride of each tensor axis.
        let mut strides = [1usize; D];
        for axis in (0..D.saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * shape[axis + 1];
        }

        // Column k of `indices` addresses tensor axis D-1-k.
        let mut lower: Vec<Tensor<B, 1, Int>> = Vec::with_capacity(D);
        let mut upper: Vec<Tensor<B, 1, Int>> = Vec::with_capacity(D);
        let mut weights: Vec<Tensor<B, 1>> = Vec::with_capacity(D);
        for k in 0..D {
            let axis = D - 1 - k;
            let max_index = (shape[axis] - 1) as f64;
            let coord = indices.clone().narrow(1, k, 1).squeeze::<1>(1);
            let floor = coord.clone().floor();
            let stride = strides[axis] as i32;

            weights.push(coord - floor.clone());
            lower.push(floor.clone().clamp(0.0, max_index).int() * stride);
            upper.push((floor + 1.0).clamp(0.0, max_index).int() * stride);
        }

        let mut result = Tensor::<B, 1>::zeros([batch], &device);
        for corner in 0..(1usize << D) {
            let mut offset = Tensor::<B, 1, Int>::zeros([batch], &device);
            let mut weight = Tensor::<B, 1>::ones([batch], &device);
            for k in 0..D {
                if (corner >> k) & 1 == 1 {
                    offset = offset + upper[k].clone();
                    weight = weight * weights[k].clone();
                } else {
                    offset = offset + lower[k].clone();
                    weight = weight * (weights[k].clone().neg() + 1.0);
                }
            }
            result = result + flat.clone().gather(0, offset) * weight;
        }
        result
    }
}
