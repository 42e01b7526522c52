//! Transform types and operations.
//!
//! [`SpatialTransform`] is the plain value handed between components and
//! written to disk. [`TranslationTransform`], [`RigidTransform`] and
//! [`AffineTransform`] are their trainable counterparts: burn modules whose
//! parameters an optimizer can update, converted to a value once done.

pub mod trait_;
pub mod spatial;
pub mod translation;
pub mod rigid;
pub mod affine;

pub use trait_::Transform;
pub use spatial::{SpatialTransform, TransformError, TransformKind};
pub use translation::TranslationTransform;
pub use rigid::RigidTransform;
pub use affine::AffineTransform;

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

/// Read a (possibly autodiff) tensor back as `f64` values.
pub(crate) fn tensor_values<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Vec<f64> {
    tensor.into_data().iter::<f32>().map(f64::from).collect()
}

/// Tensor holding a 2D point or vector.
pub(crate) fn vec2_tensor<B: Backend>(values: [f64; 2], device: &B::Device) -> Tensor<B, 1> {
    Tensor::<B, 1>::from_floats([values[0] as f32, values[1] as f32], device)
}
