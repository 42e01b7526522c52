//! Trainable 2D affine transform.

use burn::module::{Module, Param};
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use nalgebra::Matrix2;

use super::trait_::Transform;
use super::{tensor_values, vec2_tensor, SpatialTransform};
use crate::spatial::{Point, Vector};

/// General affine transform with a fixed center:
/// `T(x) = A(x - c) + c + t`
///
/// where:
/// * A is a 2×2 matrix (rotation, scale, shear)
/// * t is the translation vector
/// * c is the fixed centre
///
/// The matrix parameter is stored as `A * matrix_scale`. With the scale set
/// to the image radius a unit step of the stored entries moves the image
/// border by about one physical unit, like a step of the translation.
#[derive(Module, Debug)]
pub struct AffineTransform<B: Backend> {
    matrix: Param<Tensor<B, 2>>,
    translation: Param<Tensor<B, 1>>,
    center: Tensor<B, 1>,
    matrix_scale: Tensor<B, 1>,
}

impl<B: Backend> AffineTransform<B> {
    pub fn new(matrix: Tensor<B, 2>, translation: Tensor<B, 1>, center: Tensor<B, 1>) -> Self {
        let device = matrix.device();
        Self {
            matrix: Param::from_tensor(matrix),
            translation: Param::from_tensor(translation),
            center,
            matrix_scale: Tensor::ones([1], &device),
        }
    }

    /// Identity matrix, zero translation, centred at `center`.
    ///
    /// A non-positive `matrix_scale` falls back to 1.
    pub fn identity(center: Point<2>, matrix_scale: f64, device: &B::Device) -> Self {
        let matrix_scale = if matrix_scale > 0.0 { matrix_scale } else { 1.0 };
        Self {
            matrix: Param::from_tensor(Tensor::<B, 2>::eye(2, device) * matrix_scale),
            translation: Param::from_tensor(Tensor::<B, 1>::zeros([2], device)),
            center: vec2_tensor([center[0], center[1]], device),
            matrix_scale: Tensor::from_floats([matrix_scale as f32], device),
        }
    }

    pub fn matrix(&self) -> Tensor<B, 2> {
        self.matrix.val() / self.matrix_scale.clone().reshape([1, 1])
    }

    pub fn translation(&self) -> Tensor<B, 1> {
        self.translation.val()
    }

    pub fn center(&self) -> Tensor<B, 1> {
        self.center.clone()
    }

    pub fn to_spatial(&self) -> SpatialTransform {
        let a = tensor_values(self.matrix());
        let t = tensor_values(self.translation());
        let c = tensor_values(self.center());
        SpatialTransform::affine(
            Matrix2::new(a[0], a[1], a[2], a[3]),
            Vector::new([t[0], t[1]]),
            Point::new([c[0], c[1]]),
        )
    }
}

impl<B: Backend> Transform<B, 2> for AffineTransform<B> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        // Row vectors: y = (x - c) @ A^T + c + t
        let c = self.center.clone().reshape([1, 2]);
        let t = self.translation.val().reshape([1, 2]);
        (points - c.clone()).matmul(self.matrix().transpose()) + c + t
    }
}
