//! Trainable 2D rigid transform (rotation + translation).

use burn::module::{Module, Param};
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

use super::trait_::Transform;
use super::{tensor_values, vec2_tensor, SpatialTransform};
use crate::spatial::{Point, Vector};

/// Rigid transform about a fixed centre: `T(x) = R(x - c) + c + t`.
///
/// The rotation parameter is stored as `angle * angle_scale`. Choosing the
/// scale as the image radius turns the angle into an arc length, so a
/// single learning rate suits both rotation and translation.
#[derive(Module, Debug)]
pub struct RigidTransform<B: Backend> {
    translation: Param<Tensor<B, 1>>,
    rotation: Param<Tensor<B, 1>>, // [1], scaled angle
    center: Tensor<B, 1>,
    angle_scale: Tensor<B, 1>,
}

impl<B: Backend> RigidTransform<B> {
    /// Create a rigid transform.
    ///
    /// # Arguments
    /// * `angle` - Rotation in radians
    /// * `translation` - Offset `[tx, ty]`
    /// * `center` - Fixed centre of rotation
    /// * `angle_scale` - Factor between the stored parameter and the angle
    pub fn new(
        angle: f64,
        translation: Vector<2>,
        center: Point<2>,
        angle_scale: f64,
        device: &B::Device,
    ) -> Self {
        let angle_scale = if angle_scale > 0.0 { angle_scale } else { 1.0 };
        Self {
            translation: Param::from_tensor(vec2_tensor([translation[0], translation[1]], device)),
            rotation: Param::from_tensor(Tensor::from_floats([(angle * angle_scale) as f32], device)),
            center: vec2_tensor([center[0], center[1]], device),
            angle_scale: Tensor::from_floats([angle_scale as f32], device),
        }
    }

    /// Identity rotation and translation about `center`.
    pub fn identity(center: Point<2>, angle_scale: f64, device: &B::Device) -> Self {
        Self::new(0.0, Vector::zeros(), center, angle_scale, device)
    }

    /// Rotation angle in radians, `[1]`.
    pub fn angle(&self) -> Tensor<B, 1> {
        self.rotation.val() / self.angle_scale.clone()
    }

    pub fn translation(&self) -> Tensor<B, 1> {
        self.translation.val()
    }

    pub fn center(&self) -> Tensor<B, 1> {
        self.center.clone()
    }

    pub fn to_spatial(&self) -> SpatialTransform {
        let angle = tensor_values(self.angle())[0];
        let t = tensor_values(self.translation());
        let c = tensor_values(self.center());
        SpatialTransform::euler2d(angle, Vector::new([t[0], t[1]]), Point::new([c[0], c[1]]))
    }

    /// `R^T` as a `[2, 2]` tensor, built so gradients reach the angle.
    fn rotation_transposed(&self) -> Tensor<B, 2> {
        let theta = self.angle();
        let c = theta.clone().cos();
        let s = theta.sin();

        let row1 = Tensor::cat(vec![c.clone(), s.clone()], 0).reshape([1, 2]);
        let row2 = Tensor::cat(vec![s.neg(), c], 0).reshape([1, 2]);
        Tensor::cat(vec![row1, row2], 0)
    }
}

impl<B: Backend> Transform<B, 2> for RigidTransform<B> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        // y = (x - c) @ R^T + c + t
        let c = self.center.clone().reshape([1, 2]);
        let t = self.translation.val().reshape([1, 2]);
        (points - c.clone()).matmul(self.rotation_transposed()) + c + t
    }
}
