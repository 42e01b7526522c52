//! Trainable translation transform.

use burn::module::{Module, Param};
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

use super::trait_::Transform;
use super::{tensor_values, SpatialTransform};
use crate::spatial::Vector;

/// Translates points by a learnable offset vector.
#[derive(Module, Debug)]
pub struct TranslationTransform<B: Backend> {
    translation: Param<Tensor<B, 1>>,
}

impl<B: Backend> TranslationTransform<B> {
    /// Create a new translation transform from a `[2]` offset tensor.
    pub fn new(translation: Tensor<B, 1>) -> Self {
        Self {
            translation: Param::from_tensor(translation),
        }
    }

    pub fn identity(device: &B::Device) -> Self {
        Self::new(Tensor::<B, 1>::zeros([2], device))
    }

    pub fn translation(&self) -> Tensor<B, 1> {
        self.translation.val()
    }

    /// Snapshot the current parameters as a plain value.
    pub fn to_spatial(&self) -> SpatialTransform {
        let t = tensor_values(self.translation());
        SpatialTransform::from_translation(Vector::new([t[0], t[1]]))
    }
}

impl<B: Backend> Transform<B, 2> for TranslationTransform<B> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        points + self.translation.val().reshape([1, 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_translation_transform() {
        let device = Default::default();
        let translation = Tensor::<TestBackend, 1>::from_floats([1.0, 2.0], &device);
        let transform = TranslationTransform::<TestBackend>::new(translation);

        let points = Tensor::<TestBackend, 2>::from_floats([[0.0, 0.0], [1.0, 1.0]], &device);
        let values: Vec<f32> = transform.transform_points(points).into_data().iter::<f32>().collect();
        assert_eq!(values, vec![1.0, 2.0, 2.0, 3.0]);

        let spatial = transform.to_spatial();
        assert_eq!(spatial.parameters(), &[1.0, 2.0]);
        assert!(spatial.fixed_parameters().is_empty());
    }
}
