//! Image type with physical metadata and coordinate transformations.
//!
//! This module provides the Image struct which represents a microscopy image
//! with tensor data and physical space metadata (origin, spacing, direction)
//! plus the nominal pixel type of its samples.

use burn::tensor::{Shape, Tensor, TensorData};
use burn::tensor::backend::Backend;

use crate::error::{FilterError, Result};
use crate::image::PixelType;
use crate::spatial::{Direction, Point, Spacing, Vector};

/// Image with physical metadata.
///
/// The tensor is stored slowest axis first (`[H, W]` for 2D). Every other
/// per-axis quantity (origin, spacing, [`Image::size`], indices and points)
/// is ordered fastest axis first (`[x, y]`).
///
/// # Examples
/// ```rust
/// use clem_core::{Image, PixelType};
/// use clem_core::spatial::{Point2, Spacing2, Direction2};
/// use burn::tensor::Tensor;
/// use burn_ndarray::NdArray;
///
/// type Backend = NdArray<f32>;
///
/// let device = Default::default();
/// let data = Tensor::<Backend, 2>::zeros([20, 30], &device);
/// let image = Image::new(
///     data,
///     Point2::new([0.0, 0.0]),
///     Spacing2::new([0.02, 0.02]),
///     Direction2::identity(),
///     PixelType::UInt16,
/// );
/// assert_eq!(image.shape(), [20, 30]);
/// assert_eq!(image.size(), [30, 20]);
/// ```
#[derive(Debug, Clone)]
pub struct Image<B: Backend, const D: usize> {
    data: Tensor<B, D>,
    origin: Point<D>,
    spacing: Spacing<D>,
    direction: Direction<D>,
    pixel_type: PixelType,
}

impl<B: Backend, const D: usize> Image<B, D> {
    /// Wrap `data` with its grid geometry.
    pub fn new(
        data: Tensor<B, D>,
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
        pixel_type: PixelType,
    ) -> Self {
        Self {
            data,
            origin,
            spacing,
            direction,
            pixel_type,
        }
    }

    /// Build an image from row-major samples.
    ///
    /// `shape` is the tensor shape (slowest axis first).
    pub fn from_values(
        values: Vec<f32>,
        shape: [usize; D],
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
        pixel_type: PixelType,
        device: &B::Device,
    ) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(FilterError::geometry_mismatch(format!(
                "{} samples supplied for shape {:?}",
                values.len(),
                shape
            )));
        }
        let data = Tensor::<B, D>::from_data(TensorData::new(values, Shape::new(shape)), device);
        Ok(Self::new(data, origin, spacing, direction, pixel_type))
    }

    pub fn data(&self) -> &Tensor<B, D> {
        &self.data
    }

    /// Consume the image and return its data tensor.
    pub fn into_data(self) -> Tensor<B, D> {
        self.data
    }

    /// Physical position of the first pixel centre.
    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    /// Physical pixel size along each axis, fastest axis first.
    pub fn spacing(&self) -> &Spacing<D> {
        &self.spacing
    }

    /// Columns are the physical directions of the index axes.
    pub fn direction(&self) -> &Direction<D> {
        &self.direction
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    /// Tensor shape, slowest axis first.
    pub fn shape(&self) -> [usize; D] {
        self.data.dims()
    }

    /// Number of samples along each axis, fastest axis first.
    pub fn size(&self) -> [usize; D] {
        let mut size = self.shape();
        size.reverse();
        size
    }

    pub fn num_pixels(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn device(&self) -> B::Device {
        self.data.device()
    }

    /// Same metadata, new samples.
    pub fn with_data(&self, data: Tensor<B, D>) -> Self {
        Self::new(data, self.origin, self.spacing, self.direction, self.pixel_type)
    }

    /// Same samples and geometry, relabelled pixel type.
    pub fn with_pixel_type(self, pixel_type: PixelType) -> Self {
        Self { pixel_type, ..self }
    }

    /// Row-major copy of the samples.
    pub fn to_values(&self) -> Vec<f32> {
        self.data.clone().into_data().iter::<f32>().collect()
    }

    /// True when both images share size, origin, spacing and direction.
    pub fn same_geometry(&self, other: &Image<B, D>) -> bool {
        self.shape() == other.shape()
            && self.origin == other.origin
            && self.spacing == other.spacing
            && self.direction == other.direction
    }

    fn inverse_direction(&self) -> Direction<D> {
        // Loaded direction matrices are orthonormal, so the transpose is the
        // inverse whenever the numeric inversion fails.
        self.direction
            .try_inverse()
            .unwrap_or_else(|| Direction(self.direction.0.transpose()))
    }

    /// Convert a continuous physical point to a continuous index.
    ///
    /// `index = (Direction^-1 * (point - origin)) / spacing`
    pub fn physical_to_index(&self, point: &Point<D>) -> Point<D> {
        let rotated = self.inverse_direction() * (*point - self.origin);
        let mut index = Point::<D>::origin();
        for i in 0..D {
            index[i] = rotated[i] / self.spacing[i];
        }
        index
    }

    /// Convert a continuous index to a physical point.
    ///
    /// `point = origin + Direction * (index * spacing)`
    pub fn index_to_physical(&self, index: &Point<D>) -> Point<D> {
        let scaled = index.coords().component_mul(&self.spacing);
        self.origin + self.direction * scaled
    }

    /// Physical location of the central sample, `(size - 1) / 2`.
    pub fn physical_center(&self) -> Point<D> {
        let size = self.size();
        let mut index = Point::<D>::origin();
        for i in 0..D {
            index[i] = (size[i] as f64 - 1.0) / 2.0;
        }
        self.index_to_physical(&index)
    }

    /// Batch transform physical points `[N, D]` to continuous indices `[N, D]`.
    pub fn world_to_index_tensor(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = points.device();
        let inv_dir = self.inverse_direction();

        // I = (P - O) @ T with T[r, c] = inv_dir[c, r] / spacing[c]
        let mut t_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                t_data.push((inv_dir[(c, r)] / self.spacing[c]) as f32);
            }
        }
        let t_tensor = Tensor::<B, 2>::from_data(TensorData::new(t_data, Shape::new([D, D])), &device);

        (points - self.origin_tensor(&device)).matmul(t_tensor)
    }

    /// Batch transform continuous indices `[N, D]` to physical points `[N, D]`.
    pub fn index_to_world_tensor(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = indices.device();

        // P = O + I @ M with M[r, c] = spacing[r] * direction[c, r]
        let mut m_data = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                m_data.push((self.spacing[r] * self.direction[(c, r)]) as f32);
            }
        }
        let m_tensor = Tensor::<B, 2>::from_data(TensorData::new(m_data, Shape::new([D, D])), &device);

        indices.matmul(m_tensor) + self.origin_tensor(&device)
    }

    fn origin_tensor(&self, device: &B::Device) -> Tensor<B, 2> {
        let origin: Vec<f32> = (0..D).map(|i| self.origin[i] as f32).collect();
        Tensor::<B, 1>::from_data(TensorData::new(origin, Shape::new([D])), device).reshape([1, D])
    }
}

impl<B: Backend> Image<B, 2> {
    /// Physical extent of the image along each axis, `spacing * size`.
    pub fn extent(&self) -> Vector<2> {
        let size = self.size();
        Vector::new([self.spacing[0] * size[0] as f64, self.spacing[1] * size[1] as f64])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type Backend = NdArray<f32>;
    type Point2 = Point<2>;
    type Spacing2 = Spacing<2>;
    type Direction2 = Direction<2>;

    fn image(origin: [f64; 2], spacing: [f64; 2]) -> Image<Backend, 2> {
        let device = Default::default();
        let data = Tensor::<Backend, 2>::zeros([8, 10], &device);
        Image::new(
            data,
            Point2::new(origin),
            Spacing2::new(spacing),
            Direction2::identity(),
            PixelType::Float32,
        )
    }

    #[test]
    fn test_shape_and_size_ordering() {
        let img = image([0.0, 0.0], [1.0, 1.0]);
        assert_eq!(img.shape(), [8, 10]);
        assert_eq!(img.size(), [10, 8]);
        assert_eq!(img.num_pixels(), 80);
        assert_eq!(img.pixel_type(), PixelType::Float32);
    }

    #[test]
    fn test_physical_index_mapping_anisotropic() {
        let img = image([10.0, 20.0], [0.5, 2.0]);

        let index = img.physical_to_index(&Point2::new([12.0, 30.0]));
        assert!((index[0] - 4.0).abs() < 1e-9);
        assert!((index[1] - 5.0).abs() < 1e-9);

        let point = img.index_to_physical(&index);
        assert!((point[0] - 12.0).abs() < 1e-9);
        assert!((point[1] - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_tensor_mapping_matches_scalar_mapping() {
        let img = image([1.0, -2.0], [0.5, 2.0]);
        let device = Default::default();
        let indices = Tensor::<Backend, 2>::from_floats([[3.0, 1.0], [0.0, 7.0]], &device);

        let world = img.index_to_world_tensor(indices.clone());
        let values: Vec<f32> = world.clone().into_data().iter::<f32>().collect();
        assert_eq!(values, vec![2.5, 0.0, 1.0, 12.0]);

        let back: Vec<f32> = img.world_to_index_tensor(world).into_data().iter::<f32>().collect();
        let expected: Vec<f32> = indices.into_data().iter::<f32>().collect();
        for (a, b) in back.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_physical_center() {
        let img = image([0.0, 0.0], [2.0, 1.0]);
        let c = img.physical_center();
        assert!((c[0] - 9.0).abs() < 1e-9);
        assert!((c[1] - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_from_values_checks_length() {
        let device = Default::default();
        let err = Image::<Backend, 2>::from_values(
            vec![0.0; 5],
            [2, 3],
            Point2::origin(),
            Spacing2::uniform(1.0),
            Direction2::identity(),
            PixelType::UInt8,
            &device,
        );
        assert!(matches!(err, Err(FilterError::GeometryMismatch(_))));

        let ok = Image::<Backend, 2>::from_values(
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            [2, 3],
            Point2::origin(),
            Spacing2::uniform(1.0),
            Direction2::identity(),
            PixelType::UInt8,
            &device,
        )
        .unwrap();
        assert_eq!(ok.size(), [3, 2]);
        assert_eq!(ok.to_values(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_same_geometry() {
        let a = image([0.0, 0.0], [1.0, 1.0]);
        let b = a.with_data(a.data().clone() + 1.0);
        let c = image([0.0, 1.0], [1.0, 1.0]);
        assert!(a.same_geometry(&b));
        assert!(!a.same_geometry(&c));
    }
}
