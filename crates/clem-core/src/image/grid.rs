use burn::tensor::{Shape, Tensor, TensorData};
use burn::tensor::backend::Backend;

/// Generate the continuous indices of every sample of a grid.
///
/// `shape` is the tensor shape (slowest axis first). The result has shape
/// `[N, D]` with one row per sample in row-major order, and each row holds
/// the index fastest axis first (`[x, y, ...]`).
pub fn generate_grid<B, const D: usize>(shape: [usize; D], device: &B::Device) -> Tensor<B, 2>
where
    B: Backend,
{
    let total: usize = shape.iter().product();
    let mut grid = Vec::with_capacity(total * D);
    let mut index = [0usize; D];

    for _ in 0..total {
        for axis in 0..D {
            grid.push(index[D - 1 - axis] as f32);
        }
        // Advance the row-major counter, last tensor axis fastest.
        for axis in (0..D).rev() {
            index[axis] += 1;
            if index[axis] < shape[axis] {
                break;
            }
            index[axis] = 0;
        }
    }

    Tensor::<B, 1>::from_data(TensorData::new(grid, Shape::new([total * D])), device)
        .reshape([total, D])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type Backend = NdArray<f32>;

    #[test]
    fn test_grid_2d_order() {
        let device = Default::default();
        let grid = generate_grid::<Backend, 2>([2, 3], &device);
        assert_eq!(grid.dims(), [6, 2]);
        let values: Vec<f32> = grid.into_data().iter::<f32>().collect();
        assert_eq!(
            values,
            vec![0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0]
        );
    }

    #[test]
    fn test_grid_3d_last_row() {
        let device = Default::default();
        let grid = generate_grid::<Backend, 3>([2, 3, 4], &device);
        assert_eq!(grid.dims(), [24, 3]);
        let values: Vec<f32> = grid.into_data().iter::<f32>().collect();
        assert_eq!(&values[69..72], &[3.0, 2.0, 1.0]);
    }
}
