//! Neighbourhood filters: grayscale dilation, mean and median.
//!
//! The mean is separable and runs as one replicate-padded `conv1d` per axis,
//! like the Gaussian. Ball dilation and the median have no separable form
//! and run as plain loops over row-major `f32` samples, with offsets
//! enumerated once per call. All three are generic in the dimensionality.
//!
//! Radii larger than the image are clamped to its extent.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};

use super::gaussian::convolve_axis;
use crate::image::Image;

/// How neighbours that fall outside the image are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Border {
    /// Drop them from the neighbourhood.
    Ignore,
    /// Use the nearest edge sample instead.
    Replicate,
}

/// Largest radius that still changes the result of a box (`ball = false`)
/// or ball neighbourhood over `shape`.
///
/// A ball has to reach the far corner, so it may need the sum of the axis
/// extents rather than the longest one.
fn clamp_radius<const D: usize>(radius: usize, shape: [usize; D], ball: bool) -> usize {
    let reach = shape.iter().map(|len| len.saturating_sub(1));
    let limit = if ball {
        reach.fold(0usize, usize::saturating_add)
    } else {
        reach.max().unwrap_or(0)
    };
    radius.min(limit.max(1))
}

/// Offsets of a box (`ball = false`) or ball of the given radius, in tensor
/// axis order.
fn offsets<const D: usize>(radius: usize, ball: bool) -> Vec<[isize; D]> {
    let r = radius as isize;
    let side = 2 * radius + 1;
    let count = side.pow(D as u32);
    let mut out = Vec::with_capacity(count);
    for linear in 0..count {
        let mut offset = [0isize; D];
        let mut rest = linear;
        for axis in (0..D).rev() {
            offset[axis] = (rest % side) as isize - r;
            rest /= side;
        }
        if ball && offset.iter().map(|o| o * o).sum::<isize>() > r * r {
            continue;
        }
        out.push(offset);
    }
    out
}

/// Visit the neighbourhood of every sample and reduce it to one value.
fn neighborhood_map<const D: usize, F>(
    values: &[f32],
    shape: [usize; D],
    offsets: &[[isize; D]],
    border: Border,
    mut reduce: F,
) -> Vec<f32>
where
    F: FnMut(&mut Vec<f32>) -> f32,
{
    let mut strides = [1usize; D];
    for axis in (0..D.saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut window = Vec::with_capacity(offsets.len());
    let mut index = [0usize; D];

    for _ in 0..values.len() {
        window.clear();
        'offsets: for offset in offsets {
            let mut linear = 0usize;
            for axis in 0..D {
                let mut pos = index[axis] as isize + offset[axis];
                let last = shape[axis] as isize - 1;
                if pos < 0 || pos > last {
                    match border {
                        Border::Ignore => continue 'offsets,
                        Border::Replicate => pos = pos.clamp(0, last),
                    }
                }
                linear += pos as usize * strides[axis];
            }
            window.push(values[linear]);
        }
        out.push(reduce(&mut window));

        for axis in (0..D).rev() {
            index[axis] += 1;
            if index[axis] < shape[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
    out
}

fn rebuild<B: Backend, const D: usize>(image: &Image<B, D>, values: Vec<f32>) -> Image<B, D> {
    let data = Tensor::<B, D>::from_data(
        TensorData::new(values, Shape::new(image.shape())),
        &image.device(),
    );
    image.with_data(image.pixel_type().conform_tensor(data))
}

/// Grayscale dilation with a ball structuring element of `radius` pixels.
///
/// Neighbours outside the image are ignored.
pub fn dilate<B: Backend, const D: usize>(image: &Image<B, D>, radius: usize) -> Image<B, D> {
    if radius == 0 {
        return image.clone();
    }
    let radius = clamp_radius(radius, image.shape(), true);
    let values = neighborhood_map(
        &image.to_values(),
        image.shape(),
        &offsets::<D>(radius, true),
        Border::Ignore,
        |window| window.iter().copied().fold(f32::NEG_INFINITY, f32::max),
    );
    rebuild(image, values)
}

/// Mean over a `(2r+1)^D` box, edge samples replicated.
pub fn mean<B: Backend, const D: usize>(image: &Image<B, D>, radius: usize) -> Image<B, D> {
    if radius == 0 {
        return image.clone();
    }
    let radius = clamp_radius(radius, image.shape(), false);
    let side = 2 * radius + 1;
    let kernel = vec![1.0 / side as f32; side];
    let data = (0..D).fold(image.data().clone(), |data, axis| convolve_axis(data, &kernel, axis));
    image.with_data(image.pixel_type().conform_tensor(data))
}

/// Median over a `(2r+1)^D` box, edge samples replicated.
pub fn median<B: Backend, const D: usize>(image: &Image<B, D>, radius: usize) -> Image<B, D> {
    if radius == 0 {
        return image.clone();
    }
    let radius = clamp_radius(radius, image.shape(), false);
    let values = neighborhood_map(
        &image.to_values(),
        image.shape(),
        &offsets::<D>(radius, false),
        Border::Replicate,
        |window| {
            // The box always holds an odd number of samples.
            let mid = window.len() / 2;
            let (_, m, _) = window.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
            *m
        },
    );
    rebuild(image, values)
}
