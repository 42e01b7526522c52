//! A 100x100 synthetic pair whose moving image is shifted by (5, 5).

use burn_ndarray::NdArray;
use clem_core::filter::resample;
use clem_core::image::{Image, PixelType};
use clem_core::spatial::{Direction2, Point2, Spacing2};
use clem_core::transform::{SpatialTransform, TransformKind};
use clem_registration::{GradientRegistrationEngine, MethodConfig, MetricKind, RegistrationEngine};

type B = NdArray<f32>;

const SIZE: usize = 100;

/// Anisotropic Gaussian so a rotation would change the overlap.
fn blob(center: [f32; 2]) -> Image<B, 2> {
    let device: burn_ndarray::NdArrayDevice = Default::default();
    let (sx, sy) = (12.0f32, 6.0f32);
    let mut data = Vec::with_capacity(SIZE * SIZE);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let dx = (x as f32 - center[0]) / sx;
            let dy = (y as f32 - center[1]) / sy;
            data.push((-(dx * dx + dy * dy) / 2.0).exp());
        }
    }
    Image::from_values(
        data,
        [SIZE, SIZE],
        Point2::origin(),
        Spacing2::uniform(1.0),
        Direction2::identity(),
        PixelType::Float32,
        &Default::default(),
    )
    .unwrap()
}

fn pair() -> (Image<B, 2>, Image<B, 2>) {
    (blob([45.0, 45.0]), blob([50.0, 50.0]))
}

fn assert_aligned(fixed: &Image<B, 2>, moving: &Image<B, 2>, transform: &SpatialTransform) {
    let resampled = resample(moving, transform, Some(fixed));
    assert!(resampled.same_geometry(fixed));
    let worst = resampled
        .to_values()
        .iter()
        .zip(fixed.to_values())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f32, f32::max);
    assert!(worst < 0.1, "largest residual {}", worst);
}

#[test]
fn test_translation_recovers_shift() {
    let (fixed, moving) = pair();
    let method = MethodConfig::new().with_transform(TransformKind::Translation);
    let t = GradientRegistrationEngine::new().estimate(&fixed, &moving, &method).unwrap();

    assert_eq!(t.kind(), TransformKind::Translation);
    let offset = t.translation();
    assert!((offset[0] - 5.0).abs() < 0.5, "tx = {}", offset[0]);
    assert!((offset[1] - 5.0).abs() < 0.5, "ty = {}", offset[1]);
    assert_aligned(&fixed, &moving, &t);
}

#[test]
fn test_translation_with_mean_squares() {
    let (fixed, moving) = pair();
    let method = MethodConfig::new()
        .with_transform(TransformKind::Translation)
        .with_metric(MetricKind::MeanSquares);
    let t = GradientRegistrationEngine::new().estimate(&fixed, &moving, &method).unwrap();

    let offset = t.translation();
    assert!((offset[0] - 5.0).abs() < 0.5, "tx = {}", offset[0]);
    assert!((offset[1] - 5.0).abs() < 0.5, "ty = {}", offset[1]);
}

#[test]
fn test_rigid_recovers_shift_without_rotation() {
    let (fixed, moving) = pair();
    let t = GradientRegistrationEngine::new()
        .estimate(&fixed, &moving, &MethodConfig::default())
        .unwrap();

    assert_eq!(t.kind(), TransformKind::Euler2D);
    assert_eq!(t.fixed_parameters(), &[49.5, 49.5]);
    let angle = t.angle().unwrap_or(f64::NAN);
    assert!(angle.abs() < 0.02, "angle = {}", angle);
    let offset = t.translation();
    assert!((offset[0] - 5.0).abs() < 0.5, "tx = {}", offset[0]);
    assert!((offset[1] - 5.0).abs() < 0.5, "ty = {}", offset[1]);
    assert_aligned(&fixed, &moving, &t);
}
