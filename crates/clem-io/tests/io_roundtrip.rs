//! Files written by the adapters read back into equivalent images and
//! transforms.

use anyhow::Result;
use burn_ndarray::NdArray;
use clem_core::filter::{compose, resample};
use clem_core::spatial::{Direction2, Point2, Spacing2, Vector2};
use clem_core::{Image, PixelType, SpatialTransform};
use clem_io::{read_image, read_transform, write_color_image, write_image, write_transform};
use tempfile::tempdir;

type Backend = NdArray<f32>;

fn ramp(pixel_type: PixelType) -> Image<Backend, 2> {
    let device = Default::default();
    let (w, h) = (16usize, 12usize);
    let values = (0..w * h).map(|i| ((i % w) * 10 + (i / w)) as f32).collect();
    Image::from_values(
        values,
        [h, w],
        Point2::origin(),
        Spacing2::new([0.02, 0.02]),
        Direction2::identity(),
        pixel_type,
        &device,
    )
    .unwrap()
}

#[test]
fn test_write_image_dispatches_by_extension() -> Result<()> {
    let dir = tempdir()?;
    let image = ramp(PixelType::UInt16);
    let device = Default::default();

    for name in ["image.tif", "image.tiff", "image.nii", "image.nii.gz"] {
        let path = dir.path().join(name);
        write_image(&path, &image)?;
        let loaded = read_image::<Backend, _>(&path, &device)?;
        assert_eq!(loaded.pixel_type(), PixelType::UInt16, "{}", name);
        assert_eq!(loaded.size(), image.size(), "{}", name);
        assert_eq!(loaded.to_values(), image.to_values(), "{}", name);
        assert!((loaded.spacing()[0] - 0.02).abs() < 1e-6, "{}", name);
    }
    Ok(())
}

#[test]
fn test_unknown_extension_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    let image = ramp(PixelType::UInt8);
    let device = Default::default();

    assert!(write_image(dir.path().join("image.png"), &image).is_err());
    assert!(read_image::<Backend, _>(dir.path().join("missing.png"), &device).is_err());
    assert!(read_image::<Backend, _>(dir.path().join("missing.tif"), &device).is_err());

    let color = compose(&image, &image, None)?;
    assert!(write_color_image(dir.path().join("color.nii"), &color).is_err());
    write_color_image(dir.path().join("color.tif"), &color)?;
    Ok(())
}

#[test]
fn test_transform_file_reproduces_resampled_output() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("transform.tfm");
    let image = ramp(PixelType::Float32);
    let transform = SpatialTransform::euler2d(0.05, Vector2::new([0.013, -0.027]), Point2::new([0.15, 0.11]));

    write_transform(&path, &transform)?;
    let loaded = read_transform(&path)?;
    assert_eq!(loaded, transform);

    let direct = resample(&image, &transform, None);
    let via_file = resample(&image, &loaded, None);
    assert_eq!(direct.to_values(), via_file.to_values());
    Ok(())
}

#[test]
fn test_missing_transform_file() {
    assert!(read_transform("/nonexistent/transform.tfm").is_err());
}
