//! Channel composition into color images.

use burn::tensor::backend::Backend;

use crate::error::{FilterError, Result};
use crate::filter::intensity::cast;
use crate::image::{ColorImage, Image, PixelType};

fn check_sizes<B: Backend, const D: usize>(red: &Image<B, D>, others: &[&Image<B, D>]) -> Result<()> {
    for other in others {
        if other.size() != red.size() {
            return Err(FilterError::geometry_mismatch(format!(
                "channel size {:?} does not match red channel size {:?}",
                other.size(),
                red.size()
            )));
        }
    }
    Ok(())
}

fn assemble<B: Backend, const D: usize>(
    red: &Image<B, D>,
    green: &Image<B, D>,
    blue: Option<&Image<B, D>>,
    pixel_type: PixelType,
) -> Result<ColorImage<B, D>> {
    let mut others = vec![green];
    others.extend(blue);
    check_sizes(red, &others)?;

    let red = cast(red, pixel_type);
    let green = cast(green, pixel_type);
    // Missing blue channel: zeros on the red channel's grid.
    let blue = match blue {
        Some(blue) => cast(blue, pixel_type),
        None => red.with_data(red.data().zeros_like()),
    };
    ColorImage::new(red, green, blue)
}

/// Compose an 8-bit RGB image; every channel is cast to `UInt8`.
pub fn compose_rgb<B: Backend, const D: usize>(
    red: &Image<B, D>,
    green: &Image<B, D>,
    blue: Option<&Image<B, D>>,
) -> Result<ColorImage<B, D>> {
    assemble(red, green, blue, PixelType::UInt8)
}

/// Compose an RGB image keeping the channels' common pixel type, or
/// `Float32` when they differ.
pub fn compose<B: Backend, const D: usize>(
    red: &Image<B, D>,
    green: &Image<B, D>,
    blue: Option<&Image<B, D>>,
) -> Result<ColorImage<B, D>> {
    let common = red.pixel_type();
    let same = green.pixel_type() == common && blue.map_or(true, |b| b.pixel_type() == common);
    let pixel_type = if same { common } else { PixelType::Float32 };
    assemble(red, green, blue, pixel_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use crate::spatial::{Direction2, Point2, Spacing2};

    type TestBackend = NdArray<f32>;

    fn image(values: Vec<f32>, shape: [usize; 2], pixel_type: PixelType, origin: [f64; 2]) -> Image<TestBackend, 2> {
        let device = Default::default();
        Image::from_values(
            values,
            shape,
            Point2::new(origin),
            Spacing2::uniform(0.02),
            Direction2::identity(),
            pixel_type,
            &device,
        )
        .unwrap()
    }

    #[test]
    fn test_compose_rgb_zero_blue_with_red_geometry() {
        let red = image(vec![1.0, 300.0, 3.0, 4.0], [2, 2], PixelType::UInt16, [5.0, 6.0]);
        let green = image(vec![0.5, 1.5, 2.5, -3.0], [2, 2], PixelType::Float32, [0.0, 0.0]);
        let rgb = compose_rgb(&red, &green, None).unwrap();

        assert_eq!(rgb.pixel_type(), PixelType::UInt8);
        assert!(rgb.blue().to_values().iter().all(|v| *v == 0.0));
        assert!(rgb.blue().same_geometry(rgb.red()));
        assert_eq!(rgb.blue().origin(), red.origin());
        assert_eq!(rgb.red().to_values(), vec![1.0, 255.0, 3.0, 4.0]);
        assert_eq!(rgb.green().to_values()[3], 0.0);
    }

    #[test]
    fn test_compose_keeps_common_type() {
        let red = image(vec![1000.0; 4], [2, 2], PixelType::UInt16, [0.0, 0.0]);
        let green = image(vec![2000.0; 4], [2, 2], PixelType::UInt16, [0.0, 0.0]);
        let rgb = compose(&red, &green, None).unwrap();
        assert_eq!(rgb.pixel_type(), PixelType::UInt16);
        assert_eq!(rgb.green().to_values(), vec![2000.0; 4]);

        let mixed = image(vec![0.5; 4], [2, 2], PixelType::Float64, [0.0, 0.0]);
        assert_eq!(compose(&red, &mixed, None).unwrap().pixel_type(), PixelType::Float32);
    }

    #[test]
    fn test_compose_rejects_size_mismatch() {
        let red = image(vec![0.0; 4], [2, 2], PixelType::UInt8, [0.0, 0.0]);
        let green = image(vec![0.0; 6], [2, 3], PixelType::UInt8, [0.0, 0.0]);
        assert!(matches!(compose_rgb(&red, &green, None), Err(FilterError::GeometryMismatch(_))));
    }
}
