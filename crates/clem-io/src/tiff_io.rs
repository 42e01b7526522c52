use anyhow::{bail, Context, Result};
use burn::tensor::backend::Backend;
use clem_core::image::{ColorImage, Image, PixelType};
use clem_core::spatial::{Direction, Point, Spacing};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, Rational, TiffEncoder};
use tiff::tags::{ResolutionUnit, Tag};
use tiff::ColorType;

use crate::sample::cast_vec;

/// Denominator used to store spacing as a TIFF resolution rational.
const RESOLUTION_SCALE: u32 = 1_000_000;

/// Read a grayscale TIFF as a 2D image.
///
/// The pixel type follows the stored sample format. Spacing comes from the
/// `XResolution`/`YResolution` tags when present (converted to millimetres
/// for inch and centimetre units), otherwise it is 1.0. Origin is zero and
/// direction identity.
pub fn read_tiff<B: Backend, P: AsRef<Path>>(path: P, device: &B::Device) -> Result<Image<B, 2>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open TIFF file {}", path.display()))?;
    let mut decoder = Decoder::new(file).context("Failed to decode TIFF header")?;

    match decoder.colortype().context("Failed to read TIFF color type")? {
        ColorType::Gray(_) => {}
        other => bail!("Only grayscale TIFF images are supported, found {:?}", other),
    }

    let (width, height) = decoder.dimensions().context("Failed to read TIFF dimensions")?;
    let spacing = read_spacing(&mut decoder)?;

    let (values, pixel_type): (Vec<f32>, PixelType) = match decoder.read_image().context("Failed to read TIFF samples")? {
        DecodingResult::U8(buf) => (buf.into_iter().map(f32::from).collect(), PixelType::UInt8),
        DecodingResult::U16(buf) => (buf.into_iter().map(f32::from).collect(), PixelType::UInt16),
        DecodingResult::U32(buf) => (buf.into_iter().map(|v| v as f32).collect(), PixelType::UInt32),
        DecodingResult::I8(buf) => (buf.into_iter().map(f32::from).collect(), PixelType::Int8),
        DecodingResult::I16(buf) => (buf.into_iter().map(f32::from).collect(), PixelType::Int16),
        DecodingResult::I32(buf) => (buf.into_iter().map(|v| v as f32).collect(), PixelType::Int32),
        DecodingResult::F32(buf) => (buf, PixelType::Float32),
        DecodingResult::F64(buf) => (buf.into_iter().map(|v| v as f32).collect(), PixelType::Float64),
        _ => bail!("Unsupported TIFF sample format in {}", path.display()),
    };
    if decoder.more_images() {
        bail!(
            "TIFF {} holds more than one page; only single-plane images are supported",
            path.display()
        );
    }

    let shape = [height as usize, width as usize];
    if values.len() != shape[0] * shape[1] {
        bail!(
            "TIFF {} holds {} samples, expected {} for a single {}x{} plane",
            path.display(),
            values.len(),
            shape[0] * shape[1],
            width,
            height
        );
    }

    tracing::debug!(path = %path.display(), width, height, %pixel_type, ?spacing, "read TIFF");
    Image::from_values(
        values,
        shape,
        Point::origin(),
        spacing,
        Direction::identity(),
        pixel_type,
        device,
    )
    .context("Failed to build image from TIFF samples")
}

fn read_spacing<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Result<Spacing<2>> {
    let unit_factor = match decoder
        .find_tag(Tag::ResolutionUnit)
        .context("Failed to read TIFF resolution unit")?
        .and_then(|v| v.into_u16().ok())
    {
        Some(2) => 25.4,
        Some(3) => 10.0,
        _ => 1.0,
    };

    let mut spacing = Spacing::uniform(1.0);
    for (axis, tag) in [Tag::XResolution, Tag::YResolution].into_iter().enumerate() {
        let value = decoder.find_tag(tag).context("Failed to read TIFF resolution")?;
        if let Some(tiff::decoder::ifd::Value::Rational(n, d)) = value {
            if n > 0 && d > 0 {
                spacing[axis] = unit_factor * d as f64 / n as f64;
            }
        }
    }
    Ok(spacing)
}

fn resolution(spacing: f64) -> Rational {
    let d = (spacing * RESOLUTION_SCALE as f64).round().clamp(1.0, u32::MAX as f64) as u32;
    Rational { n: RESOLUTION_SCALE, d }
}

macro_rules! write_plane {
    ($encoder:expr, $color:ty, $width:expr, $height:expr, $spacing:expr, $samples:expr) => {{
        let mut image = $encoder
            .new_image::<$color>($width, $height)
            .context("Failed to start TIFF image")?;
        image.resolution_unit(ResolutionUnit::None);
        image.x_resolution(resolution($spacing[0]));
        image.y_resolution(resolution($spacing[1]));
        image.write_data(&$samples).context("Failed to write TIFF samples")?;
    }};
}

/// Write a 2D grayscale image as TIFF, using the sample format of its pixel
/// type. Spacing is stored in the resolution tags.
pub fn write_tiff<B: Backend, P: AsRef<Path>>(path: P, image: &Image<B, 2>) -> Result<()> {
    let path = path.as_ref();
    let [width, height] = image.size();
    let (width, height) = (width as u32, height as u32);
    let spacing = *image.spacing();
    let values = image.to_values();

    let file = File::create(path).with_context(|| format!("Failed to create TIFF file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut encoder = TiffEncoder::new(&mut writer).context("Failed to create TIFF encoder")?;

    match image.pixel_type() {
        PixelType::UInt8 => write_plane!(encoder, colortype::Gray8, width, height, spacing, cast_vec::<u8>(&values)),
        PixelType::UInt16 => write_plane!(encoder, colortype::Gray16, width, height, spacing, cast_vec::<u16>(&values)),
        PixelType::UInt32 => write_plane!(encoder, colortype::Gray32, width, height, spacing, cast_vec::<u32>(&values)),
        PixelType::Int8 => write_plane!(encoder, colortype::GrayI8, width, height, spacing, cast_vec::<i8>(&values)),
        PixelType::Int16 => write_plane!(encoder, colortype::GrayI16, width, height, spacing, cast_vec::<i16>(&values)),
        PixelType::Int32 => write_plane!(encoder, colortype::GrayI32, width, height, spacing, cast_vec::<i32>(&values)),
        PixelType::Float32 => write_plane!(encoder, colortype::Gray32Float, width, height, spacing, values),
        PixelType::Float64 => write_plane!(encoder, colortype::Gray64Float, width, height, spacing, cast_vec::<f64>(&values)),
    }

    tracing::debug!(path = %path.display(), width, height, pixel_type = %image.pixel_type(), "wrote TIFF");
    Ok(())
}

/// Write a color image as an interleaved RGB TIFF.
///
/// Unsigned types keep their width (8, 16 or 32 bit). Signed and 32-bit
/// float channels are stored as 32-bit float, 64-bit float as 64-bit float.
pub fn write_color_tiff<B: Backend, P: AsRef<Path>>(path: P, image: &ColorImage<B, 2>) -> Result<()> {
    let path = path.as_ref();
    let [width, height] = image.size();
    let (width, height) = (width as u32, height as u32);
    let spacing = *image.red().spacing();
    let values = image.to_interleaved();

    let file = File::create(path).with_context(|| format!("Failed to create TIFF file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut encoder = TiffEncoder::new(&mut writer).context("Failed to create TIFF encoder")?;

    match image.pixel_type() {
        PixelType::UInt8 => write_plane!(encoder, colortype::RGB8, width, height, spacing, cast_vec::<u8>(&values)),
        PixelType::UInt16 => write_plane!(encoder, colortype::RGB16, width, height, spacing, cast_vec::<u16>(&values)),
        PixelType::UInt32 => write_plane!(encoder, colortype::RGB32, width, height, spacing, cast_vec::<u32>(&values)),
        PixelType::Float64 => write_plane!(encoder, colortype::RGB64Float, width, height, spacing, cast_vec::<f64>(&values)),
        PixelType::Int8 | PixelType::Int16 | PixelType::Int32 | PixelType::Float32 => {
            write_plane!(encoder, colortype::RGB32Float, width, height, spacing, values)
        }
    }

    tracing::debug!(path = %path.display(), width, height, pixel_type = %image.pixel_type(), "wrote RGB TIFF");
    Ok(())
}
