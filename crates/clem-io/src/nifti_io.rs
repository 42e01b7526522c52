use anyhow::{bail, Context, Result};
use burn::tensor::backend::Backend;
use clem_core::image::{Image, PixelType};
use clem_core::spatial::{Direction, Point, Spacing};
use nalgebra::{Matrix2, Vector2};
use ndarray::{Array2, IxDyn};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, NiftiType, ReaderOptions};
use nifti::writer::WriterOptions;
use std::path::Path;

use crate::sample::FromSample;

/// NIfTI `NIFTI_XFORM_SCANNER_ANAT`.
const XFORM_SCANNER_ANAT: i16 = 1;
/// NIfTI `NIFTI_UNITS_MM`.
const UNITS_MM: u8 = 2;

/// In-plane part of the NIfTI voxel-to-world affine, still in RAS.
struct PlaneAffine {
    matrix: Matrix2<f64>,
    offset: Vector2<f64>,
}

fn plane_affine(header: &NiftiHeader) -> PlaneAffine {
    let pixdim = |axis: usize| {
        let v = header.pixdim[axis] as f64;
        if v > 0.0 { v } else { 1.0 }
    };

    if header.sform_code > 0 {
        let (rx, ry) = (header.srow_x, header.srow_y);
        PlaneAffine {
            matrix: Matrix2::new(rx[0] as f64, rx[1] as f64, ry[0] as f64, ry[1] as f64),
            offset: Vector2::new(rx[3] as f64, ry[3] as f64),
        }
    } else if header.qform_code > 0 {
        let b = header.quatern_b as f64;
        let c = header.quatern_c as f64;
        let d = header.quatern_d as f64;
        let a = (1.0 - (b * b + c * c + d * d).min(1.0)).sqrt();

        let r11 = a * a + b * b - c * c - d * d;
        let r12 = 2.0 * (b * c - a * d);
        let r21 = 2.0 * (b * c + a * d);
        let r22 = a * a + c * c - b * b - d * d;

        let (dx, dy) = (pixdim(1), pixdim(2));
        PlaneAffine {
            matrix: Matrix2::new(r11 * dx, r12 * dy, r21 * dx, r22 * dy),
            offset: Vector2::new(header.quatern_x as f64, header.quatern_y as f64),
        }
    } else {
        // No orientation: RAS-flipped scaling so the image reads back as
        // identity direction in LPS.
        PlaneAffine {
            matrix: Matrix2::new(-pixdim(1), 0.0, 0.0, -pixdim(2)),
            offset: Vector2::zeros(),
        }
    }
}

fn pixel_type_of(header: &NiftiHeader) -> PixelType {
    match header.data_type() {
        Ok(NiftiType::Uint8) => PixelType::UInt8,
        Ok(NiftiType::Int8) => PixelType::Int8,
        Ok(NiftiType::Uint16) => PixelType::UInt16,
        Ok(NiftiType::Int16) => PixelType::Int16,
        Ok(NiftiType::Uint32) => PixelType::UInt32,
        Ok(NiftiType::Int32) => PixelType::Int32,
        Ok(NiftiType::Float32) => PixelType::Float32,
        Ok(NiftiType::Float64) => PixelType::Float64,
        other => {
            tracing::warn!(datatype = header.datatype, ?other, "unsupported NIfTI datatype, reading as float32");
            PixelType::Float32
        }
    }
}

/// Read a 2D NIfTI image (or a 3D one holding a single slice).
///
/// Geometry comes from the sform when set, else the qform, else pixdim.
/// NIfTI stores RAS world coordinates; the first two world axes are negated
/// so origin and direction come back in the LPS convention used elsewhere.
pub fn read_nifti<B: Backend, P: AsRef<Path>>(path: P, device: &B::Device) -> Result<Image<B, 2>> {
    let path = path.as_ref();
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("Failed to read NIfTI file {}", path.display()))?;
    let header = obj.header().clone();
    let pixel_type = pixel_type_of(&header);

    let PlaneAffine { matrix, offset } = plane_affine(&header);
    let lps = Matrix2::new(-1.0, 0.0, 0.0, -1.0);
    let matrix = lps * matrix;
    let offset = lps * offset;

    let spacing = Spacing::new([matrix.column(0).norm(), matrix.column(1).norm()]);
    let mut cosines = matrix;
    for axis in 0..2 {
        if spacing[axis] > 1e-12 {
            let unit = cosines.column(axis) / spacing[axis];
            cosines.set_column(axis, &unit);
        } else {
            bail!("NIfTI file {} has a degenerate axis {}", path.display(), axis);
        }
    }
    let direction = Direction(cosines);
    let origin = Point::new([offset[0], offset[1]]);

    let volume = obj
        .into_volume()
        .into_ndarray::<f32>()
        .context("Failed to convert NIfTI volume to ndarray")?;
    let dims = volume.shape().to_vec();
    let (nx, ny) = match dims.as_slice() {
        [nx, ny] => (*nx, *ny),
        [nx, ny, 1] => (*nx, *ny),
        other => bail!("Expected a 2D NIfTI image or a single slice, found shape {:?}", other),
    };

    // NIfTI indexes [x, y(, z)]; the tensor is row-major [y, x].
    let mut values = Vec::with_capacity(nx * ny);
    for y in 0..ny {
        for x in 0..nx {
            let index = if dims.len() == 2 { IxDyn(&[x, y]) } else { IxDyn(&[x, y, 0]) };
            values.push(volume[index]);
        }
    }

    tracing::debug!(path = %path.display(), nx, ny, %pixel_type, ?spacing, "read NIfTI");
    Image::from_values(values, [ny, nx], origin, spacing, direction, pixel_type, device)
        .context("Failed to build image from NIfTI samples")
}

fn header_for<B: Backend>(image: &Image<B, 2>) -> NiftiHeader {
    let spacing = image.spacing();
    let origin = image.origin();
    let direction = image.direction();

    // LPS -> RAS: negate the first two world rows.
    let column = |row: usize, axis: usize| -(direction[(row, axis)] * spacing[axis]) as f32;

    let mut header = NiftiHeader::default();
    header.pixdim = [1.0, spacing[0] as f32, spacing[1] as f32, 1.0, 1.0, 1.0, 1.0, 1.0];
    header.xyzt_units = UNITS_MM;
    header.qform_code = 0;
    header.sform_code = XFORM_SCANNER_ANAT;
    header.srow_x = [column(0, 0), column(0, 1), 0.0, -origin[0] as f32];
    header.srow_y = [column(1, 0), column(1, 1), 0.0, -origin[1] as f32];
    header.srow_z = [0.0, 0.0, 1.0, 0.0];
    header
}

macro_rules! write_typed {
    ($ty:ty, $path:expr, $header:expr, $values:expr, $nx:expr, $ny:expr) => {{
        let array: Array2<$ty> =
            Array2::from_shape_fn(($nx, $ny), |(x, y)| <$ty>::from_sample($values[y * $nx + x]));
        WriterOptions::new($path)
            .reference_header($header)
            .write_nifti(&array)
            .with_context(|| format!("Failed to write NIfTI file {}", $path.display()))?;
    }};
}

/// Write a 2D image as NIfTI, storing samples in the image's pixel type and
/// geometry in the sform.
pub fn write_nifti<B: Backend, P: AsRef<Path>>(path: P, image: &Image<B, 2>) -> Result<()> {
    let path = path.as_ref();
    let [nx, ny] = image.size();
    let values = image.to_values();
    let header = header_for(image);

    match image.pixel_type() {
        PixelType::UInt8 => write_typed!(u8, path, &header, values, nx, ny),
        PixelType::Int8 => write_typed!(i8, path, &header, values, nx, ny),
        PixelType::UInt16 => write_typed!(u16, path, &header, values, nx, ny),
        PixelType::Int16 => write_typed!(i16, path, &header, values, nx, ny),
        PixelType::UInt32 => write_typed!(u32, path, &header, values, nx, ny),
        PixelType::Int32 => write_typed!(i32, path, &header, values, nx, ny),
        PixelType::Float32 => write_typed!(f32, path, &header, values, nx, ny),
        PixelType::Float64 => write_typed!(f64, path, &header, values, nx, ny),
    }

    tracing::debug!(path = %path.display(), nx, ny, pixel_type = %image.pixel_type(), "wrote NIfTI");
    Ok(())
}
