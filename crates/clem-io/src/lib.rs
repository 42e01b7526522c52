//! File adapters: grayscale TIFF and NIfTI images, RGB TIFF composites and
//! ITK text transform files.

pub mod nifti_io;
pub mod tiff_io;
pub mod transform_io;
mod sample;

use anyhow::{bail, Result};
use burn::tensor::backend::Backend;
use clem_core::image::{ColorImage, Image};
use std::path::Path;

pub use nifti_io::{read_nifti, write_nifti};
pub use tiff_io::{read_tiff, write_color_tiff, write_tiff};
pub use transform_io::{read_transform, write_transform};

/// On-disk image formats recognised by file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Tiff,
    Nifti,
}

impl ImageFormat {
    /// Detect the format from the file name (`.tif`, `.tiff`, `.nii`,
    /// `.nii.gz`; case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".tif") || name.ends_with(".tiff") {
            Some(ImageFormat::Tiff)
        } else if name.ends_with(".nii") || name.ends_with(".nii.gz") {
            Some(ImageFormat::Nifti)
        } else {
            None
        }
    }
}

/// Read a 2D grayscale image, choosing the reader by extension.
pub fn read_image<B: Backend, P: AsRef<Path>>(path: P, device: &B::Device) -> Result<Image<B, 2>> {
    let path = path.as_ref();
    match ImageFormat::from_path(path) {
        Some(ImageFormat::Tiff) => read_tiff(path, device),
        Some(ImageFormat::Nifti) => read_nifti(path, device),
        None => bail!("Unrecognised image format: {}", path.display()),
    }
}

/// Write a 2D grayscale image, choosing the writer by extension.
pub fn write_image<B: Backend, P: AsRef<Path>>(path: P, image: &Image<B, 2>) -> Result<()> {
    let path = path.as_ref();
    match ImageFormat::from_path(path) {
        Some(ImageFormat::Tiff) => write_tiff(path, image),
        Some(ImageFormat::Nifti) => write_nifti(path, image),
        None => bail!("Unrecognised image format: {}", path.display()),
    }
}

/// Write a color image. Only TIFF can hold interleaved RGB.
pub fn write_color_image<B: Backend, P: AsRef<Path>>(path: P, image: &ColorImage<B, 2>) -> Result<()> {
    let path = path.as_ref();
    match ImageFormat::from_path(path) {
        Some(ImageFormat::Tiff) => write_color_tiff(path, image),
        _ => bail!("Color images can only be written as TIFF: {}", path.display()),
    }
}
