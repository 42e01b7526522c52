//! Image types and operations.
//!
//! This module provides the grayscale [`Image`] with physical metadata,
//! the nominal [`PixelType`] tag and the three-channel [`ColorImage`].

pub mod image;
pub mod pixel;
pub mod color;
pub mod grid;

pub use image::Image;
pub use pixel::PixelType;
pub use color::ColorImage;
pub use grid::generate_grid;
