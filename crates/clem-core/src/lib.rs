//! Core image model and filter library for correlative microscopy
//! registration.

pub mod error;
pub mod image;
pub mod spatial;
pub mod transform;
pub mod interpolation;
pub mod filter;

pub use error::FilterError;
pub use image::{ColorImage, Image, PixelType};
pub use spatial::{Direction, Point, Spacing, Vector};
pub use transform::{SpatialTransform, TransformKind};
