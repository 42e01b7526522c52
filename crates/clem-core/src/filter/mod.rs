//! Filter library.
//!
//! Every filter borrows its input and returns a new image carrying the
//! input's metadata, except `resample`, which takes the reference grid.

pub mod gaussian;
pub mod neighborhood;
pub mod intensity;
pub mod resample;
pub mod compose;
pub mod center;

pub use gaussian::{blur, GaussianFilter};
pub use neighborhood::{dilate, mean, median};
pub use intensity::{cast, normalize, rescale_intensity, statistics, threshold, ImageStatistics, ThresholdMode};
pub use resample::{inside_mask, resample, ResampleImageFilter};
pub use compose::{compose, compose_rgb};
pub use center::{center_of, rotate_about_center};
