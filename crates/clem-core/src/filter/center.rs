//! Image centres and rotation about them.

use burn::tensor::backend::Backend;

use crate::error::{FilterError, Result};
use crate::filter::resample::resample;
use crate::image::Image;
use crate::spatial::Point;
use crate::transform::SpatialTransform;

/// Centre of an image.
///
/// The geometric centre is `spacing * size / 2` per axis. With `use_mass`
/// the intensity-weighted centroid in index space is scaled by the spacing
/// instead. Neither includes the origin.
pub fn center_of<B: Backend>(image: &Image<B, 2>, use_mass: bool) -> Result<Point<2>> {
    let spacing = image.spacing();
    if !use_mass {
        let extent = image.extent();
        return Ok(Point::new([extent[0] / 2.0, extent[1] / 2.0]));
    }

    let [width, _] = image.size();
    let mut mass = 0.0f64;
    let mut moment = [0.0f64; 2];
    for (i, &v) in image.to_values().iter().enumerate() {
        let v = v as f64;
        mass += v;
        moment[0] += v * (i % width) as f64;
        moment[1] += v * (i / width) as f64;
    }
    if mass == 0.0 || !mass.is_finite() {
        return Err(FilterError::invalid_parameter(
            "image",
            "centre of mass is undefined for an image with zero total intensity",
        ));
    }
    Ok(Point::new([
        moment[0] / mass * spacing[0],
        moment[1] / mass * spacing[1],
    ]))
}

/// Apply only the rotation part of `transform`, about the geometric centre,
/// on the image's own grid.
pub fn rotate_about_center<B: Backend>(image: &Image<B, 2>, transform: &SpatialTransform) -> Result<Image<B, 2>> {
    let center = center_of(image, false)?;
    let rotation = transform.rotation_only().with_center(center);
    Ok(resample(image, &rotation, None))
}
