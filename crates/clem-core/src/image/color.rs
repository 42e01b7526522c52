//! Three-channel color images.

use burn::tensor::backend::Backend;

use crate::error::{FilterError, Result};
use crate::image::{Image, PixelType};

/// An RGB image made of three grayscale channels on the same grid.
#[derive(Debug, Clone)]
pub struct ColorImage<B: Backend, const D: usize> {
    channels: [Image<B, D>; 3],
}

impl<B: Backend, const D: usize> ColorImage<B, D> {
    /// Assemble a color image. Channels must share size and pixel type.
    pub fn new(red: Image<B, D>, green: Image<B, D>, blue: Image<B, D>) -> Result<Self> {
        for (name, channel) in [("green", &green), ("blue", &blue)] {
            if channel.shape() != red.shape() {
                return Err(FilterError::geometry_mismatch(format!(
                    "{} channel has shape {:?}, red has {:?}",
                    name,
                    channel.shape(),
                    red.shape()
                )));
            }
            if channel.pixel_type() != red.pixel_type() {
                return Err(FilterError::geometry_mismatch(format!(
                    "{} channel is {}, red is {}",
                    name,
                    channel.pixel_type(),
                    red.pixel_type()
                )));
            }
        }
        Ok(Self { channels: [red, green, blue] })
    }

    pub fn red(&self) -> &Image<B, D> {
        &self.channels[0]
    }

    pub fn green(&self) -> &Image<B, D> {
        &self.channels[1]
    }

    pub fn blue(&self) -> &Image<B, D> {
        &self.channels[2]
    }

    pub fn channels(&self) -> &[Image<B, D>; 3] {
        &self.channels
    }

    pub fn pixel_type(&self) -> PixelType {
        self.channels[0].pixel_type()
    }

    /// Size of the shared grid, fastest axis first.
    pub fn size(&self) -> [usize; D] {
        self.channels[0].size()
    }

    /// Interleaved `[r, g, b, r, g, b, ...]` samples in row-major order.
    pub fn to_interleaved(&self) -> Vec<f32> {
        let planes: Vec<Vec<f32>> = self.channels.iter().map(|c| c.to_values()).collect();
        let n = planes[0].len();
        let mut out = Vec::with_capacity(n * 3);
        for i in 0..n {
            for plane in &planes {
                out.push(plane[i]);
            }
        }
        out
    }
}
