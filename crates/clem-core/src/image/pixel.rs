//! Nominal pixel types.
//!
//! Sample data always lives in `f32` tensors; the [`PixelType`] records the
//! type the samples are *meant* to have so that filters can conform their
//! output and writers can pick the on-disk sample format.

use std::fmt;
use std::str::FromStr;

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Nominal sample type of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl PixelType {
    /// Every supported pixel type.
    pub const ALL: [PixelType; 8] = [
        PixelType::UInt8,
        PixelType::Int8,
        PixelType::UInt16,
        PixelType::Int16,
        PixelType::UInt32,
        PixelType::Int32,
        PixelType::Float32,
        PixelType::Float64,
    ];

    /// Lower-case name, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            PixelType::UInt8 => "uint8",
            PixelType::Int8 => "int8",
            PixelType::UInt16 => "uint16",
            PixelType::Int16 => "int16",
            PixelType::UInt32 => "uint32",
            PixelType::Int32 => "int32",
            PixelType::Float32 => "float32",
            PixelType::Float64 => "float64",
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, PixelType::Float32 | PixelType::Float64)
    }

    /// Representable value range of an integer type, `None` for floats.
    pub fn range(&self) -> Option<(f64, f64)> {
        match self {
            PixelType::UInt8 => Some((u8::MIN as f64, u8::MAX as f64)),
            PixelType::Int8 => Some((i8::MIN as f64, i8::MAX as f64)),
            PixelType::UInt16 => Some((u16::MIN as f64, u16::MAX as f64)),
            PixelType::Int16 => Some((i16::MIN as f64, i16::MAX as f64)),
            PixelType::UInt32 => Some((u32::MIN as f64, u32::MAX as f64)),
            PixelType::Int32 => Some((i32::MIN as f64, i32::MAX as f64)),
            PixelType::Float32 | PixelType::Float64 => None,
        }
    }

    /// Conform a single value: round to nearest and clamp for integer types.
    pub fn conform(&self, value: f64) -> f64 {
        match self.range() {
            Some((lo, hi)) => value.round().clamp(lo, hi),
            None => value,
        }
    }

    /// Tensor version of [`PixelType::conform`].
    pub fn conform_tensor<B: Backend, const D: usize>(&self, data: Tensor<B, D>) -> Tensor<B, D> {
        match self.range() {
            Some((lo, hi)) => data.round().clamp(lo, hi),
            None => data,
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        PixelType::ALL
            .into_iter()
            .find(|t| t.name() == lowered)
            .ok_or_else(|| FilterError::UnknownPixelType(s.to_string()))
    }
}
