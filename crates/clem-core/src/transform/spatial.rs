//! Plain-value 2D spatial transforms.
//!
//! A [`SpatialTransform`] maps points of the fixed image's physical space to
//! points of the moving image's physical space:
//!
//! `T(x) = A (x - c) + c + t`
//!
//! Parameter layouts follow the ITK transform file conventions so the value
//! can be written and read back without conversion.

use std::fmt;
use std::str::FromStr;

use burn::tensor::{Shape, Tensor, TensorData};
use burn::tensor::backend::Backend;
use nalgebra::Matrix2;
use thiserror::Error;

use super::trait_::Transform;
use crate::spatial::{Point, Vector};

/// Errors raised while building a [`SpatialTransform`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Unknown transform kind: {0}")]
    UnknownKind(String),

    #[error("{kind} expects {expected} {what}, got {actual}")]
    ParameterCount {
        kind: TransformKind,
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Transform parameters must be finite")]
    NonFinite,
}

/// Supported transform families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    Translation,
    Euler2D,
    Affine,
}

impl TransformKind {
    /// Class name used in ITK transform files.
    pub fn itk_name(&self) -> &'static str {
        match self {
            TransformKind::Translation => "TranslationTransform_double_2_2",
            TransformKind::Euler2D => "Euler2DTransform_double_2_2",
            TransformKind::Affine => "AffineTransform_double_2_2",
        }
    }

    pub fn from_itk_name(name: &str) -> Option<Self> {
        [TransformKind::Translation, TransformKind::Euler2D, TransformKind::Affine]
            .into_iter()
            .find(|k| k.itk_name() == name)
    }

    pub fn num_parameters(&self) -> usize {
        match self {
            TransformKind::Translation => 2,
            TransformKind::Euler2D => 3,
            TransformKind::Affine => 6,
        }
    }

    pub fn num_fixed_parameters(&self) -> usize {
        match self {
            TransformKind::Translation => 0,
            TransformKind::Euler2D | TransformKind::Affine => 2,
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformKind::Translation => "translation",
            TransformKind::Euler2D => "rigid",
            TransformKind::Affine => "affine",
        };
        f.write_str(name)
    }
}

impl FromStr for TransformKind {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "translation" => Ok(TransformKind::Translation),
            "rigid" | "euler2d" => Ok(TransformKind::Euler2D),
            "affine" => Ok(TransformKind::Affine),
            _ => Err(TransformError::UnknownKind(s.to_string())),
        }
    }
}

/// Immutable 2D transform value.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialTransform {
    kind: TransformKind,
    parameters: Vec<f64>,
    fixed_parameters: Vec<f64>,
}

impl SpatialTransform {
    /// Build a transform from raw ITK-ordered parameter lists.
    pub fn new(
        kind: TransformKind,
        parameters: Vec<f64>,
        fixed_parameters: Vec<f64>,
    ) -> Result<Self, TransformError> {
        if parameters.len() != kind.num_parameters() {
            return Err(TransformError::ParameterCount {
                kind,
                what: "parameters",
                expected: kind.num_parameters(),
                actual: parameters.len(),
            });
        }
        if fixed_parameters.len() != kind.num_fixed_parameters() {
            return Err(TransformError::ParameterCount {
                kind,
                what: "fixed parameters",
                expected: kind.num_fixed_parameters(),
                actual: fixed_parameters.len(),
            });
        }
        if parameters.iter().chain(fixed_parameters.iter()).any(|v| !v.is_finite()) {
            return Err(TransformError::NonFinite);
        }
        Ok(Self { kind, parameters, fixed_parameters })
    }

    /// Identity transform of the given kind, centred at the origin.
    pub fn identity(kind: TransformKind) -> Self {
        let parameters = match kind {
            TransformKind::Translation => vec![0.0, 0.0],
            TransformKind::Euler2D => vec![0.0, 0.0, 0.0],
            TransformKind::Affine => vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        };
        Self {
            kind,
            parameters,
            fixed_parameters: vec![0.0; kind.num_fixed_parameters()],
        }
    }

    pub fn from_translation(offset: Vector<2>) -> Self {
        Self {
            kind: TransformKind::Translation,
            parameters: vec![offset[0], offset[1]],
            fixed_parameters: Vec::new(),
        }
    }

    /// Rigid transform: rotation by `angle` radians about `center`, then `offset`.
    pub fn euler2d(angle: f64, offset: Vector<2>, center: Point<2>) -> Self {
        Self {
            kind: TransformKind::Euler2D,
            parameters: vec![angle, offset[0], offset[1]],
            fixed_parameters: vec![center[0], center[1]],
        }
    }

    pub fn affine(matrix: Matrix2<f64>, offset: Vector<2>, center: Point<2>) -> Self {
        Self {
            kind: TransformKind::Affine,
            parameters: vec![
                matrix[(0, 0)],
                matrix[(0, 1)],
                matrix[(1, 0)],
                matrix[(1, 1)],
                offset[0],
                offset[1],
            ],
            fixed_parameters: vec![center[0], center[1]],
        }
    }

    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    pub fn fixed_parameters(&self) -> &[f64] {
        &self.fixed_parameters
    }

    /// Rotation angle in radians, for rigid transforms only.
    pub fn angle(&self) -> Option<f64> {
        match self.kind {
            TransformKind::Euler2D => Some(self.parameters[0]),
            _ => None,
        }
    }

    /// Linear part `A`.
    pub fn matrix(&self) -> Matrix2<f64> {
        match self.kind {
            TransformKind::Translation => Matrix2::identity(),
            TransformKind::Euler2D => {
                let (s, c) = self.parameters[0].sin_cos();
                Matrix2::new(c, -s, s, c)
            }
            TransformKind::Affine => {
                let p = &self.parameters;
                Matrix2::new(p[0], p[1], p[2], p[3])
            }
        }
    }

    /// Translation `t`.
    pub fn translation(&self) -> Vector<2> {
        let n = self.parameters.len();
        Vector::new([self.parameters[n - 2], self.parameters[n - 1]])
    }

    /// Centre `c`; the origin for translations.
    pub fn center(&self) -> Point<2> {
        match self.kind {
            TransformKind::Translation => Point::origin(),
            _ => Point::new([self.fixed_parameters[0], self.fixed_parameters[1]]),
        }
    }

    /// Same parameters, new centre. Translations have no centre and are
    /// returned unchanged.
    pub fn with_center(&self, center: Point<2>) -> Self {
        match self.kind {
            TransformKind::Translation => self.clone(),
            _ => Self {
                kind: self.kind,
                parameters: self.parameters.clone(),
                fixed_parameters: vec![center[0], center[1]],
            },
        }
    }

    /// Same linear part and centre, zero translation.
    pub fn rotation_only(&self) -> Self {
        let mut parameters = self.parameters.clone();
        let n = parameters.len();
        parameters[n - 2] = 0.0;
        parameters[n - 1] = 0.0;
        Self {
            kind: self.kind,
            parameters,
            fixed_parameters: self.fixed_parameters.clone(),
        }
    }

    /// Map one physical point.
    pub fn transform_point(&self, point: &Point<2>) -> Point<2> {
        let c = self.center();
        let mapped = self.matrix() * (*point - c).0;
        c + Vector(mapped) + self.translation()
    }

    /// Constant term `b` of the equivalent `A x + b` form.
    fn offset(&self) -> Vector<2> {
        let c = self.center().coords();
        Vector(c.0 - self.matrix() * c.0) + self.translation()
    }
}

impl<B: Backend> Transform<B, 2> for SpatialTransform {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        // Row vectors: y = x @ A^T + b
        let device = points.device();
        let a = self.matrix();
        let a_t = vec![
            a[(0, 0)] as f32,
            a[(1, 0)] as f32,
            a[(0, 1)] as f32,
            a[(1, 1)] as f32,
        ];
        let a_t = Tensor::<B, 2>::from_data(TensorData::new(a_t, Shape::new([2, 2])), &device);
        let b = self.offset();
        let b = Tensor::<B, 2>::from_floats([[b[0] as f32, b[1] as f32]], &device);
        points.matmul(a_t) + b
    }
}
