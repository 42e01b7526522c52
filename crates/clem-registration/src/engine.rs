//! Registration engine: estimates the transform mapping fixed-image points
//! onto the moving image.

use burn::backend::Autodiff;
use burn::module::AutodiffModule;
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::Tensor;
use clem_core::image::Image;
use clem_core::transform::{
    AffineTransform, RigidTransform, SpatialTransform, Transform, TransformKind, TranslationTransform,
};

use crate::error::{RegistrationError, Result};
use crate::method::{MethodConfig, MetricKind};
use crate::metric::{MeanSquaredError, Metric, NormalizedCrossCorrelation};
use crate::optimizer::{AdamOptimizer, StepDecay};
use crate::progress::ProgressTracker;
use crate::registration::Registration;

/// Estimates a 2D transform between a fixed and a moving image.
pub trait RegistrationEngine<B: Backend> {
    /// Returns the transform mapping fixed physical points to moving
    /// physical points, so `resample(moving, &t, Some(fixed))` aligns the
    /// moving image with the fixed one.
    fn estimate(&self, fixed: &Image<B, 2>, moving: &Image<B, 2>, method: &MethodConfig)
        -> Result<SpatialTransform>;
}

/// Engine that optimises a trainable transform with Adam through burn's
/// autodiff backend.
///
/// Holds no state between calls: every `estimate` builds a fresh transform
/// and optimizer.
#[derive(Debug, Clone, Default)]
pub struct GradientRegistrationEngine {
    tracker: Option<ProgressTracker>,
}

impl GradientRegistrationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report progress to `tracker` instead of the default console logger.
    pub fn with_tracker(mut self, tracker: ProgressTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }
}

fn validate<B: Backend>(name: &str, image: &Image<B, 2>) -> Result<()> {
    let size = image.size();
    if size.iter().any(|&n| n < 2) {
        return Err(RegistrationError::image_validation(format!(
            "{} image must be at least 2x2 pixels, got {:?}",
            name, size
        )));
    }
    if !image.spacing().is_valid() {
        return Err(RegistrationError::image_validation(format!(
            "{} image has invalid spacing {:?}",
            name,
            image.spacing().to_vec()
        )));
    }
    Ok(())
}

/// Same image on the autodiff backend. The data carries no gradient.
fn lift<B: Backend>(image: &Image<B, 2>) -> Image<Autodiff<B>, 2> {
    Image::new(
        Tensor::<Autodiff<B>, 2>::from_inner(image.data().clone()),
        *image.origin(),
        *image.spacing(),
        *image.direction(),
        image.pixel_type(),
    )
}

fn optimise<AB, T, M>(
    fixed: &Image<AB, 2>,
    moving: &Image<AB, 2>,
    transform: T,
    metric: M,
    method: &MethodConfig,
    tracker: ProgressTracker,
) -> Result<T>
where
    AB: AutodiffBackend,
    T: Transform<AB, 2> + AutodiffModule<AB>,
    M: Metric<AB, 2>,
{
    let schedule = StepDecay::new(method.decay_step, method.decay_factor)?;
    let optimizer = AdamOptimizer::<T, AB>::new(method.learning_rate);
    let mut registration = Registration::new(optimizer, metric).with_tracker(tracker);

    let outcome = registration.execute(
        fixed,
        moving,
        transform,
        method.iterations,
        method.learning_rate,
        &schedule,
    )?;
    tracing::info!(
        metric = %method.metric,
        final_loss = outcome.final_loss,
        iterations = outcome.iterations,
        "registration finished"
    );
    Ok(outcome.transform)
}

fn optimise_with_metric<AB, T>(
    fixed: &Image<AB, 2>,
    moving: &Image<AB, 2>,
    transform: T,
    method: &MethodConfig,
    tracker: ProgressTracker,
) -> Result<T>
where
    AB: AutodiffBackend,
    T: Transform<AB, 2> + AutodiffModule<AB>,
{
    match method.metric {
        MetricKind::MeanSquares => optimise(fixed, moving, transform, MeanSquaredError::new(), method, tracker),
        MetricKind::Correlation => {
            optimise(fixed, moving, transform, NormalizedCrossCorrelation::new(), method, tracker)
        }
    }
}

impl<B: Backend> RegistrationEngine<B> for GradientRegistrationEngine {
    fn estimate(
        &self,
        fixed: &Image<B, 2>,
        moving: &Image<B, 2>,
        method: &MethodConfig,
    ) -> Result<SpatialTransform> {
        validate("fixed", fixed)?;
        validate("moving", moving)?;
        method.validate()?;

        let device = fixed.device();
        let center = fixed.physical_center();
        let extent = fixed.extent();
        // Rotation-like parameters are optimised as arc lengths at this radius.
        let radius = 0.5 * (extent[0] * extent[0] + extent[1] * extent[1]).sqrt();

        tracing::info!(
            metric = %method.metric,
            transform = %method.transform,
            iterations = method.iterations,
            learning_rate = method.learning_rate,
            center = ?center.to_vec(),
            "estimating transform"
        );

        let fixed = lift(fixed);
        let moving = lift(moving);
        let tracker = self
            .tracker
            .clone()
            .unwrap_or_else(|| ProgressTracker::console(method.log_interval));

        let estimated = match method.transform {
            TransformKind::Translation => {
                let initial = TranslationTransform::<Autodiff<B>>::identity(&device);
                optimise_with_metric(&fixed, &moving, initial, method, tracker)?.to_spatial()
            }
            TransformKind::Euler2D => {
                let initial = RigidTransform::<Autodiff<B>>::identity(center, radius, &device);
                optimise_with_metric(&fixed, &moving, initial, method, tracker)?.to_spatial()
            }
            TransformKind::Affine => {
                let initial = AffineTransform::<Autodiff<B>>::identity(center, radius, &device);
                optimise_with_metric(&fixed, &moving, initial, method, tracker)?.to_spatial()
            }
        };

        tracing::debug!(parameters = ?estimated.parameters(), "estimated transform");
        Ok(estimated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use clem_core::image::PixelType;
    use clem_core::spatial::{Direction2, Point2, Spacing2};

    type B = NdArray<f32>;

    fn image(size: [usize; 2]) -> Image<B, 2> {
        let device = Default::default();
        let n = size[0] * size[1];
        Image::from_values(
            (0..n).map(|v| v as f32).collect(),
            [size[1], size[0]],
            Point2::origin(),
            Spacing2::uniform(1.0),
            Direction2::identity(),
            PixelType::Float32,
            &device,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_degenerate_images() {
        let engine = GradientRegistrationEngine::new();
        let method = MethodConfig::new().with_iterations(1);
        let err = engine.estimate(&image([1, 8]), &image([8, 8]), &method).unwrap_err();
        assert!(matches!(err, RegistrationError::ImageValidationError(_)));
    }

    #[test]
    fn test_rejects_invalid_method() {
        let engine = GradientRegistrationEngine::new();
        let method = MethodConfig::new().with_learning_rate(-1.0);
        let err = engine.estimate(&image([8, 8]), &image([8, 8]), &method).unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_zero_iterations_returns_identity_about_center() {
        let engine = GradientRegistrationEngine::new();
        let method = MethodConfig::new().with_iterations(0);
        let t = engine.estimate(&image([9, 5]), &image([9, 5]), &method).unwrap();
        assert_eq!(t.kind(), TransformKind::Euler2D);
        assert!(t.parameters().iter().all(|p| p.abs() < 1e-9));
        assert_eq!(t.fixed_parameters(), &[4.0, 2.0]);
    }
}
