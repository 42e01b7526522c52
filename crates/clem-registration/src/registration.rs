//! Gradient-descent registration loop.

use std::marker::PhantomData;

use burn::module::AutodiffModule;
use burn::optim::GradientsParams;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};
use clem_core::image::Image;
use clem_core::transform::Transform;

use crate::error::{RegistrationError, Result};
use crate::metric::Metric;
use crate::optimizer::{LearningRateScheduler, Optimizer};
use crate::progress::ProgressTracker;

/// Final state of a registration run.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome<T> {
    pub transform: T,
    /// Metric value of `transform`.
    pub final_loss: f64,
    pub iterations: usize,
}

/// Minimises a metric over the parameters of a trainable transform.
///
/// `O` updates the transform from the metric's gradients; the loop itself
/// only schedules the learning rate and watches the loss.
pub struct Registration<B, O, M, T, const D: usize>
where
    B: AutodiffBackend,
    O: Optimizer<T, B>,
    M: Metric<B, D>,
    T: Transform<B, D> + AutodiffModule<B>,
{
    optimizer: O,
    metric: M,
    tracker: ProgressTracker,
    _transform: PhantomData<(B, T)>,
}

impl<B, O, M, T, const D: usize> Registration<B, O, M, T, D>
where
    B: AutodiffBackend,
    O: Optimizer<T, B>,
    M: Metric<B, D>,
    T: Transform<B, D> + AutodiffModule<B>,
{
    pub fn new(optimizer: O, metric: M) -> Self {
        Self {
            optimizer,
            metric,
            tracker: ProgressTracker::new(),
            _transform: PhantomData,
        }
    }

    pub fn with_tracker(mut self, tracker: ProgressTracker) -> Self {
        self.tracker = tracker;
        self
    }

    /// Scalar value of `loss`, or an error once it stops being finite.
    fn checked(&self, loss: &Tensor<B, 1>, iteration: usize) -> Result<f64> {
        let value: f64 = loss.clone().into_scalar().elem();
        if value.is_finite() {
            return Ok(value);
        }
        let err = RegistrationError::numerical_instability(format!(
            "{} is {} at iteration {}",
            self.metric.name(),
            value,
            iteration
        ));
        self.tracker.fail(&err.to_string());
        Err(err)
    }

    /// Take `iterations` optimizer steps from `transform`.
    ///
    /// Step `i` uses `schedule.get_lr(i, learning_rate)`.
    pub fn execute(
        &mut self,
        fixed: &Image<B, D>,
        moving: &Image<B, D>,
        transform: T,
        iterations: usize,
        learning_rate: f64,
        schedule: &dyn LearningRateScheduler,
    ) -> Result<RegistrationOutcome<T>> {
        self.tracker.start(iterations);

        let mut transform = transform;
        let mut rate = learning_rate;
        for step in 0..iterations {
            rate = schedule.get_lr(step, learning_rate);
            self.optimizer.set_learning_rate(rate);

            let loss = self.metric.forward(fixed, moving, &transform);
            let value = self.checked(&loss, step)?;
            self.tracker.update(step, iterations, value, rate);

            let grads = GradientsParams::from_grads(loss.backward(), &transform);
            transform = self.optimizer.step(transform, grads);
        }

        let final_loss = self.checked(&self.metric.forward(fixed, moving, &transform), iterations)?;
        self.tracker.finish(iterations, final_loss, rate);

        Ok(RegistrationOutcome {
            transform,
            final_loss,
            iterations,
        })
    }
}
