//! Learning rate schedules for the registration loop.

use crate::error::{RegistrationError, Result};

/// Learning rate for a given iteration.
pub trait LearningRateScheduler: Send + Sync {
    /// Learning rate at `step` (0-based), starting from `initial_lr`.
    fn get_lr(&self, step: usize, initial_lr: f64) -> f64;
}

/// Keeps the initial learning rate throughout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantRate;

impl LearningRateScheduler for ConstantRate {
    fn get_lr(&self, _step: usize, initial_lr: f64) -> f64 {
        initial_lr
    }
}

/// Multiplies the learning rate by `gamma` every `step_size` iterations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDecay {
    step_size: usize,
    gamma: f64,
}

impl StepDecay {
    /// # Arguments
    /// * `step_size` - Iterations between reductions, positive
    /// * `gamma` - Multiplicative factor in `(0, 1]`
    pub fn new(step_size: usize, gamma: f64) -> Result<Self> {
        if step_size == 0 {
            return Err(RegistrationError::invalid_configuration(
                "learning rate decay step must be positive",
            ));
        }
        if !(gamma > 0.0 && gamma <= 1.0) {
            return Err(RegistrationError::invalid_configuration(format!(
                "learning rate decay factor must be in (0, 1], got {}",
                gamma
            )));
        }
        Ok(Self { step_size, gamma })
    }

    pub fn step_size(&self) -> usize {
        self.step_size
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl LearningRateScheduler for StepDecay {
    fn get_lr(&self, step: usize, initial_lr: f64) -> f64 {
        let exponent = step / self.step_size;
        initial_lr * self.gamma.powi(exponent as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_schedule() {
        assert_eq!(ConstantRate.get_lr(0, 0.01), 0.01);
        assert_eq!(ConstantRate.get_lr(100, 0.01), 0.01);
    }

    #[test]
    fn test_step_decay() {
        let schedule = StepDecay::new(50, 0.5).unwrap();
        assert_eq!(schedule.get_lr(0, 0.5), 0.5);
        assert_eq!(schedule.get_lr(49, 0.5), 0.5);
        assert_eq!(schedule.get_lr(50, 0.5), 0.25);
        assert_eq!(schedule.get_lr(199, 0.5), 0.0625);
    }

    #[test]
    fn test_step_decay_validation() {
        assert!(StepDecay::new(0, 0.5).is_err());
        assert!(StepDecay::new(10, 0.0).is_err());
        assert!(StepDecay::new(10, 1.5).is_err());
        assert!(StepDecay::new(10, f64::NAN).is_err());
        assert!(StepDecay::new(10, 1.0).is_ok());
    }
}
