//! Registration method settings.

use std::fmt;
use std::str::FromStr;

use clem_core::transform::TransformKind;

use crate::error::{RegistrationError, Result};

/// Similarity metric driving the optimisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricKind {
    /// Mean squared intensity difference.
    MeanSquares,
    /// Negative normalized cross correlation.
    #[default]
    Correlation,
}

impl MetricKind {
    /// Name used on the command line and in output file names.
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::MeanSquares => "mean-squared-difference",
            MetricKind::Correlation => "correlation",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricKind {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean-squared-difference" | "meansquares" | "mse" => Ok(MetricKind::MeanSquares),
            "correlation" | "ncc" => Ok(MetricKind::Correlation),
            other => Err(RegistrationError::metric(format!(
                "unknown registration method `{}` (expected `correlation` or `mean-squared-difference`)",
                other
            ))),
        }
    }
}

/// How the engine estimates a transform.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodConfig {
    pub metric: MetricKind,
    pub transform: TransformKind,
    pub iterations: usize,
    pub learning_rate: f64,
    /// Iterations between learning rate reductions.
    pub decay_step: usize,
    /// Factor applied to the learning rate every `decay_step` iterations.
    pub decay_factor: f64,
    /// Iterations between progress log lines.
    pub log_interval: usize,
}

impl Default for MethodConfig {
    fn default() -> Self {
        Self {
            metric: MetricKind::Correlation,
            transform: TransformKind::Euler2D,
            iterations: 200,
            learning_rate: 0.5,
            decay_step: 50,
            decay_factor: 0.5,
            log_interval: 50,
        }
    }
}

impl MethodConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metric(mut self, metric: MetricKind) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_transform(mut self, transform: TransformKind) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Multiply the learning rate by `factor` every `step` iterations.
    pub fn with_decay(mut self, step: usize, factor: f64) -> Self {
        self.decay_step = step;
        self.decay_factor = factor;
        self
    }

    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval;
        self
    }

    /// Check the optimiser settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(RegistrationError::invalid_configuration(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        crate::optimizer::StepDecay::new(self.decay_step, self.decay_factor)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MethodConfig::default();
        assert_eq!(config.metric, MetricKind::Correlation);
        assert_eq!(config.transform, TransformKind::Euler2D);
        assert_eq!(config.iterations, 200);
        assert_eq!(config.learning_rate, 0.5);
        assert_eq!((config.decay_step, config.decay_factor), (50, 0.5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = MethodConfig::new()
            .with_metric(MetricKind::MeanSquares)
            .with_transform(TransformKind::Translation)
            .with_iterations(10)
            .with_learning_rate(0.1)
            .with_decay(5, 0.9);
        assert_eq!(config.metric, MetricKind::MeanSquares);
        assert_eq!(config.transform, TransformKind::Translation);
        assert_eq!(config.iterations, 10);
        assert_eq!(config.decay_step, 5);
    }

    #[test]
    fn test_validate_rejects_bad_rates() {
        assert!(MethodConfig::new().with_learning_rate(0.0).validate().is_err());
        assert!(MethodConfig::new().with_learning_rate(f64::NAN).validate().is_err());
        assert!(MethodConfig::new().with_decay(0, 0.5).validate().is_err());
    }

    #[test]
    fn test_metric_names() {
        assert_eq!("correlation".parse::<MetricKind>().unwrap(), MetricKind::Correlation);
        assert_eq!(
            "Mean-Squared-Difference".parse::<MetricKind>().unwrap(),
            MetricKind::MeanSquares
        );
        assert!("mattes".parse::<MetricKind>().is_err());
        assert_eq!(MetricKind::MeanSquares.to_string(), "mean-squared-difference");
    }
}
