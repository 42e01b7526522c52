//! Optimizers and learning-rate schedules for the registration loop.

pub mod trait_;
pub mod adam;
pub mod learning_rate;

pub use trait_::Optimizer;
pub use adam::AdamOptimizer;
pub use learning_rate::{ConstantRate, LearningRateScheduler, StepDecay};
