//! Progress reporting for the registration loop.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Snapshot of the optimisation after one step.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressInfo {
    pub iteration: usize,
    pub total_iterations: usize,
    pub loss: f64,
    pub learning_rate: f64,
    /// Wall time since the run started.
    pub elapsed: Duration,
}

impl ProgressInfo {
    /// Completed fraction of the run in `[0, 1]`; 1 for an empty run.
    pub fn fraction(&self) -> f64 {
        if self.total_iterations == 0 {
            1.0
        } else {
            ((self.iteration + 1) as f64 / self.total_iterations as f64).min(1.0)
        }
    }
}

/// Receives registration events. Every hook but `on_iteration` is optional.
pub trait ProgressCallback: Send + Sync {
    fn on_iteration(&self, info: &ProgressInfo);

    fn on_start(&self, _total_iterations: usize) {}

    /// `info` describes the returned transform.
    fn on_finish(&self, _info: &ProgressInfo) {}

    fn on_failure(&self, _reason: &str) {}
}

/// Logs through `tracing` every `log_interval` iterations and on the last one.
#[derive(Debug, Clone)]
pub struct ConsoleProgressCallback {
    log_interval: usize,
}

impl Default for ConsoleProgressCallback {
    fn default() -> Self {
        Self::new(50)
    }
}

impl ConsoleProgressCallback {
    /// A zero interval logs every iteration.
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
        }
    }

    pub fn log_interval(&self) -> usize {
        self.log_interval
    }

    fn should_log(&self, info: &ProgressInfo) -> bool {
        info.iteration % self.log_interval == 0 || info.iteration + 1 == info.total_iterations
    }
}

impl ProgressCallback for ConsoleProgressCallback {
    fn on_iteration(&self, info: &ProgressInfo) {
        if self.should_log(info) {
            tracing::info!(
                iteration = info.iteration,
                of = info.total_iterations,
                done = %format!("{:.0}%", info.fraction() * 100.0),
                loss = info.loss,
                learning_rate = info.learning_rate,
                "optimizing"
            );
        }
    }

    fn on_start(&self, total_iterations: usize) {
        tracing::debug!(total_iterations, "optimizer started");
    }

    fn on_finish(&self, info: &ProgressInfo) {
        tracing::info!(
            loss = info.loss,
            seconds = %format!("{:.2}", info.elapsed.as_secs_f64()),
            "optimizer finished"
        );
    }

    fn on_failure(&self, reason: &str) {
        tracing::error!(reason, "optimizer failed");
    }
}

/// Lock a mutex, recovering the data if a panicking holder poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keeps every iteration snapshot in memory.
#[derive(Debug, Clone, Default)]
pub struct HistoryCallback {
    records: Arc<Mutex<Vec<ProgressInfo>>>,
}

impl HistoryCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ProgressInfo> {
        lock(&self.records).clone()
    }

    /// Loss of every recorded iteration, in order.
    pub fn losses(&self) -> Vec<f64> {
        lock(&self.records).iter().map(|info| info.loss).collect()
    }

    pub fn clear(&self) {
        lock(&self.records).clear();
    }
}

impl ProgressCallback for HistoryCallback {
    fn on_iteration(&self, info: &ProgressInfo) {
        lock(&self.records).push(info.clone());
    }
}

/// Dispatches registration events to a set of callbacks and keeps the run
/// clock.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    callbacks: Vec<Arc<dyn ProgressCallback>>,
    started: Arc<Mutex<Option<Instant>>>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker logging through a [`ConsoleProgressCallback`].
    pub fn console(log_interval: usize) -> Self {
        let mut tracker = Self::new();
        tracker.add_callback(Arc::new(ConsoleProgressCallback::new(log_interval)));
        tracker
    }

    pub fn add_callback(&mut self, callback: Arc<dyn ProgressCallback>) {
        self.callbacks.push(callback);
    }

    fn elapsed(&self) -> Duration {
        lock(&self.started).map_or(Duration::ZERO, |t| t.elapsed())
    }

    fn snapshot(&self, iteration: usize, total_iterations: usize, loss: f64, learning_rate: f64) -> ProgressInfo {
        ProgressInfo {
            iteration,
            total_iterations,
            loss,
            learning_rate,
            elapsed: self.elapsed(),
        }
    }

    /// Reset the clock and announce a run of `total_iterations` steps.
    pub fn start(&self, total_iterations: usize) {
        *lock(&self.started) = Some(Instant::now());
        self.callbacks.iter().for_each(|c| c.on_start(total_iterations));
    }

    pub fn update(&self, iteration: usize, total_iterations: usize, loss: f64, learning_rate: f64) {
        let info = self.snapshot(iteration, total_iterations, loss, learning_rate);
        self.callbacks.iter().for_each(|c| c.on_iteration(&info));
    }

    pub fn finish(&self, iterations: usize, final_loss: f64, learning_rate: f64) {
        let info = self.snapshot(iterations, iterations, final_loss, learning_rate);
        self.callbacks.iter().for_each(|c| c.on_finish(&info));
    }

    pub fn fail(&self, reason: &str) {
        self.callbacks.iter().for_each(|c| c.on_failure(reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(iteration: usize, total: usize, loss: f64) -> ProgressInfo {
        ProgressInfo {
            iteration,
            total_iterations: total,
            loss,
            learning_rate: 0.1,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_fraction() {
        assert_eq!(info(0, 4, 0.0).fraction(), 0.25);
        assert_eq!(info(3, 4, 0.0).fraction(), 1.0);
        assert_eq!(info(0, 0, 0.0).fraction(), 1.0);
    }

    #[test]
    fn test_console_interval() {
        let console = ConsoleProgressCallback::new(10);
        assert!(console.should_log(&info(0, 25, 0.0)));
        assert!(!console.should_log(&info(5, 25, 0.0)));
        assert!(console.should_log(&info(20, 25, 0.0)));
        assert!(console.should_log(&info(24, 25, 0.0)));
        assert_eq!(ConsoleProgressCallback::new(0).log_interval(), 1);
    }

    #[test]
    fn test_history_records_iterations_only() {
        let history = Arc::new(HistoryCallback::new());
        let mut tracker = ProgressTracker::console(1);
        tracker.add_callback(history.clone());

        tracker.start(2);
        tracker.update(0, 2, 0.5, 0.01);
        tracker.update(1, 2, 0.4, 0.01);
        tracker.finish(2, 0.3, 0.01);

        assert_eq!(history.losses(), vec![0.5, 0.4]);
        assert_eq!(history.records()[1].iteration, 1);
        history.clear();
        assert!(history.records().is_empty());
    }
}
