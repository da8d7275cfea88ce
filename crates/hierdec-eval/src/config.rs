//! Evaluation settings.

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::error::EvalError;

/// Report thresholds used when none are configured.
pub const DEFAULT_THRESHOLDS: [f64; 3] = [0.5, 0.7, 0.9];

/// Configuration for a [`CurveEvaluator`](crate::CurveEvaluator).
///
/// Construct via [`EvaluationConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter      | Default                      |
/// |----------------|------------------------------|
/// | `max_workers`  | available hardware threads   |
/// | `grace_period` | 5 s                          |
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    pub(crate) thresholds: Vec<f64>,
    pub(crate) max_workers: usize,
    pub(crate) grace_period: Duration,
}

impl EvaluationConfig {
    /// Create a config reporting confusion counts at `thresholds`.
    ///
    /// Thresholds are sorted and deduplicated.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`EvalError::NoThresholds`] | `thresholds` is empty |
    /// | [`EvalError::InvalidThreshold`] | A threshold is not a finite value in `[0, 1]` |
    pub fn new(thresholds: impl IntoIterator<Item = f64>) -> Result<Self, EvalError> {
        let mut thresholds: Vec<f64> = thresholds.into_iter().collect();
        if thresholds.is_empty() {
            return Err(EvalError::NoThresholds);
        }
        if let Some(&threshold) = thresholds
            .iter()
            .find(|t| !t.is_finite() || !(0.0..=1.0).contains(*t))
        {
            return Err(EvalError::InvalidThreshold { threshold });
        }
        thresholds.sort_by(f64::total_cmp);
        thresholds.dedup();
        Ok(Self {
            thresholds,
            max_workers: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            grace_period: Duration::from_secs(5),
        })
    }

    // --- Setters ---

    /// Cap the number of worker threads.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Set how long in-flight tasks may finish after a failure.
    #[must_use]
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    // --- Getters ---

    /// Return the report thresholds, ascending.
    #[must_use]
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Return the worker cap.
    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Return the grace period.
    #[must_use]
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            max_workers: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            grace_period: Duration::from_secs(5),
        }
    }
}
