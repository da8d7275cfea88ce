/// Errors from curve evaluation.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// Returned when a report threshold lies outside `[0, 1]`.
    #[error("threshold must be in [0, 1], got {threshold}")]
    InvalidThreshold {
        /// The offending threshold.
        threshold: f64,
    },

    /// Returned when no report threshold is configured.
    #[error("at least one report threshold is required")]
    NoThresholds,

    /// Returned when the worker cap is zero.
    #[error("max_workers must be at least 1, got {max_workers}")]
    InvalidWorkerCount {
        /// The invalid cap.
        max_workers: usize,
    },

    /// Returned when the worker pool cannot be created.
    #[error("failed to build worker pool")]
    ThreadPool {
        /// The underlying rayon error.
        #[source]
        source: rayon::ThreadPoolBuildError,
    },

    /// Returned when a per-label task panics.
    #[error("evaluation task for label \"{label}\" panicked: {message}")]
    TaskPanicked {
        /// The label whose task failed.
        label: String,
        /// The panic payload, if it was a string.
        message: String,
    },

    /// Returned when a task was cancelled because another task failed.
    #[error("evaluation task for label \"{label}\" was cancelled")]
    Cancelled {
        /// The label whose task did not run.
        label: String,
    },

    /// Returned when the worker pool stopped delivering results.
    #[error("worker pool disconnected with {missing} result(s) outstanding")]
    PoolDisconnected {
        /// Results that never arrived.
        missing: usize,
    },

    /// Returned when a label is requested that the confidence matrix lacks.
    #[error("label \"{label}\" has no confidence column")]
    UnknownLabel {
        /// The missing label.
        label: String,
    },

    /// Returned when a confidence lies outside `[0, 1]` or is not finite.
    #[error("confidence {value} for example \"{example}\", label \"{label}\" is outside [0, 1]")]
    InvalidConfidence {
        /// Example id.
        example: String,
        /// Label name.
        label: String,
        /// The offending value.
        value: f64,
    },
}
