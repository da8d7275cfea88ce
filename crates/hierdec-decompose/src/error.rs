use hierdec_eval::EvalError;
use hierdec_hierarchy::HierarchyError;

/// Errors from decomposition, fold assignment and reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum DecomposeError {
    /// Wraps an invalid hierarchy declaration or a failed label lookup.
    #[error("hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    /// Wraps a failure while building the reconciled confidence matrix.
    #[error("confidence matrix error: {0}")]
    Eval(#[from] EvalError),

    /// Returned when two examples share an id.
    #[error("duplicate example id \"{id}\"")]
    DuplicateExample {
        /// The repeated id.
        id: String,
    },

    /// Returned when an example is annotated with a label the hierarchy lacks.
    #[error("example \"{example}\" is annotated with unknown label \"{label}\"")]
    UnknownAnnotation {
        /// Example id.
        example: String,
        /// The unknown label.
        label: String,
    },

    /// Returned when an encoding name cannot be parsed.
    #[error("unknown decomposition \"{value}\"")]
    UnknownEncoding {
        /// The unparseable value.
        value: String,
    },

    /// Returned when the fold count is less than 2.
    #[error("n_folds must be at least 2, got {n_folds}")]
    InvalidFoldCount {
        /// The invalid fold count.
        n_folds: usize,
    },

    /// Returned when there are fewer examples than folds.
    #[error("{n_examples} example(s) cannot fill {n_folds} folds")]
    TooFewExamples {
        /// Number of examples.
        n_examples: usize,
        /// Requested folds.
        n_folds: usize,
    },

    /// Returned when a fold number is outside `1..=n_folds`.
    #[error("fold {fold} is outside 1..={n_folds}")]
    FoldOutOfRange {
        /// The offending fold.
        fold: usize,
        /// Number of folds.
        n_folds: usize,
    },

    /// Returned when an edge confidence is not a finite value in `[0, 1]`.
    #[error("edge confidence {value} for example \"{example}\", {child} given {parent} is outside [0, 1]")]
    InvalidEdgeConfidence {
        /// Example id.
        example: String,
        /// Child label.
        child: String,
        /// Parent label.
        parent: String,
        /// The offending value.
        value: f64,
    },
}
