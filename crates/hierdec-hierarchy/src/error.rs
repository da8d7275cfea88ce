/// Errors from building or querying a label hierarchy.
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    /// Returned when a declared pair does not have exactly two non-empty sides.
    #[error("malformed parent/child pair {index} \"{pair}\": expected exactly two non-empty labels")]
    MalformedPair {
        /// Zero-based position of the pair in the declaration.
        index: usize,
        /// The raw pair text.
        pair: String,
    },

    /// Returned when no pair has `root` as its parent.
    #[error("hierarchy has no pair with \"root\" as parent")]
    MissingRoot,

    /// Returned when a label uses characters other than ASCII letters,
    /// digits and dots. Prediction column and file names rely on `-` and `_`
    /// as separators.
    #[error("label \"{label}\" in pair {index} must contain only alphanumeric characters and dots")]
    InvalidLabelName {
        /// Zero-based position of the offending pair.
        index: usize,
        /// The offending label.
        label: String,
    },

    /// Returned when `root` is declared as the child of another label.
    #[error("\"root\" is declared as a child in pair {index}")]
    RootAsChild {
        /// Zero-based position of the offending pair.
        index: usize,
    },

    /// Returned when a label is declared as its own parent.
    #[error("label \"{label}\" is declared as its own parent")]
    SelfLoop {
        /// The offending label.
        label: String,
    },

    /// Returned when one or more labels have no path to `root`.
    #[error("{count} label(s) unreachable from root: {names}", count = .labels.len(), names = .labels.join(", "))]
    UnreachableLabels {
        /// The unreachable labels, sorted.
        labels: Vec<String>,
    },

    /// Returned when a query names a label that is not part of the hierarchy.
    #[error("label \"{label}\" is not part of the hierarchy")]
    UnknownLabel {
        /// The unknown label.
        label: String,
    },

    /// Returned when a label subset name cannot be parsed.
    #[error("unknown label subset \"{value}\" (expected most-specific or hierarchy-leaves)")]
    UnknownLabelSubset {
        /// The unparseable value.
        value: String,
    },
}
