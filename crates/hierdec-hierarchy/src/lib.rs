//! Label hierarchy for hierarchical multi-label classification.
//!
//! A hierarchy is a DAG of parent/child label relations rooted at the
//! reserved label `root`. This crate validates the declared pairs, enumerates
//! every path from a label up to `root`, answers most-specific-label queries
//! for annotation sets, and derives the summary statistics reported for a
//! dataset.

mod error;
mod hierarchy;
mod paths;
mod properties;
mod subset;

pub use error::HierarchyError;
pub use hierarchy::{Annotation, LabelHierarchy, LabelPath, ROOT};
pub use properties::{DatasetProperties, Summary};
pub use subset::LabelSubset;
