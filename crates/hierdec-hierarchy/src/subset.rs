//! Which labels take part in micro-averaging.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::HierarchyError;
use crate::hierarchy::{Annotation, LabelHierarchy};

/// The label subset used for micro-averaged evaluation and report averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelSubset {
    /// Labels that are most specific in at least one example's annotation.
    #[default]
    MostSpecific,
    /// Labels that are never a parent in the hierarchy.
    HierarchyLeaves,
}

impl LabelSubset {
    /// Resolve the subset against a hierarchy and the dataset's annotations.
    pub fn resolve<'a, I>(self, hierarchy: &LabelHierarchy, annotations: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a Annotation>,
    {
        match self {
            Self::MostSpecific => annotations
                .into_iter()
                .flat_map(|a| hierarchy.most_specific_labels(a))
                .collect(),
            Self::HierarchyLeaves => hierarchy.leaves(),
        }
    }
}

impl FromStr for LabelSubset {
    type Err = HierarchyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "most-specific" | "mostSpecific" => Ok(Self::MostSpecific),
            "hierarchy-leaves" | "hierarchyLeaves" => Ok(Self::HierarchyLeaves),
            other => Err(HierarchyError::UnknownLabelSubset {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for LabelSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MostSpecific => write!(f, "most-specific"),
            Self::HierarchyLeaves => write!(f, "hierarchy-leaves"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_spellings() {
        assert_eq!("most-specific".parse::<LabelSubset>().unwrap(), LabelSubset::MostSpecific);
        assert_eq!("mostSpecific".parse::<LabelSubset>().unwrap(), LabelSubset::MostSpecific);
        assert_eq!(
            "hierarchyLeaves".parse::<LabelSubset>().unwrap(),
            LabelSubset::HierarchyLeaves
        );
        let err = "all".parse::<LabelSubset>().unwrap_err();
        assert!(matches!(err, HierarchyError::UnknownLabelSubset { .. }));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for subset in [LabelSubset::MostSpecific, LabelSubset::HierarchyLeaves] {
            assert_eq!(subset.to_string().parse::<LabelSubset>().unwrap(), subset);
        }
    }

    #[test]
    fn most_specific_differs_from_leaves() {
        let h = LabelHierarchy::parse("root/A,A/B,A/C").unwrap();
        let annotations: Vec<Annotation> = vec![
            ["A", "B"].iter().map(|s| s.to_string()).collect(),
            ["A"].iter().map(|s| s.to_string()).collect(),
        ];
        let specific = LabelSubset::MostSpecific.resolve(&h, &annotations);
        assert_eq!(specific.into_iter().collect::<Vec<_>>(), vec!["A", "B"]);
        let leaves = LabelSubset::HierarchyLeaves.resolve(&h, &annotations);
        assert_eq!(leaves.into_iter().collect::<Vec<_>>(), vec!["B", "C"]);
    }
}
