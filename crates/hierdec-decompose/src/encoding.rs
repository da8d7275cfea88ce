//! The decomposition strategies.

use std::fmt;
use std::str::FromStr;

use crate::error::DecomposeError;

/// How a hierarchical dataset is restated for a flat classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Encoding {
    /// Native hierarchical labels: tree paths or the raw DAG.
    Baseline,
    /// One binary attribute per most-specific label, learned jointly.
    LabelsWithoutHierarchicalRelations,
    /// Same datasets as above, learned one label at a time.
    LabelVsTheRest,
    /// One dataset per hierarchy edge.
    ChildVsParentLabel,
    /// One dataset per parent with at least two children.
    LabelSpecialization,
}

impl Encoding {
    /// Every encoding, in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::Baseline,
        Self::LabelsWithoutHierarchicalRelations,
        Self::LabelVsTheRest,
        Self::ChildVsParentLabel,
        Self::LabelSpecialization,
    ];

    /// Output directory name of this encoding.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Baseline => "Baseline",
            Self::LabelsWithoutHierarchicalRelations => "LabelsWithoutHierarchicalRelations",
            Self::LabelVsTheRest => "LabelVsTheRest",
            Self::ChildVsParentLabel => "ChildVsParentLabel",
            Self::LabelSpecialization => "LabelSpecialization",
        }
    }

    /// `true` for the per-edge encodings whose confidences need reconciling.
    #[must_use]
    pub fn is_partial(self) -> bool {
        matches!(self, Self::ChildVsParentLabel | Self::LabelSpecialization)
    }
}

impl FromStr for Encoding {
    type Err = DecomposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        if let Some(encoding) = Self::ALL.into_iter().find(|e| e.dir_name().eq_ignore_ascii_case(key)) {
            return Ok(encoding);
        }
        match key.to_ascii_lowercase().as_str() {
            "baseline" => Ok(Self::Baseline),
            "complete" | "flat" => Ok(Self::LabelsWithoutHierarchicalRelations),
            "one-vs-rest" | "label-vs-rest" => Ok(Self::LabelVsTheRest),
            "child-vs-parent" => Ok(Self::ChildVsParentLabel),
            "label-specialization" => Ok(Self::LabelSpecialization),
            _ => Err(DecomposeError::UnknownEncoding {
                value: key.to_string(),
            }),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dir_names_and_aliases() {
        for e in Encoding::ALL {
            assert_eq!(e.dir_name().parse::<Encoding>().unwrap(), e);
        }
        assert_eq!("labelvstherest".parse::<Encoding>().unwrap(), Encoding::LabelVsTheRest);
        assert_eq!("complete".parse::<Encoding>().unwrap(), Encoding::LabelsWithoutHierarchicalRelations);
        assert_eq!("child-vs-parent".parse::<Encoding>().unwrap(), Encoding::ChildVsParentLabel);
        assert!(matches!(
            "nope".parse::<Encoding>().unwrap_err(),
            DecomposeError::UnknownEncoding { .. }
        ));
    }

    #[test]
    fn only_edge_encodings_are_partial() {
        let partial: Vec<Encoding> = Encoding::ALL.into_iter().filter(|e| e.is_partial()).collect();
        assert_eq!(partial, vec![Encoding::ChildVsParentLabel, Encoding::LabelSpecialization]);
    }
}
