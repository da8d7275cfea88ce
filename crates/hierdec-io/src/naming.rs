//! File names of encoded datasets and recovery of their decomposition unit.

use hierdec_decompose::DatasetUnit;

/// Which side of a fold a dataset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// Examples outside the fold.
    Train,
    /// Examples of the fold.
    Test,
}

impl Split {
    fn lower(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
        }
    }
}

/// Name of the file one encoded dataset is written to, e.g.
/// `Child_B-parent_A-train-fold_3.arff`.
#[must_use]
pub fn dataset_file_name(unit: &DatasetUnit, split: Split, fold: usize) -> String {
    match unit {
        DatasetUnit::Whole => match split {
            Split::Train => format!("Train-fold_{fold}.arff"),
            Split::Test => format!("Test-fold_{fold}.arff"),
        },
        DatasetUnit::Edge { parent, child } => {
            format!("Child_{child}-parent_{parent}-{}-fold_{fold}.arff", split.lower())
        }
        DatasetUnit::Parent { parent } => {
            format!("Parent_{parent}-{}-fold_{fold}.arff", split.lower())
        }
    }
}

/// Recover the unit a per-edge or per-parent file (dataset or predictions)
/// was built for. Returns `None` for whole-dataset names.
#[must_use]
pub fn unit_from_file_name(file_name: &str) -> Option<DatasetUnit> {
    if let Some(rest) = file_name.strip_prefix("Child_") {
        let (child, rest) = rest.split_once("-parent_")?;
        let parent = strip_split_suffix(rest)?;
        return Some(DatasetUnit::Edge {
            parent: parent.to_string(),
            child: child.to_string(),
        });
    }
    let rest = file_name.strip_prefix("Parent_")?;
    Some(DatasetUnit::Parent {
        parent: strip_split_suffix(rest)?.to_string(),
    })
}

fn strip_split_suffix(name: &str) -> Option<&str> {
    ["-test-fold_", "-train-fold_"]
        .iter()
        .filter_map(|marker| name.rfind(marker))
        .max()
        .or_else(|| name.rfind('-'))
        .map(|end| &name[..end])
        .filter(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_unit_and_split() {
        let edge = DatasetUnit::Edge {
            parent: "A".into(),
            child: "B".into(),
        };
        assert_eq!(dataset_file_name(&edge, Split::Train, 3), "Child_B-parent_A-train-fold_3.arff");
        let parent = DatasetUnit::Parent { parent: "root".into() };
        assert_eq!(dataset_file_name(&parent, Split::Test, 1), "Parent_root-test-fold_1.arff");
        assert_eq!(dataset_file_name(&DatasetUnit::Whole, Split::Test, 2), "Test-fold_2.arff");
    }

    #[test]
    fn unit_recovered_from_prediction_names() {
        assert_eq!(
            unit_from_file_name("Child_B-parent_A-test-fold_3.pred.arff.zip"),
            Some(DatasetUnit::Edge {
                parent: "A".into(),
                child: "B".into()
            })
        );
        assert_eq!(
            unit_from_file_name("Parent_GO.0001-test-fold_10.pred.arff.gz"),
            Some(DatasetUnit::Parent {
                parent: "GO.0001".into()
            })
        );
        assert_eq!(unit_from_file_name("Test-fold_1.pred.arff"), None);
    }
}
