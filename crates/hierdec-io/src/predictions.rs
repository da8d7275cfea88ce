//! Collects classifier confidences from prediction files.
//!
//! A prediction file repeats the attribute-relation layout: every
//! `@ATTRIBUTE ... numeric` line is a confidence column and every data row
//! starts with the example id. Column names follow the classifier's
//! `<model>-p-<target>` convention, where the target is a label, a tree path
//! `a/b/c`, or a binary class `<label>-1` / `<label>-0`.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use hierdec_decompose::{
    BaseDataset, ConfidenceReconciler, DatasetUnit, EdgeConfidences, Encoding,
};
use hierdec_eval::{ConfidenceMatrix, ConfidenceMatrixBuilder};
use tracing::{debug, info, instrument, warn};

use crate::IoError;
use crate::archive::read_text;
use crate::naming::unit_from_file_name;

const PREDICTION_MARKER: &str = "-p-";
const PREDICTION_SUFFIXES: [&str; 3] = [".pred.arff", ".pred.arff.gz", ".pred.arff.zip"];

/// One confidence column of a prediction file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Column {
    position: usize,
    label: String,
}

/// Reads every prediction file of one decomposition's result directory.
pub struct PredictionReader {
    dir: PathBuf,
}

impl PredictionReader {
    /// Create a reader for the prediction files in `dir`.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Prediction files in the directory, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::ReadFile`] if the directory cannot be listed.
    pub fn files(&self) -> Result<Vec<PathBuf>, IoError> {
        let read_err = |e| IoError::ReadFile {
            path: self.dir.clone(),
            source: e,
        };
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            let is_prediction = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| PREDICTION_SUFFIXES.iter().any(|s| n.ends_with(s)));
            if is_prediction {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Collect one confidence per (example, label) for `dataset` under
    /// `encoding`, reconciling per-edge confidences for the partial
    /// encodings.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::ReadFile`] | The directory cannot be listed |
    /// | [`IoError::NoPredictionFiles`] | The directory holds no prediction file |
    /// | [`IoError::FileNotFound`] / [`IoError::Archive`] | A prediction file cannot be read |
    /// | [`IoError::MalformedLine`] / [`IoError::NonFiniteValue`] | A row is short or holds a non-number |
    /// | [`IoError::UnrecognisedPredictionFile`] | A partial-encoding file name has no unit |
    /// | [`IoError::Decompose`] | Reconciliation rejects the collected edges |
    #[instrument(skip_all, fields(dir = %self.dir.display(), encoding = %encoding))]
    pub fn collect(&self, dataset: &BaseDataset, encoding: Encoding) -> Result<ConfidenceMatrix, IoError> {
        let files = self.files()?;
        if files.is_empty() {
            return Err(IoError::NoPredictionFiles {
                path: self.dir.clone(),
            });
        }
        info!(n_files = files.len(), "reading predictions");
        if encoding.is_partial() {
            let edges = self.read_edges(&files, dataset)?;
            ConfidenceReconciler::new(dataset.hierarchy())
                .reconcile(&edges)
                .map_err(|e| IoError::Decompose {
                    path: self.dir.clone(),
                    source: e,
                })
        } else {
            self.read_labels(&files, dataset)
        }
    }

    /// Label confidences over every dataset example and label, 0 where no
    /// file has a value.
    fn read_labels(&self, files: &[PathBuf], dataset: &BaseDataset) -> Result<ConfidenceMatrix, IoError> {
        let labels = dataset.hierarchy().labels();
        let mut builder = ConfidenceMatrixBuilder::new();
        for id in dataset.example_ids() {
            builder.add_example(id);
        }
        for label in labels {
            builder.add_label(label.as_str());
        }

        let mut skipped = BTreeSet::new();
        for path in files {
            let text = read_text(path)?;
            let columns = confidence_columns(&text, label_of_complete_column);
            for (id, values) in data_rows(path, &text, &columns)? {
                if !dataset.examples().contains_key(id) {
                    skipped.insert(id.to_string());
                    continue;
                }
                for (column, value) in columns.iter().zip(values) {
                    if !labels.contains(&column.label) {
                        skipped.insert(column.label.clone());
                        continue;
                    }
                    builder
                        .insert(id, column.label.as_str(), value)
                        .map_err(|e| IoError::Confidence {
                            path: path.clone(),
                            source: e,
                        })?;
                }
            }
        }
        if !skipped.is_empty() {
            warn!(n = skipped.len(), "ignored predictions for unknown examples or labels");
        }
        Ok(builder.build())
    }

    /// Child-given-parent confidences; the parent comes from the file name.
    /// Every dataset example is registered. Rows of unknown examples and
    /// columns that are not an edge of the hierarchy are skipped.
    fn read_edges(&self, files: &[PathBuf], dataset: &BaseDataset) -> Result<EdgeConfidences, IoError> {
        let hierarchy = dataset.hierarchy();
        let mut edges = EdgeConfidences::new();
        for id in dataset.example_ids() {
            edges.add_example(id);
        }

        let mut skipped = BTreeSet::new();
        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let parent = match unit_from_file_name(&name) {
                Some(DatasetUnit::Edge { parent, .. } | DatasetUnit::Parent { parent }) => parent,
                _ => {
                    return Err(IoError::UnrecognisedPredictionFile { path: path.clone() });
                }
            };

            let text = read_text(path)?;
            let columns = confidence_columns(&text, label_of_partial_column);
            for (id, values) in data_rows(path, &text, &columns)? {
                if !dataset.examples().contains_key(id) {
                    skipped.insert(id.to_string());
                    continue;
                }
                for (column, value) in columns.iter().zip(values) {
                    let is_edge = hierarchy
                        .parents_of(&column.label)
                        .is_some_and(|parents| parents.contains(&parent));
                    if !is_edge {
                        skipped.insert(format!("{}|{parent}", column.label));
                        continue;
                    }
                    edges
                        .insert(id, column.label.as_str(), parent.as_str(), value)
                        .map_err(|e| IoError::Decompose {
                            path: path.clone(),
                            source: e,
                        })?;
                }
            }
        }
        if !skipped.is_empty() {
            warn!(n = skipped.len(), "ignored predictions for unknown examples or edges");
        }
        debug!(n_edges = edges.len(), "edge confidences collected");
        Ok(edges)
    }
}

/// Confidence columns of a prediction file, positioned among all attributes.
fn confidence_columns(text: &str, label_of: fn(&str) -> Option<String>) -> Vec<Column> {
    text.lines()
        .map(str::trim)
        .filter(|l| l.to_ascii_uppercase().starts_with("@ATTRIBUTE"))
        .enumerate()
        .filter_map(|(position, line)| {
            let upper = line.to_ascii_uppercase();
            if !upper.ends_with("NUMERIC") {
                return None;
            }
            let name = line["@ATTRIBUTE".len()..line.len() - "NUMERIC".len()].trim();
            label_of(name).map(|label| Column { position, label })
        })
        .collect()
}

/// Data rows as `(example id, confidence per column)`.
fn data_rows<'t>(path: &Path, text: &'t str, columns: &[Column]) -> Result<Vec<(&'t str, Vec<f64>)>, IoError> {
    let mut out = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('@') || line.starts_with('%') {
            continue;
        }
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        let mut values = Vec::with_capacity(columns.len());
        for column in columns {
            let raw = parts.get(column.position).ok_or_else(|| IoError::MalformedLine {
                path: path.to_path_buf(),
                line: index + 1,
                content: line.to_string(),
            })?;
            let value: f64 = raw
                .parse()
                .ok()
                .filter(|v: &f64| v.is_finite())
                .ok_or_else(|| IoError::NonFiniteValue {
                    path: path.to_path_buf(),
                    line: index + 1,
                    raw: (*raw).to_string(),
                })?;
            values.push(value);
        }
        out.push((parts[0], values));
    }
    Ok(out)
}

fn target_of(name: &str) -> &str {
    name.rfind(PREDICTION_MARKER)
        .map_or(name, |i| &name[i + PREDICTION_MARKER.len()..])
}

/// Baseline and complete encodings: `-0` columns are dropped, `-1`
/// columns name the label, tree paths name their last label.
fn label_of_complete_column(name: &str) -> Option<String> {
    let target = target_of(name);
    if target.ends_with("-0") {
        None
    } else if let Some(label) = target.strip_suffix("-1") {
        Some(label.to_string())
    } else if let Some((_, leaf)) = target.rsplit_once('/') {
        Some(leaf.to_string())
    } else {
        Some(target.to_string())
    }
}

/// Partial encodings: only `-1` columns count. A repeated `-1` and a
/// `Label_` prefix added by the classifier are stripped.
fn label_of_partial_column(name: &str) -> Option<String> {
    let label = target_of(name).strip_suffix("-1")?;
    let label = label.strip_suffix("-1").unwrap_or(label);
    let label = label.strip_prefix("Label_").unwrap_or(label);
    Some(label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn complete_column_names() {
        assert_eq!(label_of_complete_column("Original-p-B-1"), Some("B".into()));
        assert_eq!(label_of_complete_column("Original-p-B-0"), None);
        assert_eq!(label_of_complete_column("Pruned-p-A/B"), Some("B".into()));
        assert_eq!(label_of_complete_column("Original-p-C"), Some("C".into()));
    }

    #[test]
    fn partial_column_names() {
        assert_eq!(label_of_partial_column("Original-p-B-1"), Some("B".into()));
        assert_eq!(label_of_partial_column("Original-p-Label_B-1-1"), Some("B".into()));
        assert_eq!(label_of_partial_column("Original-p-B-0"), None);
    }

    #[test]
    fn columns_are_positioned_among_all_attributes() {
        let text = "@RELATION p\n@ATTRIBUTE id string\n@ATTRIBUTE Original-p-A-0 numeric\n@ATTRIBUTE Original-p-A-1 NUMERIC\n@DATA\n";
        let cols = confidence_columns(text, label_of_complete_column);
        assert_eq!(
            cols,
            vec![Column {
                position: 2,
                label: "A".into()
            }]
        );
    }

    #[test]
    fn short_row_is_malformed() {
        let cols = vec![Column {
            position: 3,
            label: "A".into(),
        }];
        let err = data_rows(Path::new("p"), "E1,0.5\n", &cols).unwrap_err();
        assert!(matches!(err, IoError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn only_prediction_files_listed() {
        let dir = TempDir::new().unwrap();
        for name in ["b.pred.arff", "a.pred.arff.zip", "c.pred.arff.gz", "notes.txt", "Train-fold_1.arff"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let files = PredictionReader::new(dir.path()).files().unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pred.arff.zip", "b.pred.arff", "c.pred.arff.gz"]);
    }
}
