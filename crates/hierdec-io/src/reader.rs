//! Hierarchically labelled dataset reader.

use std::path::{Path, PathBuf};

use hierdec_decompose::{BaseDataset, Example};
use hierdec_hierarchy::Annotation;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::archive::read_text;

const CLASS_DECLARATION: &str = "@ATTRIBUTE CLASS HIERARCHICAL";

/// Reads a dataset in the hierarchical attribute-relation text format,
/// plain or zipped.
///
/// Expected layout:
/// - `@RELATION <name>` and `@ATTRIBUTE <name> <type>` header lines
/// - one `@ATTRIBUTE CLASS HIERARCHICAL parent/child,...` declaration
/// - `@DATA`, then one row per example: `id,value,...,label@label@...`
/// - `%` starts a comment line
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::Archive`] | A `.zip` file is corrupt |
/// | [`IoError::MissingHierarchy`] | No class hierarchy declaration |
/// | [`IoError::MalformedLine`] | A data row has no label column |
/// | [`IoError::EmptyDataset`] | Zero data rows |
/// | [`IoError::Decompose`] | Invalid hierarchy, duplicate id or unknown label |
pub struct DatasetReader {
    path: PathBuf,
}

impl DatasetReader {
    /// Create a new reader for the given dataset path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the dataset.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<BaseDataset, IoError> {
        let text = read_text(&self.path)?;

        let mut relation = String::new();
        let mut header = String::new();
        let mut declaration = None;
        let mut examples = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim_end();
            if line.is_empty() || line.starts_with('%') {
                continue;
            }
            let upper = line.to_ascii_uppercase();
            if upper.starts_with(CLASS_DECLARATION) {
                declaration = Some(line[CLASS_DECLARATION.len()..].trim().to_string());
            } else if upper.starts_with("@RELATION") {
                relation = line["@RELATION".len()..].trim().to_string();
                header.push_str(line);
                header.push_str("\n\n");
            } else if upper.starts_with("@ATTRIBUTE") {
                header.push_str(line);
                header.push('\n');
            } else if !line.starts_with('@') {
                examples.push(self.parse_row(line, index + 1)?);
            }
        }

        let declaration = declaration.ok_or_else(|| IoError::MissingHierarchy {
            path: self.path.clone(),
        })?;
        if examples.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }
        debug!(n_rows = examples.len(), "data rows parsed");

        let name = if relation.is_empty() {
            self.stem()
        } else {
            relation
        };
        let dataset = BaseDataset::new(name, header, declaration, examples).map_err(|e| {
            IoError::Decompose {
                path: self.path.clone(),
                source: e,
            }
        })?;

        info!(
            n_examples = dataset.examples().len(),
            n_labels = dataset.hierarchy().labels().len(),
            tree = dataset.hierarchy().is_tree(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    fn parse_row(&self, line: &str, line_no: usize) -> Result<(String, Example), IoError> {
        let malformed = || IoError::MalformedLine {
            path: self.path.clone(),
            line: line_no,
            content: line.to_string(),
        };
        let (id, _) = line.split_once(',').ok_or_else(malformed)?;
        let (attribute_values, labels) = line.rsplit_once(',').ok_or_else(malformed)?;
        let labels: Annotation = labels
            .trim()
            .split('@')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Ok((
            id.trim().to_string(),
            Example {
                attribute_values: attribute_values.to_string(),
                labels,
            },
        ))
    }

    fn stem(&self) -> String {
        let name = self
            .path
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        name.trim_end_matches(".zip")
            .trim_end_matches(".arff")
            .to_string()
    }
}

/// Count the data rows of a dataset without parsing them, e.g. for an
/// unlabelled set.
///
/// # Errors
///
/// Fails if the file cannot be read.
pub fn count_data_rows(path: &Path) -> Result<usize, IoError> {
    let text = read_text(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('@') && !l.starts_with('%'))
        .count())
}
