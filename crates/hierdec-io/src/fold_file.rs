//! The example-to-fold assignment file.

use std::path::Path;

use hierdec_decompose::Folds;
use tracing::{info, instrument};

use crate::IoError;
use crate::archive::read_text;

/// File name of the fold assignment, relative to the output directory.
pub const FOLD_FILE: &str = "exampleId2fold.txt";

/// Render `folds` as `#Example ID\tFold` followed by one line per example.
pub(crate) fn to_text(folds: &Folds) -> String {
    let mut text = String::from("#Example ID\tFold\n");
    for (id, fold) in folds.iter() {
        text.push_str(id);
        text.push('\t');
        text.push_str(&fold.to_string());
        text.push('\n');
    }
    text
}

/// Read a fold assignment file. Lines starting with `#` are comments.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::MalformedLine`] | A line is not `id<TAB>fold` |
/// | [`IoError::Decompose`] | A fold number is 0 |
#[instrument(fields(path = %path.display()))]
pub fn read_folds(path: &Path) -> Result<Folds, IoError> {
    let text = read_text(path)?;
    let mut assignments = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parsed = line
            .split_once('\t')
            .and_then(|(id, fold)| Some((id.trim().to_string(), fold.trim().parse::<usize>().ok()?)));
        let Some(assignment) = parsed else {
            return Err(IoError::MalformedLine {
                path: path.to_path_buf(),
                line: index + 1,
                content: line.to_string(),
            });
        };
        assignments.push(assignment);
    }
    let folds = Folds::from_assignments(assignments).map_err(|e| IoError::Decompose {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!(n_examples = folds.len(), n_folds = folds.n_folds(), "folds loaded");
    Ok(folds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn text_layout_and_read_back() {
        let folds = Folds::from_assignments(vec![("b".to_string(), 2), ("a".to_string(), 1)]).unwrap();
        let text = to_text(&folds);
        assert_eq!(text, "#Example ID\tFold\na\t1\nb\t2\n");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FOLD_FILE);
        fs::write(&path, text).unwrap();
        assert_eq!(read_folds(&path).unwrap(), folds);
    }

    #[test]
    fn malformed_line_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FOLD_FILE);
        fs::write(&path, "#Example ID\tFold\na\t1\nb two\n").unwrap();
        let err = read_folds(&path).unwrap_err();
        assert!(matches!(err, IoError::MalformedLine { line: 3, .. }), "{err:?}");
    }

    #[test]
    fn fold_zero_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FOLD_FILE);
        fs::write(&path, "a\t0\n").unwrap();
        assert!(matches!(read_folds(&path), Err(IoError::Decompose { .. })));
    }
}
