//! The example x label confidence table, stored as zipped CSV.

use std::path::Path;

use hierdec_eval::{ConfidenceMatrix, ConfidenceMatrixBuilder};
use tracing::{info, instrument};

use crate::IoError;
use crate::archive::read_text;
use crate::writer::decimal;

/// Corner cell of the confidence table header.
pub const CONFIDENCE_HEADER: &str = "Example ID/Confidence for a label";

/// Render `matrix` as CSV: one column per label, one row per example.
pub(crate) fn to_csv(path: &Path, matrix: &ConfidenceMatrix) -> Result<Vec<u8>, IoError> {
    let csv_err = |source| IoError::CsvWrite {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let mut header = vec![CONFIDENCE_HEADER.to_string()];
    header.extend(matrix.labels().iter().cloned());
    wtr.write_record(&header).map_err(csv_err)?;
    for (example, values) in matrix.rows() {
        let mut record = vec![example.to_string()];
        record.extend(values.into_iter().map(decimal));
        wtr.write_record(&record).map_err(csv_err)?;
    }
    wtr.into_inner().map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e.into_error(),
    })
}

/// Read a confidence table written by
/// [`ResultWriter::write_confidences`](crate::ResultWriter::write_confidences).
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] / [`IoError::Archive`] | File cannot be read |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::NonFiniteValue`] | A cell is not a number |
/// | [`IoError::Confidence`] | A value lies outside `[0, 1]` |
#[instrument(fields(path = %path.display()))]
pub fn read_confidences(path: &Path) -> Result<ConfidenceMatrix, IoError> {
    let text = read_text(path)?;
    let csv_err = |e: csv::Error| IoError::CsvParse {
        path: path.to_path_buf(),
        offset: e.position().map_or(0, csv::Position::byte),
        source: e,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let labels: Vec<String> = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .skip(1)
        .map(str::to_string)
        .collect();

    let mut builder = ConfidenceMatrixBuilder::new();
    for label in &labels {
        builder.add_label(label.as_str());
    }
    for (row_index, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let example = record.get(0).unwrap_or_default();
        builder.add_example(example);
        for (label, raw) in labels.iter().zip(record.iter().skip(1)) {
            let value: f64 = raw.trim().parse().map_err(|_| IoError::NonFiniteValue {
                path: path.to_path_buf(),
                line: row_index + 2,
                raw: raw.to_string(),
            })?;
            builder
                .insert(example, label.as_str(), value)
                .map_err(|e| IoError::Confidence {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }
    let matrix = builder.build();
    info!(n_examples = matrix.n_examples(), n_labels = matrix.n_labels(), "confidences loaded");
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn table_reads_back_unchanged() {
        let mut b = ConfidenceMatrixBuilder::new();
        b.insert("e2", "B", 0.5).unwrap();
        b.insert("e1", "A", 0.25).unwrap();
        b.add_label("C");
        let matrix = b.build();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Confidences.csv");
        let bytes = to_csv(&path, &matrix).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("Example ID/Confidence for a label,A,B,C\n"));
        assert!(text.contains("e1,0.25,0.0,0.0\n"));

        fs::write(&path, bytes).unwrap();
        assert_eq!(read_confidences(&path).unwrap(), matrix);
    }

    #[test]
    fn non_numeric_cell_reports_its_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "Example ID/Confidence for a label,A\ne1,0.5\ne2,high\n").unwrap();
        let err = read_confidences(&path).unwrap_err();
        assert!(matches!(err, IoError::NonFiniteValue { line: 3, .. }), "{err:?}");
    }

    #[test]
    fn out_of_range_cell_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "Example ID/Confidence for a label,A\ne1,1.5\n").unwrap();
        assert!(matches!(read_confidences(&path), Err(IoError::Confidence { .. })));
    }
}
