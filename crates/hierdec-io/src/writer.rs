//! Writers for every file the pipeline produces.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use hierdec_decompose::{Encoding, FoldDatasets, Folds};
use hierdec_eval::{
    ConfidenceMatrix, CurveKind, CurveSet, EvaluationReport, LabelReportRow, MicroAveragedCurve,
    ReportAverages, round_half_up,
};
use hierdec_hierarchy::DatasetProperties;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::archive::{compress_and_remove, write_zipped};
use crate::fold_file::{self, FOLD_FILE};
use crate::naming::{Split, dataset_file_name};

/// Render a number the way every table of the pipeline shows it: shortest
/// round-trip digits with at least one decimal (`1.0`, `0.25`).
pub(crate) fn decimal(x: f64) -> String {
    format!("{x:?}")
}

/// Writes pipeline outputs below one directory.
///
/// Creates the output directory on construction if it does not exist.
/// Per-encoding files go to `{output_dir}/{Encoding}/`, encoded datasets to
/// `{output_dir}/{Encoding}/Dataset/`.
pub struct ResultWriter {
    output_dir: PathBuf,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display()))]
    pub fn new(output_dir: &Path) -> Result<Self, IoError> {
        create_dir(output_dir)?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// The output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.output_dir
    }

    /// Directory of one encoding's outputs.
    #[must_use]
    pub fn encoding_dir(&self, encoding: Encoding) -> PathBuf {
        self.output_dir.join(encoding.dir_name())
    }

    /// Path of the fold assignment file.
    #[must_use]
    pub fn fold_path(&self) -> PathBuf {
        self.output_dir.join(FOLD_FILE)
    }

    /// Write `Dataset_properties.txt`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_properties(
        &self,
        dataset_name: &str,
        properties: &DatasetProperties,
        attributes: (usize, usize),
        unlabelled: Option<usize>,
    ) -> Result<PathBuf, IoError> {
        let path = self.output_dir.join("Dataset_properties.txt");
        write_file(&path, properties_text(dataset_name, properties, attributes, unlabelled))?;
        info!(path = %path.display(), "dataset properties written");
        Ok(path)
    }

    /// Write the fold assignment to `exampleId2fold.txt`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(n_folds = folds.n_folds()))]
    pub fn write_folds(&self, folds: &Folds) -> Result<PathBuf, IoError> {
        let path = self.fold_path();
        write_file(&path, fold_file::to_text(folds))?;
        info!(path = %path.display(), n_examples = folds.len(), "folds written");
        Ok(path)
    }

    /// Write and compress every dataset of one fold.
    ///
    /// Each dataset is written in plain text, zipped to `<name>.zip`, and the
    /// plain file removed.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::OutputDirCreate`] | The dataset directory cannot be created |
    /// | [`IoError::WriteFile`] | A dataset cannot be written |
    /// | [`IoError::Archive`] | A dataset cannot be compressed |
    #[instrument(skip_all, fields(encoding = %encoding, fold = datasets.fold))]
    pub fn write_fold_datasets(&self, encoding: Encoding, datasets: &FoldDatasets) -> Result<Vec<PathBuf>, IoError> {
        let dir = self.encoding_dir(encoding).join("Dataset");
        create_dir(&dir)?;

        let mut written = Vec::with_capacity(datasets.train.len() + datasets.test.len());
        let splits = [(Split::Train, &datasets.train), (Split::Test, &datasets.test)];
        for (split, encoded) in splits {
            for dataset in encoded {
                let plain = dir.join(dataset_file_name(&dataset.unit, split, datasets.fold));
                write_file(&plain, dataset.to_text())?;
                written.push(compress_and_remove(&plain)?);
            }
        }
        info!(n_files = written.len(), dir = %dir.display(), "fold datasets written");
        Ok(written)
    }

    /// Write `{Encoding}/Confidences.csv.zip`.
    ///
    /// # Errors
    ///
    /// Fails if the directory, the CSV or the archive cannot be written.
    #[instrument(skip_all, fields(encoding = %encoding))]
    pub fn write_confidences(&self, encoding: Encoding, matrix: &ConfidenceMatrix) -> Result<PathBuf, IoError> {
        let dir = self.encoding_dir(encoding);
        create_dir(&dir)?;
        let path = dir.join("Confidences.csv.zip");
        let csv = crate::confidences::to_csv(&path, matrix)?;
        write_zipped(&path, "Confidences.csv", &csv)?;
        info!(path = %path.display(), "confidences written");
        Ok(path)
    }

    /// Write every evaluation output of one encoding: both curve tables,
    /// the micro-averaged curve, the tabular report and a JSON summary.
    ///
    /// # Errors
    ///
    /// Fails if any of the files cannot be written.
    #[instrument(skip_all, fields(encoding = %encoding))]
    pub fn write_evaluation(
        &self,
        dataset_name: &str,
        encoding: Encoding,
        report: &EvaluationReport,
    ) -> Result<Vec<PathBuf>, IoError> {
        let dir = self.encoding_dir(encoding);
        create_dir(&dir)?;

        let mut written = Vec::with_capacity(5);
        for (curves, file) in [
            (&report.precision_recall, "Precision_recall.csv"),
            (&report.roc, "ROC.csv"),
        ] {
            let path = dir.join(format!("{file}.zip"));
            let csv = curves_csv(&path, curves)?;
            write_zipped(&path, file, &csv)?;
            written.push(path);
        }

        let micro = dir.join("Area_under_average_precision_recall_curve.txt");
        write_file(&micro, micro_text(&report.micro))?;
        written.push(micro);

        let table = dir.join("Evaluation_report.csv");
        write_file(&table, report_csv(&table, report)?)?;
        written.push(table);

        let summary = dir.join("Evaluation_summary.json");
        let artifact = SummaryArtifact {
            dataset: dataset_name,
            encoding: encoding.dir_name(),
            thresholds: &report.thresholds,
            averages: report.averages,
            labels: &report.rows,
        };
        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::Serialize {
            path: summary.clone(),
            source: e,
        })?;
        write_file(&summary, json)?;
        written.push(summary);

        info!(
            n_files = written.len(),
            auprc = report.averages.auprc,
            micro_auprc = report.averages.micro_auprc,
            "evaluation written"
        );
        Ok(written)
    }
}

fn create_dir(path: &Path) -> Result<(), IoError> {
    fs::create_dir_all(path).map_err(|e| IoError::OutputDirCreate {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_file(path: &Path, content: impl AsRef<[u8]>) -> Result<(), IoError> {
    fs::write(path, content).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// One column per label, one row per grid point.
fn curves_csv(path: &Path, curves: &CurveSet) -> Result<Vec<u8>, IoError> {
    let csv_err = |source| IoError::CsvWrite {
        path: path.to_path_buf(),
        source,
    };
    let corner = match curves.kind {
        CurveKind::PrecisionRecall => "Recall/Precision for a label",
        CurveKind::Roc => "False positive rate/True positive rate for a label",
    };
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let mut header = vec![corner.to_string()];
    header.extend(curves.labels.iter().map(|c| c.label.clone()));
    wtr.write_record(&header).map_err(csv_err)?;
    for (i, x) in CurveSet::grid_axis().into_iter().enumerate() {
        let mut record = vec![decimal(x)];
        record.extend(curves.labels.iter().map(|c| decimal(c.grid[i])));
        wtr.write_record(&record).map_err(csv_err)?;
    }
    wtr.into_inner().map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e.into_error(),
    })
}

fn micro_text(curve: &MicroAveragedCurve) -> String {
    let mut text = format!(
        "# Area under the average precision recall curve: {}\n# Recall\tPrecision\n",
        decimal(curve.area)
    );
    for &(recall, precision) in &curve.curve {
        let _ = writeln!(text, "{}\t{}", decimal(recall), decimal(precision));
    }
    text
}

fn report_csv(path: &Path, report: &EvaluationReport) -> Result<Vec<u8>, IoError> {
    let csv_err = |source| IoError::CsvWrite {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["Label".to_string()];
    for &t in &report.thresholds {
        let t = decimal(t);
        for metric in ["TP", "FP", "TN", "FN", "Precision", "Recall", "F-measure", "Accuracy"] {
            header.push(format!("{metric}-{t}"));
        }
    }
    header.extend(["AUPRC", "AUC", "Included in averaged measures"].map(String::from));
    wtr.write_record(&header).map_err(csv_err)?;

    for row in &report.rows {
        wtr.write_record(report_record(row)).map_err(csv_err)?;
    }

    let mut bytes = wtr.into_inner().map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e.into_error(),
    })?;
    let averages = format!(
        "\nAverages:\nAUPRC,{}\nAUC,{}\nArea under average precision-recall curve,{}\n",
        decimal(report.averages.auprc),
        decimal(report.averages.auc),
        decimal(report.averages.micro_auprc),
    );
    bytes.extend_from_slice(averages.as_bytes());
    Ok(bytes)
}

fn report_record(row: &LabelReportRow) -> Vec<String> {
    let mut record = vec![row.label.clone()];
    for c in &row.confusion {
        record.extend([
            c.tp.to_string(),
            c.fp.to_string(),
            c.tn.to_string(),
            c.fn_.to_string(),
            decimal(c.precision()),
            decimal(c.recall()),
            decimal(c.f_measure()),
            decimal(c.accuracy()),
        ]);
    }
    record.push(decimal(row.auprc));
    record.push(decimal(row.auc));
    record.push(if row.included_in_averages { "Yes" } else { "No" }.to_string());
    record
}

fn properties_text(
    name: &str,
    p: &DatasetProperties,
    (nominal, numeric): (usize, usize),
    unlabelled: Option<usize>,
) -> String {
    let r = |x: f64| decimal(round_half_up(x, 2));
    let rule = "-".repeat(75);
    let mut t = String::new();
    let _ = writeln!(t, "{rule}\nData set properties for {name}\n{rule}");
    let _ = writeln!(t, "General info\n\tExamples: {}", p.n_examples);
    if let Some(n) = unlabelled {
        let _ = writeln!(t, "\tExamples in unlabelled set: {n}");
    }
    let _ = writeln!(t, "\tAttributes\n\t\tNominal: {nominal}\n\t\tNumeric: {numeric}");

    let _ = writeln!(t, "\nClass hierarchy\n\tLabels: {}\n\tLeaves: {}", p.n_labels, p.n_leaves);
    let _ = writeln!(t, "\tMaximal depth: {}", p.max_depth);
    let _ = writeln!(t, "\tType of hierarchy: {}", if p.is_tree { "tree" } else { "DAG" });
    for (title, s) in [
        ("Forward", &p.forward_branching),
        ("Backward", &p.backward_branching),
    ] {
        let _ = writeln!(
            t,
            "\t{title} branching factor\n\t\tMinimal: {}\n\t\tAverage: {}\n\t\tMaximal: {}",
            r(s.min),
            r(s.mean),
            r(s.max)
        );
    }

    let _ = writeln!(t, "\nAnnotations\n\tMost specific labels: {}\n\tCardinality", p.n_most_specific_labels);
    let _ = writeln!(t, "\t\tComplete hierarchy decomposition algorithms: {}", r(p.cardinality_complete));
    let _ = writeln!(
        t,
        "\t\tHierarchical algorithms (baseline and partial hierarchy decomposition algorithms): {}",
        r(p.cardinality_hierarchical)
    );
    let _ = writeln!(t, "\t\tData set: {}\n\t\tLeaf labels: {}", r(p.cardinality), r(p.cardinality_leaves));
    let _ = writeln!(
        t,
        "\tIncomplete paths\n\t\tIncomplete paths (the most specific annotation is not a leaf label): {}",
        p.incomplete_paths
    );
    let _ = writeln!(t, "\t\tTotal number of paths: {}", p.total_paths);
    let _ = writeln!(t, "\t\tShare of incomplete paths: {}%", r(p.incomplete_path_share()));
    t
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct SummaryArtifact<'a> {
    dataset: &'a str,
    encoding: &'a str,
    thresholds: &'a [f64],
    averages: ReportAverages,
    labels: &'a [LabelReportRow],
}

#[cfg(test)]
mod tests {
    use super::*;
    use hierdec_eval::BinaryConfusion;
    use hierdec_hierarchy::Summary;

    #[test]
    fn decimals_keep_a_fraction_digit() {
        assert_eq!(decimal(1.0), "1.0");
        assert_eq!(decimal(0.25), "0.25");
        assert_eq!(decimal(0.0001), "0.0001");
    }

    #[test]
    fn report_record_layout() {
        let row = LabelReportRow {
            label: "B".into(),
            confusion: vec![BinaryConfusion {
                tp: 1,
                fp: 0,
                tn: 2,
                fn_: 1,
            }],
            auprc: 0.75,
            auc: 1.0,
            included_in_averages: true,
        };
        assert_eq!(
            report_record(&row),
            vec!["B", "1", "0", "2", "1", "1.0", "0.5", "0.6667", "0.75", "0.75", "1.0", "Yes"]
        );
    }

    #[test]
    fn properties_layout() {
        let p = DatasetProperties {
            n_examples: 4,
            n_labels: 4,
            n_leaves: 3,
            max_depth: 2,
            is_tree: true,
            forward_branching: Summary {
                min: 1.0,
                mean: 2.0,
                max: 2.0,
            },
            backward_branching: Summary {
                min: 1.0,
                mean: 1.0,
                max: 1.0,
            },
            n_most_specific_labels: 4,
            cardinality_complete: 1.0,
            cardinality_hierarchical: 1.5,
            cardinality: 1.5,
            cardinality_leaves: 0.75,
            incomplete_paths: 1,
            total_paths: 3,
        };
        let text = properties_text("toy", &p, (1, 1), Some(7));
        assert!(text.starts_with(&format!("{}\nData set properties for toy\n", "-".repeat(75))));
        assert!(text.contains("\tExamples: 4\n\tExamples in unlabelled set: 7\n"));
        assert!(text.contains("\tType of hierarchy: tree\n"));
        assert!(text.contains("\tForward branching factor\n\t\tMinimal: 1.0\n\t\tAverage: 2.0\n"));
        assert!(text.ends_with("\t\tShare of incomplete paths: 33.33%\n"));
    }

    #[test]
    fn micro_layout() {
        let curve = MicroAveragedCurve {
            labels: vec!["A".into()],
            knots: vec![(0.0, 1.0), (1.0, 1.0)],
            curve: vec![(0.0, 1.0), (1.0, 1.0)],
            area: 1.0,
        };
        assert_eq!(
            micro_text(&curve),
            "# Area under the average precision recall curve: 1.0\n# Recall\tPrecision\n0.0\t1.0\n1.0\t1.0\n"
        );
    }
}
