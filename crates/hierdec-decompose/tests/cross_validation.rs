//! Cross-validation behaviour of the decompositions on a small DAG dataset.

use std::collections::BTreeSet;

use hierdec_decompose::{
    BaseDataset, ConfidenceReconciler, DatasetUnit, DecompositionEngine, EdgeConfidences, Encoding,
    Example, FoldAssignment,
};
use hierdec_hierarchy::{LabelSubset, ROOT};

const HEADER: &str = "@RELATION dag\n\n@ATTRIBUTE id string\n@ATTRIBUTE f numeric\n";
const DECLARATION: &str = "root/A,root/B,A/C,B/C,C/D";

fn dataset() -> BaseDataset {
    let annotations: [&[&str]; 8] = [
        &["A"],
        &["B"],
        &["A", "B", "C"],
        &["A", "B", "C", "D"],
        &["A"],
        &["B"],
        &["A", "B", "C"],
        &["A", "C"],
    ];
    let examples = annotations.iter().enumerate().map(|(i, labels)| {
        let id = format!("E{i}");
        (
            id.clone(),
            Example {
                attribute_values: format!("{id},{i}.0"),
                labels: labels.iter().map(|l| l.to_string()).collect(),
            },
        )
    });
    BaseDataset::new("dag", HEADER, DECLARATION, examples).unwrap()
}

// ---------------------------------------------------------------------------
// Fold coverage
// ---------------------------------------------------------------------------

#[test]
fn every_example_is_tested_exactly_once() {
    let d = dataset();
    let folds = FoldAssignment::new(4).unwrap().with_seed(3).assign(d.example_ids()).unwrap();
    let engine = DecompositionEngine::new(&d, LabelSubset::MostSpecific);

    let mut tested = Vec::new();
    for fold in 1..=folds.n_folds() {
        let datasets = engine.encode_fold(&folds, fold, Encoding::Baseline).unwrap();
        let test = &datasets.test[0];
        tested.extend(test.rows.iter().map(|r| r.split(',').next().unwrap().to_string()));
        assert_eq!(datasets.train[0].rows.len() + test.rows.len(), 8);
    }
    tested.sort();
    let all: Vec<String> = d.example_ids().map(str::to_string).collect();
    assert_eq!(tested, all);
}

#[test]
fn partial_training_sets_keep_only_parent_carriers() {
    let d = dataset();
    let folds = FoldAssignment::new(2).unwrap().assign(d.example_ids()).unwrap();
    let engine = DecompositionEngine::new(&d, LabelSubset::MostSpecific);
    let datasets = engine.encode_fold(&folds, 1, Encoding::ChildVsParentLabel).unwrap();

    for encoded in &datasets.train {
        let DatasetUnit::Edge { parent, .. } = &encoded.unit else {
            panic!("unexpected unit {:?}", encoded.unit);
        };
        for row in &encoded.rows {
            let id = row.split(',').next().unwrap();
            if parent != ROOT {
                assert!(d.examples()[id].labels.contains(parent), "{id} lacks {parent}");
            }
        }
    }
    // The DAG baseline keeps the declaration and "@"-joined labels.
    let baseline = engine.encode_fold(&folds, 1, Encoding::Baseline).unwrap();
    assert!(baseline.test[0].header.ends_with(&format!("@ATTRIBUTE CLASS HIERARCHICAL {DECLARATION}\n")));
}

// ---------------------------------------------------------------------------
// Reconciliation over the DAG
// ---------------------------------------------------------------------------

#[test]
fn perfect_edges_reconcile_to_the_annotations() {
    let d = dataset();
    let mut edges = EdgeConfidences::new();
    for (id, example) in d.examples() {
        for (parent, child) in d.hierarchy().edges() {
            let given = parent == ROOT || example.labels.contains(parent);
            let value = if given && example.labels.contains(child) { 1.0 } else { 0.0 };
            edges.insert(id.as_str(), child, parent, value).unwrap();
        }
    }

    let matrix = ConfidenceReconciler::new(d.hierarchy()).reconcile(&edges).unwrap();
    for (id, example) in d.examples() {
        let ones: BTreeSet<String> = matrix
            .labels()
            .iter()
            .filter(|l| matrix.get(id, l) == Some(1.0))
            .cloned()
            .collect();
        // C needs both A and B: an example with only A then C scores 0 on C.
        let consistent: BTreeSet<String> = example
            .labels
            .iter()
            .filter(|l| {
                d.hierarchy()
                    .paths_to_root(l)
                    .unwrap()
                    .iter()
                    .all(|path| path.iter().all(|step| step == ROOT || example.labels.contains(step)))
            })
            .cloned()
            .collect();
        assert_eq!(ones, consistent, "{id}");
    }
    assert_eq!(matrix.get("E7", "C"), Some(0.0));
    assert_eq!(matrix.get("E3", "D"), Some(1.0));
}
