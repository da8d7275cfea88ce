//! Criterion benchmarks for hierdec-eval: per-label sweeps and full reports.

use std::collections::BTreeSet;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use hierdec_eval::{
    ConfidenceMatrixBuilder, CurveEvaluator, EvaluationConfig, EvaluationInput, GroundTruth,
};

fn make_input(n_examples: usize, n_labels: usize, seed: u64) -> EvaluationInput {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut builder = ConfidenceMatrixBuilder::new();
    let mut annotations = Vec::with_capacity(n_examples);
    for i in 0..n_examples {
        let example = format!("ex{i:05}");
        let mut labels = Vec::new();
        for l in 0..n_labels {
            let label = format!("L{l:03}");
            let positive = rng.r#gen::<f64>() < 0.2;
            let score: f64 = if positive {
                0.3 + rng.r#gen::<f64>() * 0.7
            } else {
                rng.r#gen::<f64>() * 0.7
            };
            builder.insert(example.clone(), label.clone(), score).unwrap();
            if positive {
                labels.push(label);
            }
        }
        annotations.push((example, labels));
    }
    EvaluationInput::new(builder.build(), GroundTruth::from_annotations(annotations))
}

fn bench_precision_recall(c: &mut Criterion) {
    let input = make_input(2000, 50, 42);
    let evaluator = CurveEvaluator::new(EvaluationConfig::default()).unwrap();

    c.bench_function("pr_curves_2000x50", |b| {
        b.iter(|| evaluator.precision_recall(&input).unwrap());
    });
}

fn bench_report(c: &mut Criterion) {
    let input = make_input(2000, 50, 42);
    let subset: BTreeSet<String> = input.confidences.labels().iter().cloned().collect();
    let evaluator = CurveEvaluator::new(EvaluationConfig::default()).unwrap();

    c.bench_function("tabular_report_2000x50", |b| {
        b.iter(|| evaluator.tabular_report(&input, &subset).unwrap());
    });
}

criterion_group!(benches, bench_precision_recall, bench_report);
criterion_main!(benches);
