//! Per-label threshold sweep for precision-recall and ROC curves.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::rounding::round_half_up;

/// Decimals of sweep thresholds and curve coordinates.
const CURVE_DECIMALS: u32 = 3;
/// Decimals of reported areas.
pub(crate) const AREA_DECIMALS: u32 = 4;
/// Grid resolution: points are `i / GRID_STEPS` for `i in 0..=GRID_STEPS`.
const GRID_STEPS: u32 = 1000;

/// Which curve a sweep produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CurveKind {
    /// Precision as a function of recall.
    PrecisionRecall,
    /// True-positive rate as a function of false-positive rate.
    Roc,
}

impl CurveKind {
    /// Column header of the x axis in tabular output.
    #[must_use]
    pub fn x_axis(self) -> &'static str {
        match self {
            Self::PrecisionRecall => "Recall",
            Self::Roc => "False positive rate",
        }
    }
}

/// The curve of one label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelCurve {
    /// The label.
    pub label: String,
    /// Envelope points plus the `x = 0` and `x = 1` anchors, sorted by x.
    pub knots: Vec<(f64, f64)>,
    /// Curve value at each of the 1001 grid points, rounded to 3 decimals.
    pub grid: Vec<f64>,
    /// Trapezoidal area under the interpolated curve, rounded to 4 decimals.
    pub area: f64,
}

/// Curves of every label, ordered by label.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSet {
    /// The curve type.
    pub kind: CurveKind,
    /// One curve per label.
    pub labels: Vec<LabelCurve>,
}

impl CurveSet {
    /// The shared grid of x values, `0.000, 0.001, ..., 1.000`.
    #[must_use]
    pub fn grid_axis() -> Vec<f64> {
        (0..=GRID_STEPS)
            .map(|i| f64::from(i) / f64::from(GRID_STEPS))
            .collect()
    }

    /// Area of `label`, if present.
    #[must_use]
    pub fn area(&self, label: &str) -> Option<f64> {
        self.labels
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.area)
    }
}

/// Integer key of a value already rounded to `steps` resolution.
pub(crate) fn grid_key(x: f64, steps: u32) -> u32 {
    (x * f64::from(steps)).round() as u32
}

/// Sweep one label's confidences and build its curve.
///
/// `confidences` and `truth` are aligned by example.
pub(crate) fn sweep_label(kind: CurveKind, label: &str, confidences: &[f64], truth: &[bool]) -> LabelCurve {
    let mut positives: Vec<u32> = Vec::new();
    let mut negatives: Vec<u32> = Vec::new();
    for (&c, &is_positive) in confidences.iter().zip(truth) {
        let key = grid_key(round_half_up(c, CURVE_DECIMALS), GRID_STEPS);
        if is_positive {
            positives.push(key);
        } else {
            negatives.push(key);
        }
    }

    let all_zero = positives.iter().chain(&negatives).all(|&k| k == 0);
    if all_zero || (kind == CurveKind::PrecisionRecall && positives.is_empty()) {
        return flat_zero(label);
    }

    positives.sort_unstable();
    negatives.sort_unstable();
    let at_or_above = |sorted: &[u32], t: u32| sorted.len() - sorted.partition_point(|&k| k < t);

    let mut thresholds: BTreeSet<u32> = positives.iter().chain(&negatives).copied().collect();
    thresholds.insert(0);
    thresholds.insert(GRID_STEPS);

    let n_pos = positives.len();
    let n_neg = negatives.len();
    let mut envelope: BTreeMap<u32, f64> = BTreeMap::new();
    for t in thresholds {
        let tp = at_or_above(&positives, t);
        let fp = at_or_above(&negatives, t);
        let (x, y) = match kind {
            CurveKind::PrecisionRecall => {
                // An empty selection carries no precision information.
                if tp + fp == 0 {
                    continue;
                }
                (ratio(tp, n_pos), ratio(tp, tp + fp))
            }
            CurveKind::Roc => (ratio(fp, n_neg), ratio(tp, n_pos)),
        };
        let entry = envelope.entry(grid_key(x, GRID_STEPS)).or_insert(y);
        if y > *entry {
            *entry = y;
        }
    }

    let knots = anchored_knots(envelope, GRID_STEPS);
    curve_from_knots(label, knots)
}

/// `num / den` rounded to the curve resolution, 0 when `den` is 0.
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        round_half_up(num as f64 / den as f64, CURVE_DECIMALS)
    }
}

fn flat_zero(label: &str) -> LabelCurve {
    curve_from_knots(label, vec![(0.0, 0.0), (1.0, 0.0)])
}

/// Add the `x = 0` and `x = 1` anchors to an envelope keyed in `1 / steps`
/// units and convert it to coordinates.
pub(crate) fn anchored_knots(mut envelope: BTreeMap<u32, f64>, steps: u32) -> Vec<(f64, f64)> {
    let first = envelope.first_key_value().map(|(_, &y)| y);
    let last = envelope.last_key_value().map(|(_, &y)| y);
    match (first, last) {
        (Some(first), Some(last)) => {
            envelope.entry(0).or_insert(first);
            envelope.entry(steps).or_insert(last);
        }
        _ => {
            envelope.insert(0, 0.0);
            envelope.insert(steps, 0.0);
        }
    }
    envelope
        .into_iter()
        .map(|(k, y)| (f64::from(k) / f64::from(steps), y))
        .collect()
}

/// Exact trapezoid integral of the piecewise-linear curve through `knots`.
pub(crate) fn trapezoid_area(knots: &[(f64, f64)]) -> f64 {
    knots
        .windows(2)
        .map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0)
        .sum()
}

/// Resample `knots` onto `0..=steps` grid points by linear interpolation.
/// Knot values are kept as-is; interpolated values are rounded.
pub(crate) fn resample(knots: &[(f64, f64)], steps: u32, decimals: u32) -> Vec<f64> {
    let keys: Vec<u32> = knots.iter().map(|&(x, _)| grid_key(x, steps)).collect();
    let mut segment = 0;
    (0..=steps)
        .map(|i| {
            while segment + 1 < keys.len() && keys[segment + 1] < i {
                segment += 1;
            }
            if keys.get(segment) == Some(&i) {
                return round_half_up(knots[segment].1, decimals);
            }
            if keys.get(segment + 1) == Some(&i) {
                return round_half_up(knots[segment + 1].1, decimals);
            }
            match (knots.get(segment), knots.get(segment + 1)) {
                (Some(&(x0, y0)), Some(&(x1, y1))) if x1 > x0 => {
                    let x = f64::from(i) / f64::from(steps);
                    round_half_up(y0 + (y1 - y0) * (x - x0) / (x1 - x0), decimals)
                }
                (Some(&(_, y0)), _) => round_half_up(y0, decimals),
                _ => 0.0,
            }
        })
        .collect()
}

fn curve_from_knots(label: &str, knots: Vec<(f64, f64)>) -> LabelCurve {
    let grid = resample(&knots, GRID_STEPS, CURVE_DECIMALS);
    let area = round_half_up(trapezoid_area(&knots), AREA_DECIMALS);
    LabelCurve {
        label: label.to_string(),
        knots,
        grid,
        area,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_separation_has_unit_auprc() {
        let conf = [1.0, 1.0, 0.0, 0.0, 0.0];
        let truth = [true, true, false, false, false];
        let c = sweep_label(CurveKind::PrecisionRecall, "A", &conf, &truth);
        assert_eq!(c.area, 1.0);
        assert!(c.grid.iter().all(|&p| p == 1.0));
        let roc = sweep_label(CurveKind::Roc, "A", &conf, &truth);
        assert_eq!(roc.area, 1.0);
    }

    #[test]
    fn single_positive_single_negative() {
        let c = sweep_label(CurveKind::PrecisionRecall, "A", &[0.9, 0.3], &[true, false]);
        assert_eq!(c.knots, vec![(0.0, 1.0), (1.0, 1.0)]);
        assert_eq!(c.area, 1.0);
    }

    #[test]
    fn no_positives_gives_flat_zero_pr_curve() {
        let c = sweep_label(CurveKind::PrecisionRecall, "A", &[0.9, 0.3], &[false, false]);
        assert_eq!(c.knots, vec![(0.0, 0.0), (1.0, 0.0)]);
        assert_eq!(c.area, 0.0);
        assert_eq!(c.grid.len(), 1001);
    }

    #[test]
    fn all_zero_confidences_give_flat_zero_curve() {
        let c = sweep_label(CurveKind::Roc, "A", &[0.0, 0.0], &[true, false]);
        assert_eq!(c.area, 0.0);
        assert!(c.grid.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn envelope_keeps_max_precision_per_recall() {
        // Scores: P 0.8, N 0.6, P 0.4, N 0.2.
        let conf = [0.8, 0.6, 0.4, 0.2];
        let truth = [true, false, true, false];
        let c = sweep_label(CurveKind::PrecisionRecall, "A", &conf, &truth);
        // t=0.8 -> (0.5, 1.0); t=0.6 -> (0.5, 0.5); t=0.4 -> (1.0, 0.667);
        // t<=0.2 -> (1.0, 0.5).
        assert_eq!(c.knots, vec![(0.0, 1.0), (0.5, 1.0), (1.0, 0.667)]);
        let expected = round_half_up(0.5 + 0.5 * (1.0 + 0.667) / 2.0, 4);
        assert_eq!(c.area, expected);
        assert!((c.area - 0.91675).abs() < 1e-4);
        assert_eq!(c.grid[750], round_half_up(1.0 + (0.667 - 1.0) * 0.5, 3));
    }

    #[test]
    fn roc_of_interleaved_scores() {
        let conf = [0.8, 0.6, 0.4, 0.2];
        let truth = [true, false, true, false];
        let c = sweep_label(CurveKind::Roc, "A", &conf, &truth);
        assert_eq!(
            c.knots,
            vec![(0.0, 0.5), (0.5, 1.0), (1.0, 1.0)]
        );
        assert_eq!(c.area, 0.875);
    }

    #[test]
    fn thresholds_use_three_decimals() {
        // 0.1234 and 0.1226 both round to 0.123 and tie.
        let c = sweep_label(CurveKind::Roc, "A", &[0.1234, 0.1226], &[true, false]);
        assert_eq!(c.knots, vec![(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(c.area, 0.5);
    }

    #[test]
    fn resample_interpolates_between_knots() {
        let grid = resample(&[(0.0, 0.0), (1.0, 1.0)], 10, 3);
        assert_eq!(grid, vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]);
    }

    #[test]
    fn grid_axis_spans_unit_interval() {
        let axis = CurveSet::grid_axis();
        assert_eq!(axis.len(), 1001);
        assert_eq!(axis[0], 0.0);
        assert_eq!(axis[500], 0.5);
        assert_eq!(axis[1000], 1.0);
    }
}
