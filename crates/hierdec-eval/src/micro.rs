//! Micro-averaged precision-recall curve over a label subset.
//!
//! Built in two steps. Each label first gets a sparse table of
//! (TP, FP, FN) counts keyed by the distinct thresholds its own confidences
//! take at 2 decimals. Those tables are then aligned on the shared
//! `0.00..=1.00` grid with a "nearest threshold at or above" lookup, never by
//! interpolating counts, and summed. The grid points visited are those where
//! any label of the matrix has a threshold, subset member or not.

use std::collections::{BTreeMap, BTreeSet};

use crate::curve::{AREA_DECIMALS, anchored_knots, grid_key, resample, trapezoid_area};
use crate::rounding::round_half_up;

/// Decimals of micro-averaged thresholds, precision and recall.
const MICRO_DECIMALS: u32 = 2;
/// Micro grid resolution: `0.00, 0.01, ..., 1.00`.
const MICRO_STEPS: u32 = 100;

/// Aggregated counts at one threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Counts {
    pub tp: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl std::ops::AddAssign for Counts {
    fn add_assign(&mut self, rhs: Self) {
        self.tp += rhs.tp;
        self.fp += rhs.fp;
        self.fn_ += rhs.fn_;
    }
}

/// Sparse per-label counts keyed by threshold in hundredths.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LabelCounts {
    positives: usize,
    by_threshold: BTreeMap<u32, Counts>,
}

impl LabelCounts {
    /// Count TP/FP/FN at every distinct 2-decimal confidence of one label.
    pub(crate) fn sweep(confidences: &[f64], truth: &[bool]) -> Self {
        let keys: Vec<(u32, bool)> = confidences
            .iter()
            .zip(truth)
            .map(|(&c, &t)| (grid_key(round_half_up(c, MICRO_DECIMALS), MICRO_STEPS), t))
            .collect();
        let positives = keys.iter().filter(|(_, t)| *t).count();
        let thresholds: BTreeSet<u32> = keys.iter().map(|&(k, _)| k).collect();

        let by_threshold = thresholds
            .into_iter()
            .map(|t| {
                let mut counts = Counts::default();
                for &(k, is_positive) in &keys {
                    match (k >= t, is_positive) {
                        (true, true) => counts.tp += 1,
                        (true, false) => counts.fp += 1,
                        (false, true) => counts.fn_ += 1,
                        (false, false) => {}
                    }
                }
                (t, counts)
            })
            .collect();

        Self {
            positives,
            by_threshold,
        }
    }

    /// Thresholds, in hundredths, at which this label has counts.
    pub(crate) fn thresholds(&self) -> impl Iterator<Item = u32> + '_ {
        self.by_threshold.keys().copied()
    }

    /// Counts at `t`, or at the nearest higher threshold this label has.
    /// Above every score nothing is selected, so all positives are missed.
    fn at_or_above(&self, t: u32) -> Counts {
        self.by_threshold
            .range(t..)
            .next()
            .map_or(
                Counts {
                    tp: 0,
                    fp: 0,
                    fn_: self.positives,
                },
                |(_, &c)| c,
            )
    }
}

/// The micro-averaged precision-recall curve and its area.
#[derive(Debug, Clone, PartialEq)]
pub struct MicroAveragedCurve {
    /// Labels that contributed counts, sorted.
    pub labels: Vec<String>,
    /// Max-precision-per-recall points plus the recall 0 and 1 anchors.
    pub knots: Vec<(f64, f64)>,
    /// Precision at recall `0.00, 0.01, ..., 1.00`, rounded to 2 decimals.
    pub curve: Vec<(f64, f64)>,
    /// Trapezoidal area under the interpolated curve, rounded to 4 decimals.
    pub area: f64,
}

/// Sum aligned per-label counts at every grid point in `thresholds` and
/// build the micro-averaged curve.
pub(crate) fn micro_average(
    labels: Vec<String>,
    counts: &[LabelCounts],
    thresholds: &BTreeSet<u32>,
) -> MicroAveragedCurve {
    let mut envelope: BTreeMap<u32, f64> = BTreeMap::new();
    for t in (0..=MICRO_STEPS).filter(|t| thresholds.contains(t)) {
        let mut total = Counts::default();
        for label in counts {
            total += label.at_or_above(t);
        }
        let precision = ratio(total.tp, total.tp + total.fp);
        let recall = ratio(total.tp, total.tp + total.fn_);
        let entry = envelope
            .entry(grid_key(recall, MICRO_STEPS))
            .or_insert(precision);
        if precision > *entry {
            *entry = precision;
        }
    }

    let knots = anchored_knots(envelope, MICRO_STEPS);
    let values = resample(&knots, MICRO_STEPS, MICRO_DECIMALS);
    let curve = values
        .into_iter()
        .enumerate()
        .map(|(i, p)| (f64::from(i as u32) / f64::from(MICRO_STEPS), p))
        .collect();
    let area = round_half_up(trapezoid_area(&knots), AREA_DECIMALS);

    MicroAveragedCurve {
        labels,
        knots,
        curve,
        area,
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        round_half_up(num as f64 / den as f64, MICRO_DECIMALS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn own_thresholds(counts: &[LabelCounts]) -> BTreeSet<u32> {
        counts.iter().flat_map(|c| c.thresholds()).collect()
    }

    #[test]
    fn sweep_counts_per_distinct_threshold() {
        let c = LabelCounts::sweep(&[0.9, 0.404, 0.2], &[true, false, true]);
        assert_eq!(c.positives, 2);
        let keys: Vec<u32> = c.by_threshold.keys().copied().collect();
        assert_eq!(keys, vec![20, 40, 90]);
        assert_eq!(c.by_threshold[&40], Counts { tp: 1, fp: 1, fn_: 1 });
        assert_eq!(c.by_threshold[&20], Counts { tp: 2, fp: 1, fn_: 0 });
    }

    #[test]
    fn lookup_falls_forward_to_next_threshold() {
        let c = LabelCounts::sweep(&[0.9, 0.4], &[true, false]);
        // 0.5 is not a threshold of this label: use 0.9.
        assert_eq!(c.at_or_above(50), Counts { tp: 1, fp: 0, fn_: 0 });
        // Nothing above 0.95.
        assert_eq!(c.at_or_above(95), Counts { tp: 0, fp: 0, fn_: 1 });
    }

    #[test]
    fn perfect_labels_give_unit_area() {
        let a = LabelCounts::sweep(&[1.0, 0.0], &[true, false]);
        let b = LabelCounts::sweep(&[0.8, 0.1], &[true, false]);
        let counts = [a, b];
        let curve = micro_average(vec!["A".into(), "B".into()], &counts, &own_thresholds(&counts));
        assert_eq!(curve.area, 1.0);
        assert_eq!(curve.curve.len(), 101);
        assert!(curve.curve.iter().all(|&(_, p)| p == 1.0));
    }

    #[test]
    fn aligned_sum_across_labels() {
        // A: positive at 0.6, negative at 0.3. B: positive at 0.3.
        let a = LabelCounts::sweep(&[0.6, 0.3], &[true, false]);
        let b = LabelCounts::sweep(&[0.3], &[true]);
        let counts = [a, b];
        let curve = micro_average(vec!["A".into(), "B".into()], &counts, &own_thresholds(&counts));
        // t=0.30: A (1,1,0) + B (1,0,0) -> P 0.67, R 1.0
        // t=0.60: A (1,0,0) + B above all (0,0,1) -> P 1.0, R 0.5
        assert_eq!(curve.knots, vec![(0.0, 1.0), (0.5, 1.0), (1.0, 0.67)]);
        assert_eq!(curve.curve[75].1, 0.84);
    }

    #[test]
    fn no_labels_gives_flat_zero() {
        let curve = micro_average(Vec::new(), &[], &BTreeSet::new());
        assert_eq!(curve.knots, vec![(0.0, 0.0), (1.0, 0.0)]);
        assert_eq!(curve.area, 0.0);
    }

    #[test]
    fn thresholds_of_labels_outside_the_subset_add_grid_points() {
        // Subset label A: positive at 0.6, negative at 0.3.
        let a = LabelCounts::sweep(&[0.6, 0.3], &[true, false]);
        let alone = micro_average(vec!["A".into()], &[a.clone()], &own_thresholds(&[a.clone()]));
        assert_eq!(alone.knots, vec![(0.0, 1.0), (1.0, 1.0)]);
        assert_eq!(alone.area, 1.0);

        // Another label scores 0.9: above A's scores nothing is selected.
        let z = LabelCounts::sweep(&[0.9], &[false]);
        let thresholds = own_thresholds(&[a.clone(), z]);
        let curve = micro_average(vec!["A".into()], &[a], &thresholds);
        assert_eq!(curve.knots, vec![(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(curve.area, 0.5);
    }
}
