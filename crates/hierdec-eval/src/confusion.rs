//! Binary confusion counts of one label at one threshold.

use serde::Serialize;

use crate::rounding::round_half_up;

/// Decimals of the derived metrics in the tabular report.
const METRIC_DECIMALS: u32 = 4;

/// True/false positive/negative counts of a binary decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BinaryConfusion {
    /// Predicted and true.
    pub tp: usize,
    /// Predicted but not true.
    pub fp: usize,
    /// Neither predicted nor true.
    pub tn: usize,
    /// True but not predicted.
    #[serde(rename = "fn")]
    pub fn_: usize,
}

impl BinaryConfusion {
    /// Count decisions `confidence >= threshold` against `truth`.
    ///
    /// Confidences are compared as stored, without further rounding.
    #[must_use]
    pub fn at_threshold(confidences: &[f64], truth: &[bool], threshold: f64) -> Self {
        let mut counts = Self::default();
        for (&c, &is_positive) in confidences.iter().zip(truth) {
            match (c >= threshold, is_positive) {
                (true, true) => counts.tp += 1,
                (true, false) => counts.fp += 1,
                (false, false) => counts.tn += 1,
                (false, true) => counts.fn_ += 1,
            }
        }
        counts
    }

    /// TP / (TP + FP), 0.0 without predictions. Rounded to 4 decimals.
    #[must_use]
    pub fn precision(&self) -> f64 {
        rounded_ratio(self.tp, self.tp + self.fp)
    }

    /// TP / (TP + FN), 0.0 without positives. Rounded to 4 decimals.
    #[must_use]
    pub fn recall(&self) -> f64 {
        rounded_ratio(self.tp, self.tp + self.fn_)
    }

    /// Harmonic mean of the rounded precision and recall, 0.0 if both are 0.
    #[must_use]
    pub fn f_measure(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            round_half_up(2.0 * p * r / (p + r), METRIC_DECIMALS)
        }
    }

    /// (TP + TN) / total, 0.0 when there are no examples.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        rounded_ratio(self.tp + self.tn, self.total())
    }

    /// Number of examples counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }
}

fn rounded_ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        round_half_up(num as f64 / den as f64, METRIC_DECIMALS)
    }
}
