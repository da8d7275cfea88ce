//! Cross-validation fold assignment.

use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument};

use crate::error::DecomposeError;

/// Fold assignment settings.
///
/// Construct via [`FoldAssignment::new`], then chain `with_seed` if desired.
#[derive(Debug, Clone)]
pub struct FoldAssignment {
    n_folds: usize,
    seed: u64,
}

impl FoldAssignment {
    /// Create an assignment into `n_folds` folds.
    ///
    /// # Errors
    ///
    /// Returns [`DecomposeError::InvalidFoldCount`] if `n_folds` < 2.
    pub fn new(n_folds: usize) -> Result<Self, DecomposeError> {
        if n_folds < 2 {
            return Err(DecomposeError::InvalidFoldCount { n_folds });
        }
        Ok(Self { n_folds, seed: 42 })
    }

    /// Set the random seed for shuffling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of folds.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Shuffle `ids` and deal them round-robin into folds `1..=n_folds`.
    ///
    /// Ids are sorted before shuffling, so the result depends only on the
    /// id set and the seed. Fold sizes differ by at most one.
    ///
    /// # Errors
    ///
    /// Returns [`DecomposeError::TooFewExamples`] if there are fewer distinct
    /// ids than folds.
    #[instrument(skip_all, fields(n_folds = self.n_folds, seed = self.seed))]
    pub fn assign<'a, I>(&self, ids: I) -> Result<Folds, DecomposeError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unique: BTreeSet<&str> = ids.into_iter().collect();
        if unique.len() < self.n_folds {
            return Err(DecomposeError::TooFewExamples {
                n_examples: unique.len(),
                n_folds: self.n_folds,
            });
        }

        let mut order: Vec<&str> = unique.into_iter().collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        order.shuffle(&mut rng);

        let by_example: BTreeMap<String, usize> = order
            .into_iter()
            .enumerate()
            .map(|(i, id)| (id.to_string(), i % self.n_folds + 1))
            .collect();

        info!(n_examples = by_example.len(), "folds assigned");
        Ok(Folds {
            n_folds: self.n_folds,
            by_example,
        })
    }
}

/// Example id -> fold number, folds numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folds {
    n_folds: usize,
    by_example: BTreeMap<String, usize>,
}

impl Folds {
    /// Rebuild folds from stored assignments. The fold count is the largest
    /// fold number seen.
    ///
    /// # Errors
    ///
    /// Returns [`DecomposeError::FoldOutOfRange`] if any fold number is 0.
    pub fn from_assignments<I>(assignments: I) -> Result<Self, DecomposeError>
    where
        I: IntoIterator<Item = (String, usize)>,
    {
        let by_example: BTreeMap<String, usize> = assignments.into_iter().collect();
        let n_folds = by_example.values().copied().max().unwrap_or(0);
        if by_example.values().any(|&f| f == 0) {
            return Err(DecomposeError::FoldOutOfRange { fold: 0, n_folds });
        }
        Ok(Self { n_folds, by_example })
    }

    /// Number of folds.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Number of assigned examples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_example.len()
    }

    /// `true` if no example is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_example.is_empty()
    }

    /// Fold of one example.
    #[must_use]
    pub fn fold_of(&self, example: &str) -> Option<usize> {
        self.by_example.get(example).copied()
    }

    /// `(example id, fold)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.by_example.iter().map(|(id, &f)| (id.as_str(), f))
    }

    /// Training ids (every other fold) and test ids (this fold).
    ///
    /// # Errors
    ///
    /// Returns [`DecomposeError::FoldOutOfRange`] if `fold` is not in
    /// `1..=n_folds`.
    pub fn train_test(&self, fold: usize) -> Result<(BTreeSet<String>, BTreeSet<String>), DecomposeError> {
        if fold == 0 || fold > self.n_folds {
            return Err(DecomposeError::FoldOutOfRange {
                fold,
                n_folds: self.n_folds,
            });
        }
        let (test, train): (Vec<(&String, &usize)>, Vec<_>) =
            self.by_example.iter().partition(|&(_, &f)| f == fold);
        Ok((
            train.into_iter().map(|(id, _)| id.clone()).collect(),
            test.into_iter().map(|(id, _)| id.clone()).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("ex{i:02}")).collect()
    }

    #[test]
    fn fold_sizes_are_balanced() {
        let ids = ids(11);
        let folds = FoldAssignment::new(3)
            .unwrap()
            .assign(ids.iter().map(String::as_str))
            .unwrap();
        let mut sizes = [0usize; 3];
        for (_, f) in folds.iter() {
            sizes[f - 1] += 1;
        }
        assert_eq!(sizes, [4, 4, 3]);
        assert_eq!(folds.len(), 11);
    }

    #[test]
    fn same_seed_same_assignment() {
        let ids = ids(20);
        let a = FoldAssignment::new(4).unwrap().with_seed(7).assign(ids.iter().map(String::as_str)).unwrap();
        // Input order does not matter.
        let b = FoldAssignment::new(4)
            .unwrap()
            .with_seed(7)
            .assign(ids.iter().rev().map(String::as_str))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn train_and_test_partition_the_examples() {
        let ids = ids(10);
        let folds = FoldAssignment::new(5).unwrap().assign(ids.iter().map(String::as_str)).unwrap();
        for fold in 1..=5 {
            let (train, test) = folds.train_test(fold).unwrap();
            assert_eq!(test.len(), 2);
            assert_eq!(train.len(), 8);
            assert!(train.is_disjoint(&test));
        }
    }

    #[test]
    fn invalid_counts_rejected() {
        assert!(matches!(
            FoldAssignment::new(1),
            Err(DecomposeError::InvalidFoldCount { n_folds: 1 })
        ));
        let err = FoldAssignment::new(5).unwrap().assign(["a", "b"]).unwrap_err();
        assert!(matches!(err, DecomposeError::TooFewExamples { n_examples: 2, n_folds: 5 }));
    }

    #[test]
    fn out_of_range_fold_rejected() {
        let folds = Folds::from_assignments(vec![("a".to_string(), 1), ("b".to_string(), 2)]).unwrap();
        assert_eq!(folds.n_folds(), 2);
        assert!(folds.train_test(0).is_err());
        assert!(folds.train_test(3).is_err());
        assert!(Folds::from_assignments(vec![("a".to_string(), 0)]).is_err());
    }
}
