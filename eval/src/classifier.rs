// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Turning a rule subset into class predictions
//!
//! The evaluation core only needs one predicted class per test instance and
//! rule subset. [`VotingClassifier`] provides that for callers that do not
//! bring their own predictions.

use crate::datasets::{Instance, InstanceSet};
use crate::rules::{ConjunctiveCoverage, CoverageOracle, Pattern};

/// Predicts classes from a set of rules
pub trait RuleClassifier: Send + Sync {
    /// Fit any state that does not depend on the rules (e.g. a fallback class)
    fn train(&mut self, training: &InstanceSet);

    /// Class predicted for one instance by `patterns`
    fn predict(&self, patterns: &[Pattern], instance: &Instance) -> usize;

    /// Class predicted for every instance of `test`, in order
    fn predict_batch(&self, patterns: &[Pattern], test: &InstanceSet) -> Vec<usize> {
        test.instances.iter().map(|i| self.predict(patterns, i)).collect()
    }

    fn name(&self) -> &str;
}

/// Each covering rule casts one vote for its class; the most voted class
/// wins, ties going to the lowest class index. Instances no rule covers get
/// the majority class of the training set.
#[derive(Debug, Clone, Default)]
pub struct VotingClassifier<O: CoverageOracle = ConjunctiveCoverage> {
    oracle: O,
    num_classes: usize,
    default_class: usize,
}

impl VotingClassifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<O: CoverageOracle> VotingClassifier<O> {
    pub fn with_oracle(oracle: O) -> Self {
        Self {
            oracle,
            num_classes: 0,
            default_class: 0,
        }
    }

    /// Class predicted for instances no rule covers
    pub fn default_class(&self) -> usize {
        self.default_class
    }
}

impl<O: CoverageOracle> RuleClassifier for VotingClassifier<O> {
    fn train(&mut self, training: &InstanceSet) {
        let dist = training.class_distribution();
        self.num_classes = dist.len();
        // Highest count, first index on ties.
        self.default_class = dist
            .iter()
            .enumerate()
            .fold((0, 0), |best, (class, &count)| {
                if count > best.1 {
                    (class, count)
                } else {
                    best
                }
            })
            .0;
    }

    fn predict(&self, patterns: &[Pattern], instance: &Instance) -> usize {
        let mut votes = vec![0usize; self.num_classes];
        for pattern in patterns {
            if self.oracle.covers(pattern, instance) {
                if pattern.class >= votes.len() {
                    votes.resize(pattern.class + 1, 0);
                }
                votes[pattern.class] += 1;
            }
        }

        votes
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, usize)>, (class, &count)| match best {
                Some((_, top)) if count <= top => best,
                _ if count == 0 => best,
                _ => Some((class, count)),
            })
            .map_or(self.default_class, |(class, _)| class)
    }

    fn name(&self) -> &str {
        "Voting"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Item;

    fn training() -> InstanceSet {
        let labels = [0, 1, 1, 1, 2];
        InstanceSet::new(
            "train",
            vec!["x".to_string()],
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            labels
                .iter()
                .map(|&class| Instance { values: vec![0.0], class })
                .collect(),
        )
        .unwrap()
    }

    fn instance(x: f64) -> Instance {
        Instance { values: vec![x], class: 0 }
    }

    #[test]
    fn test_default_class_is_training_majority() {
        let mut clf = VotingClassifier::new();
        clf.train(&training());
        assert_eq!(clf.default_class(), 1);
        assert_eq!(clf.predict(&[], &instance(5.0)), 1);
        assert_eq!(clf.name(), "Voting");
    }

    #[test]
    fn test_majority_vote() {
        let mut clf = VotingClassifier::new();
        clf.train(&training());

        let patterns = vec![
            Pattern::new(vec![Item::equals(0, 1.0)], 2),
            Pattern::new(vec![Item::between(0, 0.0, 2.0)], 2),
            Pattern::new(vec![Item::between(0, 0.0, 2.0)], 0),
        ];

        assert_eq!(clf.predict(&patterns, &instance(1.0)), 2);
        // Tie between classes 0 and 2 on one vote each.
        let tied = &patterns[1..];
        assert_eq!(clf.predict(tied, &instance(1.0)), 0);
        // Nothing covers 3.0.
        assert_eq!(clf.predict(&patterns, &instance(3.0)), 1);
    }

    #[test]
    fn test_predict_batch() {
        let mut clf = VotingClassifier::new();
        let train = training();
        clf.train(&train);

        let patterns = vec![Pattern::new(vec![Item::equals(0, 0.0)], 2)];
        assert_eq!(clf.predict_batch(&patterns, &train), vec![2; 5]);
    }
}
