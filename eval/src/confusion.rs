// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Per-rule confusion counts over a test set
//!
//! A rule is scored as a one-vs-rest classifier for the class it predicts,
//! whatever the number of classes in the dataset.

use crate::datasets::{Instance, InstanceSet};
use crate::rules::{CoverageOracle, Pattern};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Confusion counts of one rule plus its number of conditions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionEntry {
    /// Covered and of the predicted class
    pub tp: usize,
    /// Not covered and of another class
    pub tn: usize,
    /// Covered but of another class
    pub fp: usize,
    /// Not covered but of the predicted class
    pub fn_: usize,
    /// Number of conditions in the rule
    pub nvars: usize,
}

impl ConfusionEntry {
    /// Score `pattern` against every instance of `test`
    pub fn from_pattern(
        pattern: &Pattern,
        test: &InstanceSet,
        oracle: &dyn CoverageOracle,
    ) -> Self {
        let mut entry = test.instances.iter().fold(Self::default(), |acc, instance| {
            acc.merge(Self::tally(pattern, instance, oracle))
        });
        entry.nvars = pattern.len();
        entry
    }

    /// Same as [`ConfusionEntry::from_pattern`], splitting the instance scan
    /// across the rayon pool
    pub fn from_pattern_parallel(
        pattern: &Pattern,
        test: &InstanceSet,
        oracle: &dyn CoverageOracle,
    ) -> Self {
        let mut entry = test
            .instances
            .par_iter()
            .map(|instance| Self::tally(pattern, instance, oracle))
            .reduce(Self::default, Self::merge);
        entry.nvars = pattern.len();
        entry
    }

    fn tally(pattern: &Pattern, instance: &Instance, oracle: &dyn CoverageOracle) -> Self {
        let mut entry = Self::default();
        let same_class = pattern.class == instance.class;
        match (oracle.covers(pattern, instance), same_class) {
            (true, true) => entry.tp = 1,
            (true, false) => entry.fp = 1,
            (false, false) => entry.tn = 1,
            (false, true) => entry.fn_ = 1,
        }
        entry
    }

    /// Sum of the four outcome counts; `nvars` is kept from `self`
    pub fn merge(self, other: Self) -> Self {
        Self {
            tp: self.tp + other.tp,
            tn: self.tn + other.tn,
            fp: self.fp + other.fp,
            fn_: self.fn_ + other.fn_,
            nvars: self.nvars,
        }
    }

    /// Number of instances scored
    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }
}

/// Confusion entries for every rule, in rule order.
///
/// In parallel mode the rules are spread over the rayon pool; when there are
/// fewer rules than worker threads, each rule's instance scan is split instead.
pub fn confusion_entries(
    patterns: &[Pattern],
    test: &InstanceSet,
    oracle: &dyn CoverageOracle,
    parallel: bool,
) -> Vec<ConfusionEntry> {
    if parallel && patterns.len() < rayon::current_num_threads() {
        patterns
            .iter()
            .map(|p| ConfusionEntry::from_pattern_parallel(p, test, oracle))
            .collect()
    } else if parallel {
        patterns
            .par_iter()
            .map(|p| ConfusionEntry::from_pattern(p, test, oracle))
            .collect()
    } else {
        patterns
            .iter()
            .map(|p| ConfusionEntry::from_pattern(p, test, oracle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ConjunctiveCoverage, Item};

    fn test_set() -> InstanceSet {
        let rows = [
            (vec![1.0, 0.0], 0),
            (vec![1.0, 1.0], 0),
            (vec![1.0, 0.0], 1),
            (vec![0.0, 0.0], 1),
            (vec![0.0, 1.0], 0),
            (vec![0.0, 1.0], 2),
        ];
        InstanceSet::new(
            "toy",
            vec!["x".to_string(), "y".to_string()],
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            rows.into_iter()
                .map(|(values, class)| Instance { values, class })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_one_vs_rest_counts() {
        let pattern = Pattern::new(vec![Item::equals(0, 1.0)], 0);
        let entry = ConfusionEntry::from_pattern(&pattern, &test_set(), &ConjunctiveCoverage);

        assert_eq!(entry.tp, 2);
        assert_eq!(entry.fp, 1);
        assert_eq!(entry.fn_, 1);
        assert_eq!(entry.tn, 2);
        assert_eq!(entry.nvars, 1);
        assert_eq!(entry.total(), 6);
    }

    #[test]
    fn test_parallel_scan_matches_sequential() {
        let pattern = Pattern::new(vec![Item::equals(1, 1.0)], 2);
        let set = test_set();

        let sequential = ConfusionEntry::from_pattern(&pattern, &set, &ConjunctiveCoverage);
        let parallel = ConfusionEntry::from_pattern_parallel(&pattern, &set, &ConjunctiveCoverage);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_empty_test_set() {
        let set = InstanceSet::new("empty", vec![], vec!["A".to_string()], vec![]).unwrap();
        let pattern = Pattern::new(vec![Item::equals(0, 1.0), Item::equals(1, 0.0)], 0);

        let entry = ConfusionEntry::from_pattern(&pattern, &set, &ConjunctiveCoverage);
        assert_eq!(entry.total(), 0);
        assert_eq!(entry.nvars, 2);
    }

    #[test]
    fn test_entries_keep_rule_order() {
        let patterns = vec![
            Pattern::new(vec![Item::equals(0, 1.0)], 0),
            Pattern::new(vec![Item::equals(0, 0.0), Item::equals(1, 1.0)], 2),
        ];
        let set = test_set();

        let sequential = confusion_entries(&patterns, &set, &ConjunctiveCoverage, false);
        let parallel = confusion_entries(&patterns, &set, &ConjunctiveCoverage, true);

        assert_eq!(sequential, parallel);
        assert_eq!(sequential[1].tp, 1);
        assert_eq!(sequential[1].nvars, 2);
    }

    #[test]
    fn test_single_rule_scan_is_split() {
        let patterns = vec![Pattern::new(vec![Item::equals(1, 0.0)], 1)];
        let set = test_set();

        let entries = confusion_entries(&patterns, &set, &ConjunctiveCoverage, true);

        assert_eq!(entries.len(), 1);
        let sequential = ConfusionEntry::from_pattern(&patterns[0], &set, &ConjunctiveCoverage);
        assert_eq!(entries[0], sequential);
        // y == 0 covers rows 0, 2, 3; rows 2 and 3 are class 1.
        assert_eq!((entries[0].tp, entries[0].fp), (2, 1));
    }
}
