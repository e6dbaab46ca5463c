// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Ranking and top-N selection of rules by a quality measure
//!
//! Records are ordered ascending so that the best rule sits at the tail:
//! higher is better for every measure except `FPR`, whose order is
//! inverted. Ties on the measure put the record with more conditions first,
//! so the simpler rule wins. Selections are returned best-first.

use crate::error::{EvalError, Result};
use crate::measures::{Measure, QualityMeasures};
use std::cmp::Ordering;

/// Sort key for a measure value. `NaN` is mapped below every real value
/// (above, for inverted measures) so it always ranks worst, and `-0.0` is
/// folded into `0.0`.
fn rank_key(value: f64, inverted: bool) -> f64 {
    if value.is_nan() {
        if inverted {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        }
    } else {
        value + 0.0
    }
}

/// Ascending rank order of two records by `by`
pub fn compare_by(by: Measure, a: &QualityMeasures, b: &QualityMeasures) -> Ordering {
    let inverted = by.lower_is_better();
    let ka = rank_key(a.get(by), inverted);
    let kb = rank_key(b.get(by), inverted);

    let primary = if inverted { kb.total_cmp(&ka) } else { ka.total_cmp(&kb) };

    primary.then_with(|| {
        let na = rank_key(a.nvar, false);
        let nb = rank_key(b.nvar, false);
        nb.total_cmp(&na)
    })
}

/// Sort records in place, ascending by rank (best last). The sort is stable.
pub fn sort_by_measure(records: &mut [QualityMeasures], by: Measure) {
    records.sort_by(|a, b| compare_by(by, a, b));
}

/// The `n` best records regardless of class, best first.
///
/// Fails when `n` exceeds the number of records.
pub fn best_n_rules_by(
    records: &[QualityMeasures],
    by: Measure,
    n: usize,
) -> Result<Vec<QualityMeasures>> {
    if n > records.len() {
        return Err(EvalError::SelectionTooLarge {
            requested: n,
            available: records.len(),
        });
    }

    let mut sorted = records.to_vec();
    sort_by_measure(&mut sorted, by);
    Ok(sorted.into_iter().rev().take(n).collect())
}

/// The `n` best records within each class, best first per class,
/// concatenated in class-index order.
///
/// `classes[i]` is the class of `records[i]`. A class with fewer than `n`
/// records contributes all of them.
pub fn best_n_rules_by_class(
    records: &[QualityMeasures],
    by: Measure,
    n: usize,
    classes: &[usize],
    num_classes: usize,
) -> Result<Vec<QualityMeasures>> {
    if classes.len() != records.len() {
        return Err(EvalError::LengthMismatch {
            what: "rule classes",
            expected: records.len(),
            actual: classes.len(),
        });
    }
    if let Some(&class) = classes.iter().find(|&&c| c >= num_classes) {
        return Err(EvalError::ClassOutOfRange { class, num_classes });
    }

    let mut partitions: Vec<Vec<QualityMeasures>> = vec![Vec::new(); num_classes];
    for (record, &class) in records.iter().zip(classes) {
        partitions[class].push(record.clone());
    }

    let mut result = Vec::new();
    for mut partition in partitions {
        sort_by_measure(&mut partition, by);
        result.extend(partition.into_iter().rev().take(n));
    }
    Ok(result)
}
