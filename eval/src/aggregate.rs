// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Summary of a rule collection as a single measures record

use crate::measures::QualityMeasures;

/// Fisher p-value below which a rule counts as significant
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.1;

/// Growth rate above which a rule shows positive lift
pub const GROWTH_RATE_THRESHOLD: f64 = 1.0;

/// Average the measures of `records` into one aggregate record.
///
/// `WRACC`, `GAIN`, `CONF`, `TPR`, `FPR`, `SUPDIFF` and `NVAR` are means.
/// `GR` becomes the fraction of rules with growth rate above 1 and `FISHER`
/// the fraction with a p-value below `significance_level`. `NRULES` is the
/// record count and `RULE_NUMBER` is cleared. `SUPP`, `ACC` and `AUC` stay
/// at zero.
///
/// An empty collection yields `NaN` means and `NRULES = 0`.
pub fn average_quality_measures(
    records: &[QualityMeasures],
    significance_level: f64,
) -> QualityMeasures {
    let mut sum = QualityMeasures::default();
    let mut lifted = 0usize;
    let mut significant = 0usize;

    for r in records {
        sum.wracc += r.wracc;
        sum.gain += r.gain;
        sum.conf += r.conf;
        sum.tpr += r.tpr;
        sum.fpr += r.fpr;
        sum.supdiff += r.supdiff;
        sum.nvar += r.nvar;
        if r.gr > GROWTH_RATE_THRESHOLD {
            lifted += 1;
        }
        if r.fisher < significance_level {
            significant += 1;
        }
    }

    let count = records.len() as f64;
    QualityMeasures {
        wracc: sum.wracc / count,
        gain: sum.gain / count,
        conf: sum.conf / count,
        tpr: sum.tpr / count,
        fpr: sum.fpr / count,
        supdiff: sum.supdiff / count,
        nvar: sum.nvar / count,
        gr: lifted as f64 / count,
        fisher: significant as f64 / count,
        nrules: count,
        rule_number: None,
        ..QualityMeasures::default()
    }
}
