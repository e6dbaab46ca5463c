// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Quality measures for emerging-pattern rules
//!
//! A [`QualityMeasures`] record holds the full battery of descriptive and
//! predictive measures for one rule, or for an aggregate over many rules.
//! [`Measure`] names each field so that ranking and report writing can look
//! values up by name.

use crate::confusion::ConfusionEntry;
use crate::error::EvalError;
use crate::fisher::FisherExact;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;

/// Name of a single quality measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Measure {
    /// Weighted relative accuracy
    Wracc,
    /// Number of conditions in the rule
    Nvar,
    /// Number of rules behind an aggregate
    Nrules,
    /// Support
    Supp,
    /// Information gain
    Gain,
    /// Confidence
    Conf,
    /// Growth rate
    Gr,
    /// True positive rate
    Tpr,
    /// False positive rate
    Fpr,
    /// Support difference
    Supdiff,
    /// Fisher's exact test p-value
    Fisher,
    /// Position of the rule in its originating collection
    RuleNumber,
    /// Predictive accuracy
    Acc,
    /// Area under the ROC curve
    Auc,
}

impl Measure {
    /// Every measure, in report order
    pub const ALL: [Measure; 14] = [
        Measure::Wracc,
        Measure::Nvar,
        Measure::Nrules,
        Measure::Supp,
        Measure::Gain,
        Measure::Conf,
        Measure::Gr,
        Measure::Tpr,
        Measure::Fpr,
        Measure::Supdiff,
        Measure::Fisher,
        Measure::RuleNumber,
        Measure::Acc,
        Measure::Auc,
    ];

    /// Canonical upper-case name used in reports and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Measure::Wracc => "WRACC",
            Measure::Nvar => "NVAR",
            Measure::Nrules => "NRULES",
            Measure::Supp => "SUPP",
            Measure::Gain => "GAIN",
            Measure::Conf => "CONF",
            Measure::Gr => "GR",
            Measure::Tpr => "TPR",
            Measure::Fpr => "FPR",
            Measure::Supdiff => "SUPDIFF",
            Measure::Fisher => "FISHER",
            Measure::RuleNumber => "RULE_NUMBER",
            Measure::Acc => "ACC",
            Measure::Auc => "AUC",
        }
    }

    /// Whether a lower value of this measure means a better rule
    pub fn lower_is_better(&self) -> bool {
        matches!(self, Measure::Fpr)
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Measure {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Measure::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| EvalError::UnknownMeasure(s.to_string()))
    }
}

/// Quality measures of a rule or of an aggregate over rules.
///
/// Every field starts at `0.0`. `rule_number` is `None` for aggregates and
/// reads back as `NaN` through [`QualityMeasures::get`]. In JSON, `NaN` is
/// written as `null` and infinities as `"inf"` / `"-inf"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct QualityMeasures {
    #[serde(with = "measure_value")]
    pub wracc: f64,
    #[serde(with = "measure_value")]
    pub nvar: f64,
    #[serde(with = "measure_value")]
    pub nrules: f64,
    #[serde(with = "measure_value")]
    pub supp: f64,
    #[serde(with = "measure_value")]
    pub gain: f64,
    #[serde(with = "measure_value")]
    pub conf: f64,
    #[serde(with = "measure_value")]
    pub gr: f64,
    #[serde(with = "measure_value")]
    pub tpr: f64,
    #[serde(with = "measure_value")]
    pub fpr: f64,
    #[serde(with = "measure_value")]
    pub supdiff: f64,
    #[serde(with = "measure_value")]
    pub fisher: f64,
    pub rule_number: Option<usize>,
    #[serde(with = "measure_value")]
    pub acc: f64,
    #[serde(with = "measure_value")]
    pub auc: f64,
}

impl Default for QualityMeasures {
    fn default() -> Self {
        Self {
            wracc: 0.0,
            nvar: 0.0,
            nrules: 0.0,
            supp: 0.0,
            gain: 0.0,
            conf: 0.0,
            gr: 0.0,
            tpr: 0.0,
            fpr: 0.0,
            supdiff: 0.0,
            fisher: 0.0,
            rule_number: Some(0),
            acc: 0.0,
            auc: 0.0,
        }
    }
}

impl QualityMeasures {
    /// Descriptive measures of a single rule from its confusion entry.
    ///
    /// `rule_number` is the position of the rule in the collection it was
    /// taken from. `ACC` and `AUC` are left at zero.
    pub fn from_confusion(entry: &ConfusionEntry, rule_number: usize) -> Self {
        // p/n: covered positives/negatives; big_p/big_n: all positives/negatives.
        let p = entry.tp as f64;
        let n = entry.fp as f64;
        let big_p = p + entry.fn_ as f64;
        let big_n = n + entry.tn as f64;
        let p_n = big_p + big_n;

        let wracc = if p + n == 0.0 {
            0.0
        } else {
            ((p + n) / p_n) * ((p / (p + n)) - (big_p / p_n))
        };

        let conf = if p + n == 0.0 { 0.0 } else { p / (p + n) };
        let tpr = if big_p == 0.0 { 0.0 } else { p / big_p };
        let fpr = if big_n == 0.0 { 0.0 } else { n / big_n };
        let supp = if p_n == 0.0 { 0.0 } else { p / p_n };
        let supdiff = if p_n == 0.0 { 0.0 } else { (p / p_n) - (n / p_n) };

        // p > 0 implies p + n > 0 and tpr > 0, so the logarithm is finite.
        let gain = if big_p == 0.0 || p == 0.0 {
            0.0
        } else {
            (p / big_p) * (((tpr / ((p + n) / p_n)).ln()) - (big_p / p_n).ln())
        };

        let gr = if tpr != 0.0 && fpr != 0.0 {
            tpr / fpr
        } else if tpr != 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let fisher =
            FisherExact::new(entry.total()).two_tailed(entry.tp, entry.fp, entry.fn_, entry.tn);

        Self {
            wracc,
            nvar: entry.nvars as f64,
            supp,
            gain,
            conf,
            gr,
            tpr,
            fpr,
            supdiff,
            fisher,
            rule_number: Some(rule_number),
            ..Self::default()
        }
    }

    /// Value of a measure by name
    pub fn get(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Wracc => self.wracc,
            Measure::Nvar => self.nvar,
            Measure::Nrules => self.nrules,
            Measure::Supp => self.supp,
            Measure::Gain => self.gain,
            Measure::Conf => self.conf,
            Measure::Gr => self.gr,
            Measure::Tpr => self.tpr,
            Measure::Fpr => self.fpr,
            Measure::Supdiff => self.supdiff,
            Measure::Fisher => self.fisher,
            Measure::RuleNumber => self.rule_number.map_or(f64::NAN, |i| i as f64),
            Measure::Acc => self.acc,
            Measure::Auc => self.auc,
        }
    }

    /// Overwrite a measure by name.
    ///
    /// `RULE_NUMBER` only keeps non-negative whole numbers; anything else
    /// marks the record as an aggregate.
    pub fn set(&mut self, measure: Measure, value: f64) {
        match measure {
            Measure::Wracc => self.wracc = value,
            Measure::Nvar => self.nvar = value,
            Measure::Nrules => self.nrules = value,
            Measure::Supp => self.supp = value,
            Measure::Gain => self.gain = value,
            Measure::Conf => self.conf = value,
            Measure::Gr => self.gr = value,
            Measure::Tpr => self.tpr = value,
            Measure::Fpr => self.fpr = value,
            Measure::Supdiff => self.supdiff = value,
            Measure::Fisher => self.fisher = value,
            Measure::RuleNumber => {
                self.rule_number = (value >= 0.0 && value.fract() == 0.0).then_some(value as usize)
            }
            Measure::Acc => self.acc = value,
            Measure::Auc => self.auc = value,
        }
    }

    /// `(measure, value)` pairs in report order
    pub fn iter(&self) -> impl Iterator<Item = (Measure, f64)> + '_ {
        Measure::ALL.iter().map(move |&m| (m, self.get(m)))
    }

    /// True when this record summarises several rules rather than one
    pub fn is_aggregate(&self) -> bool {
        self.rule_number.is_none()
    }

    /// Every value divided by `folds`, for averaging accumulated runs
    pub fn divided_by(&self, folds: usize) -> Self {
        let mut out = self.clone();
        for (measure, value) in self.iter() {
            out.set(measure, value / folds as f64);
        }
        out
    }
}

/// Elementwise sum, used to accumulate records across folds.
///
/// A summed record is always an aggregate.
impl AddAssign<&QualityMeasures> for QualityMeasures {
    fn add_assign(&mut self, other: &QualityMeasures) {
        for measure in Measure::ALL {
            if measure == Measure::RuleNumber {
                continue;
            }
            self.set(measure, self.get(measure) + other.get(measure));
        }
        self.rule_number = None;
    }
}

/// Serde representation of a measure value that may not be finite
mod measure_value {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(Option<f64>),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else if value.is_infinite() {
            serializer.serialize_str(if *value > 0.0 { "inf" } else { "-inf" })
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value.unwrap_or(f64::NAN)),
            Repr::Text(text) => match text.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "NaN" => Ok(f64::NAN),
                other => Err(D::Error::custom(format!("invalid measure value: {}", other))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tp: usize, tn: usize, fp: usize, fn_: usize, nvars: usize) -> ConfusionEntry {
        ConfusionEntry { tp, tn, fp, fn_, nvars }
    }

    #[test]
    fn test_reference_entry() {
        let qm = QualityMeasures::from_confusion(&entry(8, 70, 2, 20, 3), 4);

        assert!((qm.conf - 0.8).abs() < 1e-9);
        assert!((qm.tpr - 8.0 / 28.0).abs() < 1e-9);
        assert!((qm.fpr - 2.0 / 72.0).abs() < 1e-9);
        assert!((qm.supp - 0.08).abs() < 1e-9);
        assert!((qm.supdiff - 0.06).abs() < 1e-9);
        assert!((qm.wracc - 0.052).abs() < 1e-9);
        assert!((qm.gr - 10.285714285714286).abs() < 1e-9);
        assert!((qm.gain - 0.6636536572318756).abs() < 1e-9);
        assert!((qm.fisher - 0.000488422).abs() < 1e-8);
        assert_eq!(qm.nvar, 3.0);
        assert_eq!(qm.rule_number, Some(4));
        assert_eq!(qm.acc, 0.0);
        assert_eq!(qm.auc, 0.0);
    }

    #[test]
    fn test_empty_entry_is_all_zero() {
        let qm = QualityMeasures::from_confusion(&entry(0, 0, 0, 0, 2), 0);

        for measure in [
            Measure::Wracc,
            Measure::Supp,
            Measure::Gain,
            Measure::Conf,
            Measure::Gr,
            Measure::Tpr,
            Measure::Fpr,
            Measure::Supdiff,
        ] {
            assert_eq!(qm.get(measure), 0.0, "{measure} should be zero");
        }
        assert_eq!(qm.fisher, 1.0);
    }

    #[test]
    fn test_growth_rate_cases() {
        // TPR > 0, FPR = 0
        let qm = QualityMeasures::from_confusion(&entry(5, 10, 0, 5, 1), 0);
        assert!(qm.gr.is_infinite() && qm.gr > 0.0);

        // TPR = 0, FPR > 0
        let qm = QualityMeasures::from_confusion(&entry(0, 10, 3, 5, 1), 0);
        assert_eq!(qm.gr, 0.0);

        // TPR = 0, FPR = 0
        let qm = QualityMeasures::from_confusion(&entry(0, 10, 0, 5, 1), 0);
        assert_eq!(qm.gr, 0.0);
    }

    #[test]
    fn test_gain_zero_without_positives() {
        let qm = QualityMeasures::from_confusion(&entry(0, 10, 4, 6, 2), 0);
        assert_eq!(qm.gain, 0.0);

        let qm = QualityMeasures::from_confusion(&entry(0, 10, 4, 0, 2), 0);
        assert_eq!(qm.gain, 0.0);
    }

    #[test]
    fn test_measure_names_round_trip() {
        for measure in Measure::ALL {
            assert_eq!(measure.name().parse::<Measure>().unwrap(), measure);
        }
        assert_eq!("conf".parse::<Measure>().unwrap(), Measure::Conf);
        assert!(matches!("LIFT".parse::<Measure>(), Err(EvalError::UnknownMeasure(_))));
    }

    #[test]
    fn test_rule_number_reads_nan_for_aggregates() {
        let mut qm = QualityMeasures::default();
        assert_eq!(qm.get(Measure::RuleNumber), 0.0);

        qm.set(Measure::RuleNumber, f64::NAN);
        assert!(qm.is_aggregate());
        assert!(qm.get(Measure::RuleNumber).is_nan());

        qm.set(Measure::RuleNumber, 7.0);
        assert_eq!(qm.rule_number, Some(7));
    }

    #[test]
    fn test_accumulate_and_divide() {
        let mut total = QualityMeasures {
            rule_number: None,
            ..QualityMeasures::default()
        };
        let fold = QualityMeasures {
            conf: 0.5,
            acc: 0.9,
            nrules: 3.0,
            auc: f64::NAN,
            ..QualityMeasures::default()
        };

        total += &fold;
        total += &fold;
        let avg = total.divided_by(2);

        assert!((avg.conf - 0.5).abs() < 1e-12);
        assert!((avg.acc - 0.9).abs() < 1e-12);
        assert!((avg.nrules - 3.0).abs() < 1e-12);
        assert!(avg.auc.is_nan());
        assert!(avg.is_aggregate());
    }

    #[test]
    fn test_non_finite_values_survive_json() {
        let qm = QualityMeasures {
            gr: f64::INFINITY,
            gain: f64::NEG_INFINITY,
            auc: f64::NAN,
            conf: 0.25,
            rule_number: None,
            ..QualityMeasures::default()
        };

        let json = serde_json::to_value(&qm).unwrap();
        assert_eq!(json["GR"], "inf");
        assert_eq!(json["GAIN"], "-inf");
        assert!(json["AUC"].is_null());
        assert!(json["RULE_NUMBER"].is_null());

        let back: QualityMeasures = serde_json::from_value(json).unwrap();
        assert_eq!(back.gr, f64::INFINITY);
        assert_eq!(back.gain, f64::NEG_INFINITY);
        assert!(back.auc.is_nan());
        assert_eq!(back.conf, 0.25);
        assert_eq!(back.rule_number, None);

        let bad = serde_json::json!({ "CONF": "lots" });
        assert!(serde_json::from_value::<QualityMeasures>(bad).is_err());
    }
}
