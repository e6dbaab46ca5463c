// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Predictive accuracy of rule subsets
//!
//! Implements:
//! - Minority class detection from training label counts
//! - Binary confusion matrix with the minority class as positive
//! - Accuracy, and single-operating-point AUC for two-class problems

use crate::datasets::InstanceSet;
use crate::error::{EvalError, Result};
use crate::measures::QualityMeasures;
use serde::{Deserialize, Serialize};

/// Confusion matrix for a binary problem, minority class as positive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Minority instances predicted as minority
    pub tp: usize,
    /// Majority instances predicted as majority
    pub tn: usize,
    /// Majority instances predicted as minority
    pub fp: usize,
    /// Minority instances predicted as majority
    pub fn_: usize,
}

impl ConfusionMatrix {
    /// Create from predictions and ground truth, `positive` being the class of interest
    pub fn from_predictions(
        predictions: &[usize],
        ground_truth: &[usize],
        positive: usize,
    ) -> Self {
        let mut matrix = Self::default();

        for (&pred, &truth) in predictions.iter().zip(ground_truth) {
            match (truth == positive, pred == positive) {
                (true, true) => matrix.tp += 1,
                (true, false) => matrix.fn_ += 1,
                (false, true) => matrix.fp += 1,
                (false, false) => matrix.tn += 1,
            }
        }

        matrix
    }

    /// Total number of samples
    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// Accuracy: (TP + TN) / Total
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.tp + self.tn) as f64 / total as f64
    }

    /// True positive rate: TP / (TP + FN)
    pub fn tpr(&self) -> f64 {
        let denom = self.tp + self.fn_;
        if denom == 0 {
            return 0.0;
        }
        self.tp as f64 / denom as f64
    }

    /// False positive rate: FP / (FP + TN)
    pub fn fpr(&self) -> f64 {
        let denom = self.fp + self.tn;
        if denom == 0 {
            return 0.0;
        }
        self.fp as f64 / denom as f64
    }

    /// AUC of the single operating point (FPR, TPR) by the trapezoidal rule
    pub fn auc(&self) -> f64 {
        (1.0 + self.tpr() - self.fpr()) / 2.0
    }
}

/// Accuracy and AUC of one set of predictions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrecisionMeasures {
    pub acc: f64,
    /// `NaN` when the problem has more than two classes
    pub auc: f64,
}

impl PrecisionMeasures {
    /// Write ACC and AUC into a measures record
    pub fn apply_to(&self, record: &mut QualityMeasures) {
        record.acc = self.acc;
        record.auc = self.auc;
    }
}

/// Least frequent class in `labels`; ties go to the lowest class index.
///
/// Returns `None` when there are no classes.
pub fn minority_class(labels: &[usize], num_classes: usize) -> Option<usize> {
    let mut counts = vec![0usize; num_classes];
    for &label in labels {
        if let Some(count) = counts.get_mut(label) {
            *count += 1;
        }
    }

    counts
        .iter()
        .enumerate()
        .min_by_key(|&(_, &count)| count)
        .map(|(class, _)| class)
}

/// Accuracy (and AUC for at most two classes) of one prediction array
pub fn precision_measures(
    predictions: &[usize],
    ground_truth: &[usize],
    minority: usize,
    num_classes: usize,
) -> PrecisionMeasures {
    if num_classes <= 2 {
        let cm = ConfusionMatrix::from_predictions(predictions, ground_truth, minority);
        PrecisionMeasures {
            acc: cm.accuracy(),
            auc: cm.auc(),
        }
    } else {
        let hits = predictions
            .iter()
            .zip(ground_truth)
            .filter(|(pred, truth)| pred == truth)
            .count();
        let acc = if ground_truth.is_empty() {
            0.0
        } else {
            hits as f64 / ground_truth.len() as f64
        };
        PrecisionMeasures { acc, auc: f64::NAN }
    }
}

/// Fill `ACC` and `AUC` of each record from the matching prediction array.
///
/// `predictions[i]` holds the class predicted for every test instance by
/// the rule subset summarised in `results[i]` (typically unfiltered,
/// filtered globally, filtered by class). The minority class is taken from
/// `training`.
pub fn calculate_precision_measures(
    predictions: &[Vec<usize>],
    test: &InstanceSet,
    training: &InstanceSet,
    results: &mut [QualityMeasures],
) -> Result<()> {
    if predictions.len() != results.len() {
        return Err(EvalError::LengthMismatch {
            what: "prediction sets",
            expected: results.len(),
            actual: predictions.len(),
        });
    }
    if training.class_values != test.class_values {
        return Err(EvalError::InvalidArgument(
            "training and test sets declare different class values".to_string(),
        ));
    }

    let num_classes = training.num_classes();
    let minority = minority_class(&training.labels(), num_classes)
        .ok_or_else(|| EvalError::InvalidArgument("no class values declared".to_string()))?;
    tracing::debug!("Minority class: {}", training.class_values[minority]);

    let truth = test.labels();
    for (predicted, record) in predictions.iter().zip(results.iter_mut()) {
        if predicted.len() != truth.len() {
            return Err(EvalError::LengthMismatch {
                what: "predictions",
                expected: truth.len(),
                actual: predicted.len(),
            });
        }
        precision_measures(predicted, &truth, minority, num_classes).apply_to(record);
    }

    Ok(())
}
