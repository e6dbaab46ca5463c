// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Quality evaluation and selection of emerging-pattern rules
//!
//! This crate provides:
//! - Per-rule confusion counts over a labeled test set
//! - A fixed battery of quality measures per rule (WRACC, GAIN, CONF, GR,
//!   Fisher's exact test, ...)
//! - Ranking and top-N filtering of rules, globally and within each class
//! - Aggregation of measures over rule sets and cross-validation folds
//! - Accuracy and AUC of the predictions made by each rule set
//! - Result files in the `NAME ==> value` format

pub mod aggregate;
pub mod classifier;
pub mod confusion;
pub mod datasets;
pub mod error;
pub mod fisher;
pub mod measures;
pub mod metrics;
pub mod pipeline;
pub mod ranking;
pub mod report;
pub mod rules;

pub use aggregate::{average_quality_measures, DEFAULT_SIGNIFICANCE_LEVEL};
pub use classifier::{RuleClassifier, VotingClassifier};
pub use confusion::ConfusionEntry;
pub use datasets::{Fold, Instance, InstanceSet};
pub use error::{EvalError, Result};
pub use fisher::FisherExact;
pub use measures::{Measure, QualityMeasures};
pub use metrics::{calculate_precision_measures, minority_class, PrecisionMeasures};
pub use pipeline::{
    EvaluationConfig, EvaluationPipeline, FoldEvaluation, IoErrorPolicy, Job, JobFold,
    RuleSelection,
};
pub use ranking::{best_n_rules_by, best_n_rules_by_class, compare_by};
pub use report::{save_results, CrossValidation, EvaluationReport};
pub use rules::{ConjunctiveCoverage, CoverageOracle, Item, Pattern, PatternModel, RuleSet};
