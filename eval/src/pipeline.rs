// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Rule evaluation pipeline
//!
//! Orchestrates, for each train/test fold:
//! - Confusion counts and quality measures for every rule
//! - Selection of the best rules globally and within each class
//! - Publication of both selections to the owning model
//! - Averaged measures for the unfiltered and the two filtered rule sets
//! - Accuracy and AUC of the three rule sets' predictions

use crate::aggregate::{average_quality_measures, DEFAULT_SIGNIFICANCE_LEVEL};
use crate::classifier::{RuleClassifier, VotingClassifier};
use crate::confusion::confusion_entries;
use crate::datasets::InstanceSet;
use crate::error::{EvalError, Result};
use crate::measures::{Measure, QualityMeasures};
use crate::metrics::calculate_precision_measures;
use crate::ranking::{best_n_rules_by, best_n_rules_by_class};
use crate::report::CrossValidation;
use crate::rules::{ConjunctiveCoverage, CoverageOracle, Pattern, PatternModel, RuleSet};
use anyhow::Context;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// What to do when result files cannot be written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoErrorPolicy {
    /// Return the error to the caller
    #[default]
    Propagate,
    /// Log the error and terminate the process
    Abort,
}

/// Configuration for the evaluation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Measure used to rank and filter rules
    pub filter_by: Measure,
    /// Number of rules kept by each filter
    pub top_n: usize,
    /// Fisher p-value below which a rule counts as significant
    pub significance_level: f64,
    /// Score rules on the rayon pool
    pub parallel: bool,
    pub io_error_policy: IoErrorPolicy,
    /// Seed for synthetic workloads
    pub seed: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            filter_by: Measure::Conf,
            top_n: 3,
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
            parallel: true,
            io_error_policy: IoErrorPolicy::Propagate,
            seed: 42,
        }
    }
}

/// Ranked rule records and the rules they came from, best first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSelection {
    pub records: Vec<QualityMeasures>,
    pub patterns: Vec<Pattern>,
}

impl RuleSelection {
    /// Pair ranked records with the rules their `RULE_NUMBER` points at
    fn resolve(records: Vec<QualityMeasures>, patterns: &[Pattern]) -> Result<Self> {
        let selected = records
            .iter()
            .map(|r| {
                r.rule_number
                    .and_then(|i| patterns.get(i))
                    .cloned()
                    .ok_or_else(|| {
                        EvalError::InvalidArgument(format!(
                            "record {:?} refers to no rule",
                            r.rule_number
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            records,
            patterns: selected,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Everything computed for one fold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldEvaluation {
    /// Measures of every rule, in rule order
    pub rules: Vec<QualityMeasures>,
    /// Best rules regardless of class
    pub filtered_all: RuleSelection,
    /// Best rules within each class
    pub filtered_by_class: RuleSelection,
    pub unfiltered_avg: QualityMeasures,
    pub filtered_all_avg: QualityMeasures,
    pub filtered_by_class_avg: QualityMeasures,
}

impl FoldEvaluation {
    /// The three summary records: unfiltered, filtered globally, filtered by class
    pub fn summaries(&self) -> [&QualityMeasures; 3] {
        [&self.unfiltered_avg, &self.filtered_all_avg, &self.filtered_by_class_avg]
    }

    fn summaries_mut(&mut self) -> [&mut QualityMeasures; 3] {
        [
            &mut self.unfiltered_avg,
            &mut self.filtered_all_avg,
            &mut self.filtered_by_class_avg,
        ]
    }
}

/// One fold of an evaluation job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFold {
    /// Rules induced on `training`
    pub rules: Vec<Pattern>,
    pub training: InstanceSet,
    pub test: InstanceSet,
    /// Test-set predictions of the unfiltered, globally filtered and
    /// per-class filtered rule sets; computed by voting when absent
    #[serde(default)]
    pub predictions: Option<Vec<Vec<usize>>>,
}

/// A set of folds evaluated together and averaged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub folds: Vec<JobFold>,
}

impl Job {
    /// Load a job description from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open job file: {}", path.display()))?;
        let job: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse job file: {}", path.display()))?;
        for (i, fold) in job.folds.iter().enumerate() {
            fold.training
                .validate()
                .and_then(|_| fold.test.validate())
                .with_context(|| format!("Invalid data in fold {}", i))?;
        }
        tracing::info!("Loaded job with {} folds from {}", job.folds.len(), path.display());
        Ok(job)
    }

    /// Synthetic job: a reproducible dataset split into `folds` folds, each
    /// with its own random rule set
    pub fn synthetic(size: usize, folds: usize, num_rules: usize, seed: u64) -> Result<Self> {
        const ATTRIBUTES: usize = 4;
        const VALUES: usize = 3;

        let data = InstanceSet::synthetic(size, ATTRIBUTES, VALUES, seed);
        let folds = data
            .k_folds(folds)?
            .into_iter()
            .enumerate()
            .map(|(i, fold)| {
                let rules = RuleSet::random(
                    num_rules,
                    ATTRIBUTES,
                    VALUES,
                    data.num_classes(),
                    seed + i as u64,
                );
                JobFold {
                    rules: rules.patterns,
                    training: fold.training,
                    test: fold.test,
                    predictions: None,
                }
            })
            .collect();

        Ok(Self { folds })
    }
}

/// Main evaluation pipeline
pub struct EvaluationPipeline<O: CoverageOracle = ConjunctiveCoverage> {
    config: EvaluationConfig,
    oracle: O,
}

impl EvaluationPipeline {
    pub fn new(config: EvaluationConfig) -> Self {
        Self::with_oracle(config, ConjunctiveCoverage)
    }
}

impl<O: CoverageOracle + Clone> EvaluationPipeline<O> {
    pub fn with_oracle(config: EvaluationConfig, oracle: O) -> Self {
        Self { config, oracle }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Synthetic job seeded from the configuration
    pub fn synthetic_job(&self, size: usize, folds: usize, num_rules: usize) -> Result<Job> {
        Job::synthetic(size, folds, num_rules, self.config.seed)
    }

    /// Quality measures of every rule against `test`, in rule order
    pub fn calculate_descriptive_measures(
        &self,
        patterns: &[Pattern],
        test: &InstanceSet,
    ) -> Vec<QualityMeasures> {
        let entries = confusion_entries(patterns, test, &self.oracle, self.config.parallel);
        if self.config.parallel {
            entries
                .par_iter()
                .enumerate()
                .map(|(i, entry)| QualityMeasures::from_confusion(entry, i))
                .collect()
        } else {
            entries
                .iter()
                .enumerate()
                .map(|(i, entry)| QualityMeasures::from_confusion(entry, i))
                .collect()
        }
    }

    /// Score, filter and summarise the rules of `model` on `test`.
    ///
    /// Both selections are published back to the model.
    pub fn evaluate_fold<M: PatternModel>(
        &self,
        model: &mut M,
        test: &InstanceSet,
    ) -> Result<FoldEvaluation> {
        let by = self.config.filter_by;
        let patterns = model.patterns();
        let rules = self.calculate_descriptive_measures(patterns, test);

        let top_n = if self.config.top_n > rules.len() {
            tracing::warn!(
                "Only {} rules available, keeping all of them instead of the best {}",
                rules.len(),
                self.config.top_n
            );
            rules.len()
        } else {
            self.config.top_n
        };

        let filtered_all = RuleSelection::resolve(best_n_rules_by(&rules, by, top_n)?, patterns)?;

        let classes = model.classes();
        let filtered_by_class = RuleSelection::resolve(
            best_n_rules_by_class(&rules, by, self.config.top_n, &classes, test.num_classes())?,
            patterns,
        )?;

        model.set_patterns_filtered_all_class(filtered_all.patterns.clone());
        model.set_patterns_filtered_by_class(filtered_by_class.patterns.clone());

        let significance = self.config.significance_level;
        let evaluation = FoldEvaluation {
            unfiltered_avg: average_quality_measures(&rules, significance),
            filtered_all_avg: average_quality_measures(&filtered_all.records, significance),
            filtered_by_class_avg: average_quality_measures(
                &filtered_by_class.records,
                significance,
            ),
            rules,
            filtered_all,
            filtered_by_class,
        };

        tracing::debug!(
            "Fold scored: {} rules, {} kept globally, {} kept by class (by {})",
            evaluation.rules.len(),
            evaluation.filtered_all.len(),
            evaluation.filtered_by_class.len(),
            by
        );

        Ok(evaluation)
    }

    /// Fill ACC and AUC of the three summary records from predictions
    pub fn apply_predictions(
        &self,
        evaluation: &mut FoldEvaluation,
        predictions: &[Vec<usize>],
        test: &InstanceSet,
        training: &InstanceSet,
    ) -> Result<()> {
        let mut summaries: Vec<QualityMeasures> =
            evaluation.summaries().into_iter().cloned().collect();
        calculate_precision_measures(predictions, test, training, &mut summaries)?;
        for (slot, filled) in evaluation.summaries_mut().into_iter().zip(summaries) {
            *slot = filled;
        }
        Ok(())
    }

    /// Predictions of the unfiltered, globally filtered and per-class
    /// filtered rule sets on `test`
    pub fn predict_subsets<C: RuleClassifier>(
        classifier: &C,
        all_rules: &[Pattern],
        evaluation: &FoldEvaluation,
        test: &InstanceSet,
    ) -> Vec<Vec<usize>> {
        [
            all_rules,
            evaluation.filtered_all.patterns.as_slice(),
            evaluation.filtered_by_class.patterns.as_slice(),
        ]
        .into_iter()
        .map(|rules| classifier.predict_batch(rules, test))
        .collect()
    }

    /// Evaluate one fold end to end
    pub fn run_fold(&self, fold: &JobFold) -> Result<FoldEvaluation> {
        let mut model = RuleSet::new(fold.rules.clone());
        let mut evaluation = self.evaluate_fold(&mut model, &fold.test)?;

        let predictions = match &fold.predictions {
            Some(predictions) => predictions.clone(),
            None => {
                let mut classifier = VotingClassifier::with_oracle(self.oracle.clone());
                classifier.train(&fold.training);
                tracing::debug!("Predicting with the {} classifier", classifier.name());
                Self::predict_subsets(&classifier, &model.patterns, &evaluation, &fold.test)
            }
        };
        self.apply_predictions(&mut evaluation, &predictions, &fold.test, &fold.training)?;

        tracing::info!(
            "  unfiltered ACC={:.4}, filtered ACC={:.4}, by-class ACC={:.4}",
            evaluation.unfiltered_avg.acc,
            evaluation.filtered_all_avg.acc,
            evaluation.filtered_by_class_avg.acc
        );

        Ok(evaluation)
    }

    /// Evaluate every fold of `job`, accumulating the summaries
    pub fn run(&self, job: &Job) -> Result<CrossValidation> {
        self.run_with(job, |_, _| {})
    }

    /// Same as [`EvaluationPipeline::run`], calling `on_fold` with the index
    /// and evaluation of each fold once it is done
    pub fn run_with<F>(&self, job: &Job, mut on_fold: F) -> Result<CrossValidation>
    where
        F: FnMut(usize, &FoldEvaluation),
    {
        let mut cv = CrossValidation::new();
        for (i, fold) in job.folds.iter().enumerate() {
            tracing::info!(
                "Evaluating fold {} ({} rules, {} test instances)",
                i + 1,
                fold.rules.len(),
                fold.test.len()
            );
            let evaluation = self.run_fold(fold)?;
            cv.add_fold(&evaluation);
            on_fold(i, &evaluation);
        }
        Ok(cv)
    }
}
