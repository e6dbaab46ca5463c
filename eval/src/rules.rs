// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Rules (patterns) under evaluation and the model that owns them
//!
//! A [`Pattern`] is a conjunction of attribute conditions plus the class it
//! predicts. Whether a pattern covers an instance is decided by a
//! [`CoverageOracle`]; [`ConjunctiveCoverage`] is the usual "all items hold"
//! semantics.

use crate::datasets::Instance;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Test applied to a single attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Nominal (or exact numeric) match
    Equals(f64),
    /// Closed numeric interval
    Between { min: f64, max: f64 },
}

/// One condition of a pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Index of the tested attribute
    pub attribute: usize,
    pub condition: Condition,
}

impl Item {
    pub fn equals(attribute: usize, value: f64) -> Self {
        Self {
            attribute,
            condition: Condition::Equals(value),
        }
    }

    pub fn between(attribute: usize, min: f64, max: f64) -> Self {
        Self {
            attribute,
            condition: Condition::Between { min, max },
        }
    }

    /// Missing or absent values never satisfy a condition
    pub fn holds(&self, instance: &Instance) -> bool {
        match instance.values.get(self.attribute) {
            Some(v) if !v.is_nan() => match self.condition {
                Condition::Equals(target) => *v == target,
                Condition::Between { min, max } => *v >= min && *v <= max,
            },
            _ => false,
        }
    }
}

/// A classification rule: its items and the class it predicts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub items: Vec<Item>,
    /// Index of the predicted class
    pub class: usize,
}

impl Pattern {
    pub fn new(items: Vec<Item>, class: usize) -> Self {
        Self { items, class }
    }

    /// Number of conditions
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Decides whether a pattern covers an instance
pub trait CoverageOracle: Send + Sync {
    fn covers(&self, pattern: &Pattern, instance: &Instance) -> bool;
}

/// A pattern covers an instance when every one of its items holds
#[derive(Debug, Clone, Copy, Default)]
pub struct ConjunctiveCoverage;

impl CoverageOracle for ConjunctiveCoverage {
    fn covers(&self, pattern: &Pattern, instance: &Instance) -> bool {
        pattern.items.iter().all(|item| item.holds(instance))
    }
}

/// Owner of a rule collection, receiving the filtered subsets back
pub trait PatternModel {
    /// All rules, in provenance order
    fn patterns(&self) -> &[Pattern];

    /// Store the best rules selected regardless of class
    fn set_patterns_filtered_all_class(&mut self, patterns: Vec<Pattern>);

    /// Store the best rules selected within each class
    fn set_patterns_filtered_by_class(&mut self, patterns: Vec<Pattern>);

    /// Class predicted by each rule, in provenance order
    fn classes(&self) -> Vec<usize> {
        self.patterns().iter().map(|p| p.class).collect()
    }
}

/// Plain in-memory rule model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    pub patterns: Vec<Pattern>,
    #[serde(default)]
    pub filtered_all_class: Vec<Pattern>,
    #[serde(default)]
    pub filtered_by_class: Vec<Pattern>,
}

impl RuleSet {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self {
            patterns,
            ..Self::default()
        }
    }

    /// Generate `num_rules` random nominal rules for a schema of
    /// `num_attributes` attributes with `values_per_attribute` values each.
    ///
    /// Each rule tests between one and three distinct attributes.
    pub fn random(
        num_rules: usize,
        num_attributes: usize,
        values_per_attribute: usize,
        num_classes: usize,
        seed: u64,
    ) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let num_attributes = num_attributes.max(1);
        let values_per_attribute = values_per_attribute.max(1);
        let num_classes = num_classes.max(1);

        let patterns = (0..num_rules)
            .map(|_| {
                let size = rng.gen_range(1..=num_attributes.min(3));
                let mut attributes: Vec<usize> = Vec::with_capacity(size);
                while attributes.len() < size {
                    let attribute = rng.gen_range(0..num_attributes);
                    if !attributes.contains(&attribute) {
                        attributes.push(attribute);
                    }
                }
                attributes.sort_unstable();

                let items = attributes
                    .into_iter()
                    .map(|a| Item::equals(a, rng.gen_range(0..values_per_attribute) as f64))
                    .collect();
                Pattern::new(items, rng.gen_range(0..num_classes))
            })
            .collect();

        Self::new(patterns)
    }
}

impl PatternModel for RuleSet {
    fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    fn set_patterns_filtered_all_class(&mut self, patterns: Vec<Pattern>) {
        self.filtered_all_class = patterns;
    }

    fn set_patterns_filtered_by_class(&mut self, patterns: Vec<Pattern>) {
        self.filtered_by_class = patterns;
    }
}
