// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Labeled instance sets for rule evaluation
//!
//! Attribute values are stored as `f64`: nominal attributes carry the index
//! of their value, numeric attributes their raw value, and `NaN` marks a
//! missing value. The class of an instance is an index into
//! [`InstanceSet::class_values`].

use crate::error::{EvalError, Result};
use anyhow::Context;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A single labeled example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Attribute values, aligned with [`InstanceSet::attributes`]
    pub values: Vec<f64>,
    /// Index of the true class
    pub class: usize,
}

/// A set of labeled instances sharing one attribute and class schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSet {
    #[serde(default)]
    pub name: String,
    /// Input attribute names
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Valid class labels, in declaration order
    pub class_values: Vec<String>,
    pub instances: Vec<Instance>,
}

impl InstanceSet {
    /// Build an instance set, checking every class index against the labels
    pub fn new(
        name: impl Into<String>,
        attributes: Vec<String>,
        class_values: Vec<String>,
        instances: Vec<Instance>,
    ) -> Result<Self> {
        let set = Self {
            name: name.into(),
            attributes,
            class_values,
            instances,
        };
        set.validate()?;
        Ok(set)
    }

    /// Check that every instance refers to a declared class
    pub fn validate(&self) -> Result<()> {
        let num_classes = self.class_values.len();
        if let Some(bad) = self.instances.iter().find(|i| i.class >= num_classes) {
            return Err(EvalError::ClassOutOfRange {
                class: bad.class,
                num_classes,
            });
        }
        Ok(())
    }

    /// Load an instance set from a JSON file
    pub fn load_json(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open instance file: {}", path.display()))?;
        let set: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse instance file: {}", path.display()))?;
        set.validate()
            .with_context(|| format!("Invalid instance file: {}", path.display()))?;

        tracing::debug!(
            "Loaded {} instances ({} classes) from {}",
            set.len(),
            set.num_classes(),
            path.display()
        );
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn num_classes(&self) -> usize {
        self.class_values.len()
    }

    /// True class index of every instance, in order
    pub fn labels(&self) -> Vec<usize> {
        self.instances.iter().map(|i| i.class).collect()
    }

    /// Number of instances of each class, indexed like `class_values`
    pub fn class_distribution(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_classes()];
        for instance in &self.instances {
            if let Some(count) = counts.get_mut(instance.class) {
                *count += 1;
            }
        }
        counts
    }

    /// Split into `k` train/test folds; instance `i` is tested in fold `i % k`
    pub fn k_folds(&self, k: usize) -> Result<Vec<Fold>> {
        if k < 2 || k > self.len() {
            return Err(EvalError::InvalidArgument(format!(
                "cannot split {} instances into {} folds",
                self.len(),
                k
            )));
        }

        let folds = (0..k)
            .map(|fold| {
                let (test, training): (Vec<_>, Vec<_>) = self
                    .instances
                    .iter()
                    .enumerate()
                    .partition(|(i, _)| i % k == fold);
                Fold {
                    training: self.with_instances(
                        training.into_iter().map(|(_, inst)| inst.clone()).collect(),
                    ),
                    test: self.with_instances(
                        test.into_iter().map(|(_, inst)| inst.clone()).collect(),
                    ),
                }
            })
            .collect();

        Ok(folds)
    }

    fn with_instances(&self, instances: Vec<Instance>) -> Self {
        Self {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            class_values: self.class_values.clone(),
            instances,
        }
    }

    /// Generate a reproducible two-class nominal dataset.
    ///
    /// Every attribute takes values `0..values_per_attribute`. The class
    /// depends on the first two attributes with 10% label noise, and the
    /// positive class is the minority (under 30%).
    pub fn synthetic(
        size: usize,
        num_attributes: usize,
        values_per_attribute: usize,
        seed: u64,
    ) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let num_attributes = num_attributes.max(2);
        let values_per_attribute = values_per_attribute.max(2);

        let instances = (0..size)
            .map(|_| {
                let values: Vec<f64> = (0..num_attributes)
                    .map(|_| rng.gen_range(0..values_per_attribute) as f64)
                    .collect();
                let signal = values[0] == 0.0 && values[1] != 1.0;
                let noisy = rng.gen_bool(0.1);
                let class = usize::from(signal != noisy);
                Instance { values, class }
            })
            .collect();

        Self {
            name: "synthetic".to_string(),
            attributes: (0..num_attributes).map(|i| format!("a{}", i)).collect(),
            class_values: vec!["negative".to_string(), "positive".to_string()],
            instances,
        }
    }
}

/// One train/test partition of a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fold {
    pub training: InstanceSet,
    pub test: InstanceSet,
}
