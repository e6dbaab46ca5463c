// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Result files
//!
//! Each summary record is written as one line per measure,
//! `NAME ==> value` with six decimals, or `NAME ==> --------` for values that
//! are not a number. Values are divided by the number of folds first, so
//! records accumulated over a cross-validation are written as averages.

use crate::error::{EvalError, Result};
use crate::measures::QualityMeasures;
use crate::pipeline::{EvaluationConfig, FoldEvaluation, IoErrorPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub const UNFILTERED_FILE: &str = "QM_Unfiltered.txt";
pub const FILTERED_ALL_FILE: &str = "QM_FilteredALL.txt";
pub const FILTERED_BY_CLASS_FILE: &str = "QM_FilteredBYCLASS.txt";
pub const SUMMARY_FILE: &str = "summary.json";

/// Render a record, dividing every value by `folds`
pub fn format_measures(record: &QualityMeasures, folds: usize) -> String {
    let mut out = String::new();
    for (measure, value) in record.iter() {
        if value.is_nan() {
            let _ = writeln!(out, "{} ==> --------", measure);
        } else {
            let _ = writeln!(out, "{} ==> {:.6}", measure, value / folds as f64);
        }
    }
    out
}

/// Write one record to `path`, replacing any existing file
pub fn write_measures(path: &Path, record: &QualityMeasures, folds: usize) -> Result<()> {
    fs::write(path, format_measures(record, folds)).map_err(|e| EvalError::io(path, e))
}

/// Write the unfiltered, globally filtered and per-class filtered records
/// into `dir`, averaged over `folds`
pub fn save_results(
    dir: &Path,
    unfiltered: &QualityMeasures,
    filtered_all: &QualityMeasures,
    filtered_by_class: &QualityMeasures,
    folds: usize,
) -> Result<Vec<PathBuf>> {
    if folds == 0 {
        return Err(EvalError::InvalidArgument("fold count must be positive".to_string()));
    }
    fs::create_dir_all(dir).map_err(|e| EvalError::io(dir, e))?;

    let mut written = Vec::with_capacity(3);
    for (name, record) in [
        (UNFILTERED_FILE, unfiltered),
        (FILTERED_ALL_FILE, filtered_all),
        (FILTERED_BY_CLASS_FILE, filtered_by_class),
    ] {
        let path = dir.join(name);
        write_measures(&path, record, folds)?;
        written.push(path);
    }

    tracing::info!("Quality measures saved to {}", dir.display());
    Ok(written)
}

/// Apply `policy` to the outcome of a write
pub fn handle_io_result<T>(result: Result<T>, policy: IoErrorPolicy) -> Result<T> {
    match (result, policy) {
        (Err(e), IoErrorPolicy::Abort) => {
            tracing::error!("Failed to save results: {}", e);
            std::process::exit(1);
        }
        (result, _) => result,
    }
}

/// Running sums of the three summary records over cross-validation folds
#[derive(Debug, Clone, Default)]
pub struct CrossValidation {
    sums: Option<[QualityMeasures; 3]>,
    folds: usize,
}

impl CrossValidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    /// Add the summaries of one fold
    pub fn add_fold(&mut self, evaluation: &FoldEvaluation) {
        let [unfiltered, all, by_class] = evaluation.summaries();
        match &mut self.sums {
            Some([u, a, c]) => {
                *u += unfiltered;
                *a += all;
                *c += by_class;
            }
            None => self.sums = Some([unfiltered.clone(), all.clone(), by_class.clone()]),
        }
        self.folds += 1;
    }

    /// Accumulated sums: unfiltered, filtered globally, filtered by class
    pub fn sums(&self) -> Option<&[QualityMeasures; 3]> {
        self.sums.as_ref()
    }

    /// Per-fold averages, or `None` before the first fold
    pub fn averages(&self) -> Option<[QualityMeasures; 3]> {
        self.sums
            .as_ref()
            .map(|sums| sums.clone().map(|s| s.divided_by(self.folds)))
    }

    /// Write the averaged result files into `dir`
    pub fn save(&self, dir: &Path, policy: IoErrorPolicy) -> Result<Vec<PathBuf>> {
        let [u, a, c] = self
            .sums
            .as_ref()
            .ok_or_else(|| EvalError::InvalidArgument("no folds evaluated".to_string()))?;
        handle_io_result(save_results(dir, u, a, c, self.folds), policy)
    }
}

/// Machine-readable summary of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub config: EvaluationConfig,
    pub folds: usize,
    pub unfiltered: QualityMeasures,
    pub filtered_all: QualityMeasures,
    pub filtered_by_class: QualityMeasures,
}

impl EvaluationReport {
    pub fn new(config: &EvaluationConfig, cv: &CrossValidation) -> Result<Self> {
        let [unfiltered, filtered_all, filtered_by_class] = cv
            .averages()
            .ok_or_else(|| EvalError::InvalidArgument("no folds evaluated".to_string()))?;
        Ok(Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            config: config.clone(),
            folds: cv.folds(),
            unfiltered,
            filtered_all,
            filtered_by_class,
        })
    }

    /// Save as pretty-printed JSON
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| EvalError::io(path, e))?;
        tracing::info!("Summary saved to {}", path.display());
        Ok(())
    }

    /// Human-readable comparison of the three rule sets
    pub fn format(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<12} {:>12} {:>12} {:>12}",
            "Measure", "Unfiltered", "Global", "By class"
        );
        let _ = writeln!(out, "{:-<51}", "");
        let columns = [&self.unfiltered, &self.filtered_all, &self.filtered_by_class];
        for (measure, _) in self.unfiltered.iter() {
            let _ = write!(out, "{:<12}", measure.name());
            for record in columns {
                let value = record.get(measure);
                if value.is_nan() {
                    let _ = write!(out, " {:>12}", "--------");
                } else {
                    let _ = write!(out, " {:>12.6}", value);
                }
            }
            out.push('\n');
        }
        out
    }
}
