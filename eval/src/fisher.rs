// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Fisher's exact test for 2x2 contingency tables
//!
//! Tables are given as `a, b, c, d` for the layout
//!
//! ```text
//!   [[a, b],
//!    [c, d]]
//! ```
//!
//! With the margins fixed, `a` follows a hypergeometric distribution: the
//! first row draws `a + b` of the `n` observations, `a + c` of which fall in
//! the first column. Probabilities come from `statrs` in log space.

use statrs::distribution::{Discrete, Hypergeometric};

/// Relative slack when comparing a table's probability to the observed one,
/// so tables that tie up to rounding are counted as at least as extreme.
const TIE_TOLERANCE: f64 = 1e-7;

/// Fisher exact test engine for tables of up to `max_size` observations
#[derive(Debug, Clone, Copy)]
pub struct FisherExact {
    max_size: usize,
}

/// Distribution of the top-left cell given the table margins
struct Margins {
    dist: Hypergeometric,
    /// Smallest and largest value the top-left cell can take
    min: u64,
    max: u64,
}

impl Margins {
    fn of(a: usize, b: usize, c: usize, d: usize) -> Option<Self> {
        let population = (a + b + c + d) as u64;
        let successes = (a + c) as u64;
        let draws = (a + b) as u64;
        let dist = Hypergeometric::new(population, successes, draws).ok()?;
        Some(Self {
            dist,
            min: (successes + draws).saturating_sub(population),
            max: successes.min(draws),
        })
    }

    fn pmf(&self, x: u64) -> f64 {
        self.dist.ln_pmf(x).exp()
    }
}

impl FisherExact {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    /// Largest table total this engine can evaluate
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn margins(&self, a: usize, b: usize, c: usize, d: usize) -> Option<Margins> {
        if a + b + c + d > self.max_size {
            return None;
        }
        Margins::of(a, b, c, d)
    }

    /// Probability of observing exactly this table given its margins.
    ///
    /// Returns `NaN` when the table total exceeds [`FisherExact::max_size`].
    pub fn p_value(&self, a: usize, b: usize, c: usize, d: usize) -> f64 {
        self.margins(a, b, c, d)
            .map_or(f64::NAN, |m| m.pmf(a as u64))
    }

    /// Two-tailed p-value: the summed probability of every table with the
    /// same margins that is no more likely than the observed one.
    ///
    /// The result is clamped to `[0, 1]`; `NaN` when the table is too large.
    pub fn two_tailed(&self, a: usize, b: usize, c: usize, d: usize) -> f64 {
        let Some(margins) = self.margins(a, b, c, d) else {
            return f64::NAN;
        };

        let observed = margins.pmf(a as u64);
        let threshold = observed * (1.0 + TIE_TOLERANCE);
        let total: f64 = (margins.min..=margins.max)
            .map(|x| margins.pmf(x))
            .filter(|&p| p <= threshold)
            .sum();

        total.clamp(0.0, 1.0)
    }
}
