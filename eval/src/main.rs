// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Rule quality evaluation CLI
//!
//! Usage:
//!   epm-eval --job folds.json --measure CONF --top-n 3
//!   epm-eval --synthetic --folds 5 --seed 42

use anyhow::{bail, Result};
use clap::Parser;
use epm_eval::pipeline::{EvaluationConfig, EvaluationPipeline, IoErrorPolicy, Job};
use epm_eval::report::{handle_io_result, EvaluationReport, SUMMARY_FILE};
use epm_eval::Measure;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "epm-eval")]
#[command(about = "Evaluate and filter emerging-pattern rules")]
#[command(version)]
struct Args {
    /// JSON job file with rules, training and test sets per fold
    #[arg(short, long, conflicts_with = "synthetic")]
    job: Option<PathBuf>,

    /// Evaluate random rules on a generated dataset
    #[arg(long)]
    synthetic: bool,

    /// Number of folds for the synthetic job
    #[arg(long, default_value_t = 5)]
    folds: usize,

    /// Number of instances for the synthetic job
    #[arg(long, default_value_t = 1000)]
    num_samples: usize,

    /// Number of random rules per fold for the synthetic job
    #[arg(long, default_value_t = 20)]
    num_rules: usize,

    /// Random seed for the synthetic job
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Quality measure used to rank rules (CONF, WRACC, GAIN, FPR, ...)
    #[arg(short, long, default_value = "CONF")]
    measure: Measure,

    /// Number of rules kept by each filter
    #[arg(short = 'n', long, default_value_t = 3)]
    top_n: usize,

    /// Fisher p-value threshold for significant rules
    #[arg(long, default_value_t = epm_eval::DEFAULT_SIGNIFICANCE_LEVEL)]
    significance: f64,

    /// Output directory for result files
    #[arg(short, long, default_value = "results")]
    output: PathBuf,

    /// Score rules on a single thread
    #[arg(long)]
    sequential: bool,

    /// Exit immediately if result files cannot be written
    #[arg(long)]
    abort_on_io_error: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = EvaluationConfig {
        filter_by: args.measure,
        top_n: args.top_n,
        significance_level: args.significance,
        parallel: !args.sequential,
        io_error_policy: if args.abort_on_io_error {
            IoErrorPolicy::Abort
        } else {
            IoErrorPolicy::Propagate
        },
        seed: args.seed,
    };

    let pipeline = EvaluationPipeline::new(config.clone());
    let job = match (&args.job, args.synthetic) {
        (Some(path), _) => Job::load(path)?,
        (None, true) => {
            tracing::info!(
                "Generating synthetic job: {} samples, {} folds, {} rules per fold, seed {}",
                args.num_samples,
                args.folds,
                args.num_rules,
                config.seed
            );
            pipeline.synthetic_job(args.num_samples, args.folds, args.num_rules)?
        }
        (None, false) => bail!("either --job or --synthetic is required"),
    };
    if job.folds.is_empty() {
        bail!("job contains no folds");
    }

    tracing::info!("Rule Quality Evaluation");
    tracing::info!("=======================");
    tracing::info!("Filter: best {} by {}", config.top_n, config.filter_by);
    tracing::info!("Significance level: {}", config.significance_level);

    let progress = ProgressBar::new(job.folds.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] fold {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let cv = pipeline.run_with(&job, |_, _| progress.inc(1))?;
    progress.finish_and_clear();

    let written = cv.save(&args.output, config.io_error_policy)?;
    let report = EvaluationReport::new(&config, &cv)?;
    handle_io_result(
        report.save_json(&args.output.join(SUMMARY_FILE)),
        config.io_error_policy,
    )?;

    println!("\n{}", "=".repeat(51));
    println!("AVERAGED OVER {} FOLD(S)", cv.folds());
    println!("{}", "=".repeat(51));
    println!("{}", report.format());
    for path in written {
        println!("Saved: {}", path.display());
    }

    Ok(())
}
