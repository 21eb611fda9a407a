//! Concurrency granularity benchmark - Main Entry Point
//!
//! Runs one topology and writes a CSV timing record per item phase to stdout.
//! Logs and the final throughput line go to stderr.

use anyhow::{Context, Result};
use channel_scaling::{
    config::{BenchConfig, Mode, RunSettings, Tuning, DEFAULT_CONCURRENCY, DEFAULT_TASKS},
    harness,
    pipeline::{CsvRecorder, Recorder},
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(version, about = "Compare transaction, pipeline and stage level concurrency")]
struct Args {
    /// Scale individual stages of a single pipeline
    #[arg(long, conflicts_with = "pipeline")]
    stage: bool,

    /// Scale whole pipeline replicas
    #[arg(long)]
    pipeline: bool,

    /// Use the tuned allocator factors (stage mode only)
    #[arg(long)]
    tuned: bool,

    /// Maximum concurrency
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Number of items to process
    #[arg(long, default_value_t = DEFAULT_TASKS)]
    tasks: u64,

    /// Optional TOML file overriding stage latencies and pool settings
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn settings(&self) -> RunSettings {
        let mode = if self.stage {
            Mode::Stage
        } else if self.pipeline {
            Mode::Pipeline
        } else {
            Mode::Transaction
        };
        RunSettings {
            mode,
            tuning: Tuning::from(self.tuned),
            concurrency: self.concurrency,
            tasks: self.tasks,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let settings = args.settings();

    let config = match &args.config {
        Some(path) => BenchConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => BenchConfig::default(),
    };

    let recorder = Arc::new(CsvRecorder::stdout().context("Failed to write CSV header")?);
    let summary = harness::run(&settings, &config, recorder.clone())?;
    recorder.flush().context("Failed to flush timing records")?;

    eprintln!("Throughput: {:.1}/s", summary.throughput());
    Ok(())
}
