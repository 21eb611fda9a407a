//! Per-run settings chosen on the command line
//!
//! These select which concurrency granularity to benchmark and how much
//! concurrency and work it gets, separate from the [`BenchConfig`] that
//! describes the pipeline itself.
//!
//! [`BenchConfig`]: super::BenchConfig

use crate::pipeline::{PipelineError, PipelineResult};
use std::fmt;

/// Workers needed for one full pipeline: three stages and a sink.
pub const PIPELINE_WIDTH: usize = 4;

/// Default concurrency
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Default number of items to push through
pub const DEFAULT_TASKS: u64 = 100;

/// Where concurrency is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Each transaction runs every step itself, sequentially
    #[default]
    Transaction,
    /// Independent full pipeline replicas share one source
    Pipeline,
    /// One pipeline whose stages get extra workers
    Stage,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Transaction => "transaction",
            Mode::Pipeline => "pipeline",
            Mode::Stage => "stage",
        };
        f.write_str(name)
    }
}

/// Which allocator factors to use in stage mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tuning {
    #[default]
    Untuned,
    Tuned,
}

impl From<bool> for Tuning {
    fn from(tuned: bool) -> Self {
        if tuned {
            Tuning::Tuned
        } else {
            Tuning::Untuned
        }
    }
}

/// Settings for a single benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub mode: Mode,
    pub tuning: Tuning,
    /// Maximum concurrency: transactions, total pipeline workers, or total
    /// stage workers depending on `mode`
    pub concurrency: usize,
    /// Number of items to process
    pub tasks: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            tuning: Tuning::default(),
            concurrency: DEFAULT_CONCURRENCY,
            tasks: DEFAULT_TASKS,
        }
    }
}

impl RunSettings {
    /// Smallest concurrency `mode` can start with
    pub fn required_concurrency(&self) -> usize {
        match self.mode {
            Mode::Transaction => 1,
            Mode::Pipeline | Mode::Stage => PIPELINE_WIDTH,
        }
    }

    /// Check the structural minimum before anything is wired
    pub fn validate(&self) -> PipelineResult<()> {
        let required = self.required_concurrency();
        if self.concurrency < required {
            return Err(PipelineError::InsufficientConcurrency {
                required,
                requested: self.concurrency,
            });
        }
        Ok(())
    }

    /// Full pipeline replicas that fit in the concurrency budget
    pub fn replicas(&self) -> usize {
        self.concurrency / PIPELINE_WIDTH
    }

    /// Extra workers beyond one per stage
    pub fn extra_workers(&self) -> usize {
        self.concurrency.saturating_sub(PIPELINE_WIDTH)
    }
}
