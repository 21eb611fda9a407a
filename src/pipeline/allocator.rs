//! One-shot worker budget planning.
//!
//! Every stage starts with one worker. The allocator hands out the remaining
//! budget one worker at a time, always to the stage with the lowest estimated
//! throughput (`workers × factor`). Ties go to the stage declared first.
//!
//! A smaller factor means a slower stage that gains more from an extra
//! worker. The plan is computed once before the pipeline is wired and never
//! revisited at runtime.
//!
//! # Example
//!
//! ```
//! use channel_scaling::pipeline::Allocator;
//!
//! let plan = Allocator::new(vec![2, 1, 2, 2]).unwrap().plan(2);
//! assert_eq!(plan.increments(), &[1, 0]);
//! assert_eq!(plan.workers(), &[2, 2, 1, 1]);
//! ```

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::sink::Sink;
use crate::pipeline::stage::{Stage, StageHandle};
use crate::pipeline::step::Step;

/// Anything whose worker pool can grow by one.
pub trait Scalable {
    fn name(&self) -> &str;
    fn scale_up(&self) -> PipelineResult<()>;
}

impl<S: Step> Scalable for Stage<S> {
    fn name(&self) -> &str {
        self.id()
    }

    fn scale_up(&self) -> PipelineResult<()> {
        Stage::scale_up(self)
    }
}

impl<S: Step> Scalable for Sink<S> {
    fn name(&self) -> &str {
        self.id()
    }

    fn scale_up(&self) -> PipelineResult<()> {
        Sink::scale_up(self)
    }
}

impl<S: Step> Scalable for StageHandle<S> {
    fn name(&self) -> &str {
        StageHandle::name(self)
    }

    fn scale_up(&self) -> PipelineResult<()> {
        StageHandle::scale_up(self)
    }
}

/// Greedy bottleneck balancer over per-stage cost factors.
#[derive(Debug, Clone)]
pub struct Allocator {
    factors: Vec<u32>,
}

impl Allocator {
    /// Factors are listed in declaration order, sink last.
    pub fn new(factors: Vec<u32>) -> PipelineResult<Self> {
        if factors.is_empty() {
            return Err(PipelineError::AllocationMismatch {
                factors: 0,
                targets: 0,
            });
        }
        Ok(Self { factors })
    }

    pub fn factors(&self) -> &[u32] {
        &self.factors
    }

    /// Distribute `budget` extra workers on top of one baseline worker each.
    pub fn plan(&self, budget: usize) -> Allocation {
        let mut workers = vec![1u32; self.factors.len()];
        let mut increments = Vec::with_capacity(budget);

        for _ in 0..budget {
            let (slowest, _) = workers
                .iter()
                .zip(&self.factors)
                .map(|(&w, &f)| u64::from(w) * u64::from(f))
                .enumerate()
                .min_by_key(|&(index, throughput)| (throughput, index))
                .unwrap_or((0, 0));
            workers[slowest] += 1;
            increments.push(slowest);
        }

        tracing::debug!("Allocation plan for budget {}: {:?}", budget, workers);
        Allocation {
            workers,
            increments,
        }
    }
}

/// Result of [`Allocator::plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    workers: Vec<u32>,
    increments: Vec<usize>,
}

impl Allocation {
    /// Final worker count per stage, baseline included.
    pub fn workers(&self) -> &[u32] {
        &self.workers
    }

    /// Stage index that received each extra worker, in order.
    pub fn increments(&self) -> &[usize] {
        &self.increments
    }

    /// Scale up `targets` in plan order. Refusals from a full pool are
    /// logged and skipped. Returns how many workers were actually added.
    pub fn apply(&self, targets: &[&dyn Scalable]) -> PipelineResult<usize> {
        if targets.len() != self.workers.len() {
            return Err(PipelineError::AllocationMismatch {
                factors: self.workers.len(),
                targets: targets.len(),
            });
        }

        let mut applied = 0;
        for &index in &self.increments {
            let target = targets[index];
            match target.scale_up() {
                Ok(()) => applied += 1,
                Err(e @ PipelineError::CapacityExceeded { .. }) => {
                    tracing::warn!("Skipping extra worker for {}: {}", target.name(), e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(applied)
    }
}
