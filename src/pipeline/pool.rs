//! Resizable worker pool used as a counting semaphore.
//!
//! Each token in the pool is a step instance. Holding a token is the right to
//! run one execution concurrently; returning it lets the next item proceed.
//! Membership changes only ever move tokens through the bounded channel, so
//! acquire, recycle and scaling are safe from any thread.
//!
//! The worker count is reserved atomically *before* a token is added or
//! removed. It is exact under sequential use and a snapshot otherwise.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::item::Item;
use crate::pipeline::step::Step;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default pool capacity for stages and sinks.
pub const DEFAULT_POOL_CAPACITY: usize = 20;

/// Constructor for fresh step instances.
pub type StepFactory<S> = Box<dyn Fn() -> S + Send + Sync>;

pub struct WorkerPool<S: Step> {
    name: String,
    tokens_tx: Sender<S>,
    tokens_rx: Receiver<S>,
    capacity: usize,
    size: AtomicUsize,
    factory: StepFactory<S>,
}

impl<S: Step> WorkerPool<S> {
    /// Create an empty pool. Call [`scale_up`](Self::scale_up) to provision workers.
    pub fn new(
        name: impl Into<String>,
        capacity: usize,
        factory: impl Fn() -> S + Send + Sync + 'static,
    ) -> Self {
        // Tokens in the channel never exceed `size`, which never exceeds
        // `capacity`, so sends into the pool never block.
        let (tokens_tx, tokens_rx) = bounded(capacity);
        Self {
            name: name.into(),
            tokens_tx,
            tokens_rx,
            capacity,
            size: AtomicUsize::new(0),
            factory: Box::new(factory),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Provisioned workers, checked out or idle.
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    /// Idle workers currently waiting in the pool.
    pub fn idle(&self) -> usize {
        self.tokens_rx.len()
    }

    /// Add one freshly constructed worker.
    pub fn scale_up(&self) -> PipelineResult<()> {
        self.size
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.capacity).then_some(n + 1)
            })
            .map_err(|_| PipelineError::CapacityExceeded {
                stage: self.name.clone(),
                capacity: self.capacity,
            })?;

        if self.tokens_tx.send((self.factory)()).is_err() {
            self.size.fetch_sub(1, Ordering::AcqRel);
            return Err(PipelineError::ChannelSend);
        }
        tracing::debug!("{}: scaled up to {} workers", self.name, self.size());
        Ok(())
    }

    /// Retire one worker, blocking until one is idle.
    pub fn scale_down(&self) -> PipelineResult<()> {
        self.size
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .map_err(|_| PipelineError::Underflow {
                stage: self.name.clone(),
            })?;

        if self.tokens_rx.recv().is_err() {
            self.size.fetch_add(1, Ordering::AcqRel);
            return Err(PipelineError::ChannelRecv);
        }
        tracing::debug!("{}: scaled down to {} workers", self.name, self.size());
        Ok(())
    }

    /// Retire every worker, waiting for in-flight executions to return theirs.
    /// Returns the number of workers retired.
    pub fn drain(&self) -> usize {
        let mut retired = 0;
        while self.scale_down().is_ok() {
            retired += 1;
        }
        tracing::debug!("{}: drained {} workers", self.name, retired);
        retired
    }

    /// Block until a worker is idle and check it out.
    ///
    /// Blocks indefinitely while the pool is empty, until someone scales up.
    pub fn acquire(&self) -> PipelineResult<WorkerLease<'_, S>> {
        let step = self
            .tokens_rx
            .recv()
            .map_err(|_| PipelineError::ChannelRecv)?;
        Ok(WorkerLease {
            pool: self,
            step: Some(step),
        })
    }

    fn recycle(&self, step: S) {
        let _ = self.tokens_tx.send(step);
    }
}

/// A checked-out worker. Returned to its pool on drop, whatever happened
/// while it was held.
pub struct WorkerLease<'a, S: Step> {
    pool: &'a WorkerPool<S>,
    step: Option<S>,
}

impl<S: Step> WorkerLease<'_, S> {
    /// Run the leased step on `item`.
    pub fn exec(&mut self, item: Item) -> Item {
        match self.step.as_mut() {
            Some(step) => step.exec(item),
            // Only `Drop` takes the step out.
            None => item,
        }
    }
}

impl<S: Step> Drop for WorkerLease<'_, S> {
    fn drop(&mut self) {
        if let Some(step) = self.step.take() {
            self.pool.recycle(step);
        }
    }
}
