//! Terminal pipeline node.
//!
//! Same acquisition protocol as [`Stage`](crate::pipeline::Stage), but after
//! the step executes the sink records the item's end-to-end `Duration`
//! instead of publishing it.

use crate::pipeline::error::PipelineResult;
use crate::pipeline::item::Item;
use crate::pipeline::pool::{WorkerPool, DEFAULT_POOL_CAPACITY};
use crate::pipeline::recorder::{Phase, Recorder};
use crate::pipeline::signal::{done_pair, Canceller, DoneSignal};
use crate::pipeline::stage::{consume, StageHandle};
use crate::pipeline::step::Step;
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::time::Instant;

pub struct Sink<S: Step> {
    id: String,
    pool: Arc<WorkerPool<S>>,
    canceller: Arc<Canceller>,
    done: DoneSignal,
    recorder: Arc<dyn Recorder>,
}

impl<S: Step> Sink<S> {
    pub fn new(
        id: impl Into<String>,
        factory: impl Fn() -> S + Send + Sync + 'static,
        recorder: Arc<dyn Recorder>,
    ) -> PipelineResult<Self> {
        Self::with_capacity(id, DEFAULT_POOL_CAPACITY, factory, recorder)
    }

    pub fn with_capacity(
        id: impl Into<String>,
        capacity: usize,
        factory: impl Fn() -> S + Send + Sync + 'static,
        recorder: Arc<dyn Recorder>,
    ) -> PipelineResult<Self> {
        let id = id.into();
        let pool = Arc::new(WorkerPool::new(id.clone(), capacity, factory));
        pool.scale_up()?;

        let (canceller, done) = done_pair();
        Ok(Self {
            id,
            pool,
            canceller: Arc::new(canceller),
            done,
            recorder,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn done(&self) -> DoneSignal {
        self.done.clone()
    }

    pub fn cancel(&self) -> bool {
        self.canceller.cancel()
    }

    pub fn scale_up(&self) -> PipelineResult<()> {
        self.pool.scale_up()
    }

    pub fn scale_down(&self) -> PipelineResult<()> {
        self.pool.scale_down()
    }

    pub fn drain(&self) -> usize {
        self.pool.drain()
    }

    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    pub fn handle(&self) -> StageHandle<S> {
        StageHandle::new(Arc::clone(&self.pool), Arc::clone(&self.canceller))
    }

    /// Consume `input` until it closes and every execution has finished.
    /// Returns the number of items consumed.
    pub fn run(self, input: Receiver<Item>) -> u64 {
        tracing::info!("{}: running with {} workers", self.id, self.workers());

        let id = self.id.as_str();
        let recorder = self.recorder.as_ref();

        let consumed = consume(
            id,
            self.pool.as_ref(),
            &input,
            &self.done,
            recorder,
            |mut lease, item, acquired| {
                let result = lease.exec(item);
                recorder.record(id, result.id, Phase::Active, acquired.elapsed());
                recorder.record(id, result.id, Phase::Duration, result.age());
            },
        );

        tracing::info!("{}: finished after {} items", self.id, consumed);
        consumed
    }
}
