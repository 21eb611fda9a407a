//! Intermediate pipeline node with an elastic worker pool.
//!
//! A stage reads items in arrival order, checks a worker out of its pool for
//! each one, and hands the execution to its own thread so the consume loop
//! can move on. Results are published as soon as they finish, so a fast item
//! may overtake a slower one dispatched before it.
//!
//! Per item the stage records four phases:
//!
//! | Phase        | Measured from → to                                 |
//! |--------------|----------------------------------------------------|
//! | Starvation   | previous worker acquisition → item arrival          |
//! | Saturation   | item arrival → worker acquired                      |
//! | Active       | worker acquired → step finished                     |
//! | Transmission | step finished → result accepted downstream          |

use crate::pipeline::error::PipelineResult;
use crate::pipeline::item::Item;
use crate::pipeline::pool::{WorkerLease, WorkerPool, DEFAULT_POOL_CAPACITY};
use crate::pipeline::recorder::{Phase, Recorder};
use crate::pipeline::signal::{done_pair, Canceller, DoneSignal};
use crate::pipeline::step::Step;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

pub struct Stage<S: Step> {
    id: String,
    pool: Arc<WorkerPool<S>>,
    out_tx: Sender<Item>,
    out_rx: Receiver<Item>,
    canceller: Arc<Canceller>,
    done: DoneSignal,
    recorder: Arc<dyn Recorder>,
}

impl<S: Step> Stage<S> {
    /// Create a stage with the default pool capacity and one worker.
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

        let (out_tx, out_rx) = bounded(0);
        let (canceller, done) = done_pair();
        Ok(Self {
            id,
            pool,
            out_tx,
            out_rx,
            canceller: Arc::new(canceller),
            done,
            recorder,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Output channel. Closed once `run` has drained the pool.
    pub fn out(&self) -> Receiver<Item> {
        self.out_rx.clone()
    }

    /// This stage's done signal, for the upstream neighbour to race against.
    pub fn done(&self) -> DoneSignal {
        self.done.clone()
    }

    /// Close the done signal. Safe to call repeatedly.
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

    /// Snapshot of the provisioned worker count.
    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Control handle usable from another thread while the stage runs.
    pub fn handle(&self) -> StageHandle<S> {
        StageHandle::new(Arc::clone(&self.pool), Arc::clone(&self.canceller))
    }

    /// Process `input` until it closes, then drain the pool and close the
    /// output. Returns the number of items dispatched.
    pub fn run(self, input: Receiver<Item>, downstream_done: DoneSignal) -> u64 {
        tracing::info!("{}: running with {} workers", self.id, self.workers());

        let Stage {
            id,
            pool,
            out_tx,
            out_rx,
            done: own_done,
            recorder,
            ..
        } = self;
        drop(out_rx);

        let id = id.as_str();
        let recorder = recorder.as_ref();
        let out_tx = &out_tx;
        let own_done = &own_done;

        let consumed = consume(
            id,
            pool.as_ref(),
            &input,
            own_done,
            recorder,
            |mut lease, item, acquired| {
                let result = lease.exec(item);
                let executed = Instant::now();
                recorder.record(id, item.id, Phase::Active, executed - acquired);

                select! {
                    send(out_tx, result) -> sent => {
                        if sent.is_ok() {
                            recorder.record(id, item.id, Phase::Transmission, executed.elapsed());
                        }
                    }
                    recv(own_done.receiver()) -> _ => {}
                    recv(downstream_done.receiver()) -> _ => {}
                }
            },
        );

        tracing::info!("{}: finished after {} items", id, consumed);
        consumed
    }
}

/// Shared consume loop for stages and sinks.
///
/// Dispatches each item to `work` on a scoped thread while holding a leased
/// worker. Stops when `input` closes or `own_done` is closed, then drains the
/// pool. Every dispatched execution has finished when this returns.
pub(crate) fn consume<'p, S, F>(
    id: &str,
    pool: &'p WorkerPool<S>,
    input: &Receiver<Item>,
    own_done: &DoneSignal,
    recorder: &dyn Recorder,
    work: F,
) -> u64
where
    S: Step,
    F: Fn(WorkerLease<'p, S>, Item, Instant) + Sync,
{
    let work = &work;
    std::thread::scope(|scope| {
        let mut consumed = 0;
        let mut last_acquired = Instant::now();

        for item in input.iter() {
            if own_done.is_done() {
                tracing::debug!("{}: cancelled, dropping item {}", id, item.id);
                break;
            }

            let arrived = Instant::now();
            recorder.record(id, item.id, Phase::Starvation, arrived - last_acquired);

            let lease = match pool.acquire() {
                Ok(lease) => lease,
                Err(e) => {
                    tracing::error!("{}: failed to acquire worker: {}", id, e);
                    break;
                }
            };
            let acquired = Instant::now();
            recorder.record(id, item.id, Phase::Saturation, acquired - arrived);

            scope.spawn(move || work(lease, item, acquired));
            last_acquired = acquired;
            consumed += 1;
        }

        pool.drain();
        consumed
    })
}

/// Cross-thread control over a running stage or sink.
pub struct StageHandle<S: Step> {
    pool: Arc<WorkerPool<S>>,
    canceller: Arc<Canceller>,
}

impl<S: Step> StageHandle<S> {
    pub(crate) fn new(pool: Arc<WorkerPool<S>>, canceller: Arc<Canceller>) -> Self {
        Self { pool, canceller }
    }

    pub fn name(&self) -> &str {
        self.pool.name()
    }

    pub fn scale_up(&self) -> PipelineResult<()> {
        self.pool.scale_up()
    }

    pub fn scale_down(&self) -> PipelineResult<()> {
        self.pool.scale_down()
    }

    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    pub fn cancel(&self) -> bool {
        self.canceller.cancel()
    }
}

impl<S: Step> Clone for StageHandle<S> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            canceller: Arc::clone(&self.canceller),
        }
    }
}
