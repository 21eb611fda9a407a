//! Pipeline head: generates items and publishes them downstream.
//!
//! Records `Active` (generation time) and `Transmission` (publish time) for
//! every item it emits.

use crate::pipeline::item::Item;
use crate::pipeline::recorder::{Phase, Recorder};
use crate::pipeline::signal::DoneSignal;
use crate::pipeline::step::SourceStep;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Why a source stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceExit {
    /// The generated id reached the configured limit.
    LimitReached,
    /// `cancel()` was observed at the top of the loop.
    Cancelled,
    /// Downstream closed its done signal while a publish was pending.
    Aborted,
    /// Every receiver of the output channel went away.
    Disconnected,
}

/// Summary returned by [`Source::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceReport {
    pub published: u64,
    pub exit: SourceExit,
}

pub struct Source<G: SourceStep> {
    id: String,
    factory: Box<dyn Fn() -> G + Send + Sync>,
    out_tx: Sender<Item>,
    out_rx: Receiver<Item>,
    cancelled: Arc<AtomicBool>,
    limit: Option<u64>,
    recorder: Arc<dyn Recorder>,
}

impl<G: SourceStep> Source<G> {
    /// The generator step is built by `factory` when `run` starts and dropped
    /// when it returns.
    pub fn new(
        id: impl Into<String>,
        factory: impl Fn() -> G + Send + Sync + 'static,
        recorder: Arc<dyn Recorder>,
    ) -> Self {
        let (out_tx, out_rx) = bounded(0);
        Self {
            id: id.into(),
            factory: Box::new(factory),
            out_tx,
            out_rx,
            cancelled: Arc::new(AtomicBool::new(false)),
            limit: None,
            recorder,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Stop before emitting the first item whose id is `>= limit`.
    /// A limit of zero means unbounded.
    pub fn set_limit(&mut self, limit: u64) {
        self.limit = (limit > 0).then_some(limit);
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn out(&self) -> Receiver<Item> {
        self.out_rx.clone()
    }

    /// Request a stop. Checked once per loop iteration, so one more item may
    /// still be generated and published after this returns.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Cancellation flag usable from another thread while the source runs.
    pub fn cancel_handle(&self) -> SourceHandle {
        SourceHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Generate and publish items until the limit, a cancel, or downstream
    /// shutdown. The output channel closes when this returns.
    pub fn run(self, downstream_done: DoneSignal) -> SourceReport {
        let Source {
            id,
            factory,
            out_tx,
            out_rx,
            cancelled,
            limit,
            recorder,
        } = self;
        // Only downstream receivers keep the channel alive from here on.
        drop(out_rx);

        let mut step = factory();
        let mut published = 0;
        let mut last = Instant::now();

        let exit = loop {
            if cancelled.load(Ordering::Relaxed) {
                break SourceExit::Cancelled;
            }

            let item = step.exec();
            if limit.is_some_and(|limit| item.id >= limit) {
                break SourceExit::LimitReached;
            }
            let generated = Instant::now();
            recorder.record(&id, item.id, Phase::Active, generated - last);

            let outcome = select! {
                send(out_tx, item) -> sent => match sent {
                    Ok(()) => None,
                    Err(_) => Some(SourceExit::Disconnected),
                },
                recv(downstream_done.receiver()) -> _ => Some(SourceExit::Aborted),
            };
            if let Some(exit) = outcome {
                if exit == SourceExit::Aborted {
                    tracing::warn!("{}: Received done signal, aborting write", id);
                }
                break exit;
            }

            let transmitted = Instant::now();
            recorder.record(&id, item.id, Phase::Transmission, transmitted - generated);
            published += 1;
            last = transmitted;
        };

        tracing::info!("{}: published {} items ({:?})", id, published, exit);
        SourceReport { published, exit }
    }
}

/// Cross-thread cancel flag for a running [`Source`].
#[derive(Debug, Clone)]
pub struct SourceHandle {
    cancelled: Arc<AtomicBool>,
}

impl SourceHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
