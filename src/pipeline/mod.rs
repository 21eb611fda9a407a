//! Channel-based pipeline runtime.
//!
//! Items flow through rendezvous channels: Source → Stage → … → Sink. Done
//! signals flow the other way so a stage can abandon a pending publish once
//! its consumer is gone.
//!
//! # Architecture
//!
//! ```text
//! [Source] ──► [Stage 1] ──► [Stage 2] ──► [Stage 3] ──► [Sink]
//!     ◄─ done ──    ◄─ done ──    ◄─ done ──    ◄─ done ──
//! ```
//!
//! # Design
//!
//! - **Pool as semaphore**: a stage's `WorkerPool` is a bounded channel of
//!   step instances; checking one out is the right to run one execution.
//! - **Thread per execution**: each dispatched item runs on a scoped thread,
//!   so the consume loop never waits on a step.
//! - **Close-once done signals**: cancellation is a dropped sender, observed
//!   by `select!` next to every blocking publish.
//! - **Static allocation**: `Allocator` spreads extra workers before wiring.

pub mod allocator;
pub mod error;
pub mod item;
pub mod pool;
pub mod recorder;
pub mod signal;
pub mod sink;
pub mod source;
pub mod stage;
pub mod step;

pub use allocator::{Allocation, Allocator, Scalable};
pub use error::{PipelineError, PipelineResult};
pub use item::Item;
pub use pool::{WorkerLease, WorkerPool, DEFAULT_POOL_CAPACITY};
pub use recorder::{CsvRecorder, MemoryRecorder, NullRecorder, Phase, PhaseRecord, Recorder};
pub use signal::{done_pair, Canceller, DoneSignal};
pub use sink::Sink;
pub use source::{Source, SourceExit, SourceHandle, SourceReport};
pub use stage::{Stage, StageHandle};
pub use step::{CountingSourceStep, DelayStep, RateLimitedSourceStep, SourceStep, Step};
