//! # channel-scaling: Concurrency Granularity Benchmarks
//!
//! A channel-based pipeline runtime for comparing three ways of spending the
//! same concurrency budget on a four-step workload: whole transactions,
//! whole pipeline replicas, or individual stages.
//!
//! ## Architecture
//!
//! - **Pipeline**: Source, Stage and Sink nodes joined by rendezvous channels,
//!   each stage backed by a scalable worker pool
//! - **Allocator**: Static placement of extra workers on bottleneck stages
//! - **Recorder**: Per-item phase timings, written as CSV
//! - **Harness**: The three benchmark topologies
//!
//! ## Example
//!
//! ```no_run
//! use channel_scaling::{
//!     config::{BenchConfig, Mode, RunSettings},
//!     harness,
//!     pipeline::CsvRecorder,
//! };
//! use std::sync::Arc;
//!
//! fn main() -> channel_scaling::Result<()> {
//!     let settings = RunSettings {
//!         mode: Mode::Stage,
//!         concurrency: 8,
//!         ..Default::default()
//!     };
//!     let recorder = Arc::new(CsvRecorder::stdout()?);
//!     let summary = harness::run(&settings, &BenchConfig::default(), recorder)?;
//!     eprintln!("Throughput: {:.1}/s", summary.throughput());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod harness;
pub mod pipeline;

// Re-export commonly used types
pub use config::{BenchConfig, Mode, RunSettings, Tuning};
pub use error::{BenchError, Result};
pub use harness::RunSummary;
pub use pipeline::{PipelineError, Recorder, Sink, Source, Stage};
