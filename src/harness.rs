//! Benchmark topologies for the three concurrency granularities.
//!
//! - **Transaction**: `concurrency` independent workers, each with a private
//!   source, running every step back to back for each of its items.
//! - **Pipeline**: `concurrency / 4` full pipeline replicas, one worker per
//!   stage, all pulling from a single shared source.
//! - **Stage**: one pipeline; the allocator spends `concurrency - 4` extra
//!   workers on whichever stages it estimates are the bottleneck.
//!
//! Every topology shares the same stage ids and step latencies, so their
//! timing records can be compared directly.

use crate::config::{BenchConfig, Mode, RunSettings};
use crate::error::{BenchError, Result, ResultExt};
use crate::pipeline::{
    done_pair, Allocator, CountingSourceStep, DelayStep, DoneSignal, Item, Phase,
    PipelineResult, RateLimitedSourceStep, Recorder, Scalable, Sink, Source, SourceStep, Stage,
    Step,
};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::thread::{Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};

/// Source id.
pub const SOURCE_ID: &str = "Stage 0";

/// Transform stage ids, in pipeline order.
pub const STAGE_IDS: [&str; 3] = ["Stage 1", "Stage 2", "Stage 3"];

/// Sink id.
pub const SINK_ID: &str = "Stage 4";

/// Outcome of one benchmark run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Items that reached the end of the pipeline.
    pub items: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Items per second.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.items as f64 / secs
        } else {
            0.0
        }
    }
}

/// Run the topology selected by `settings`.
pub fn run(
    settings: &RunSettings,
    config: &BenchConfig,
    recorder: Arc<dyn Recorder>,
) -> Result<RunSummary> {
    settings.validate()?;
    config.validate()?;

    tracing::info!(
        "Starting {} run: concurrency {}, {} tasks",
        settings.mode,
        settings.concurrency,
        settings.tasks
    );

    let start = Instant::now();
    let items = match settings.mode {
        Mode::Transaction => scale_transactions(settings, config, recorder)?,
        Mode::Pipeline => scale_pipelines(settings, config, recorder)?,
        Mode::Stage => scale_stages(settings, config, recorder)?,
    };
    let summary = RunSummary {
        items,
        elapsed: start.elapsed(),
    };

    tracing::info!(
        "{} run finished: {} items in {:?}",
        settings.mode,
        summary.items,
        summary.elapsed
    );
    Ok(summary)
}

/// Every transaction owns a source whose ids interleave with the others
/// (`initial = index`, `increment = concurrency`) and runs all four steps
/// itself for each item.
pub fn scale_transactions(
    settings: &RunSettings,
    config: &BenchConfig,
    recorder: Arc<dyn Recorder>,
) -> Result<u64> {
    let transactions = settings.concurrency as u64;
    let interval = config.source_interval();
    let delays = config.stages.delays();
    let (canceller, done) = done_pair();

    let items = std::thread::scope(|scope| -> Result<u64> {
        let workers: Vec<_> = (0..transactions)
            .map(|index| {
                let mut source = Source::new(
                    SOURCE_ID,
                    source_factory(interval, index, transactions),
                    Arc::clone(&recorder),
                );
                source.set_limit(settings.tasks);
                let done = done.clone();
                let recorder = Arc::clone(&recorder);
                scope.spawn(move || run_transaction(source, done, delays, recorder.as_ref()))
            })
            .collect();

        let mut items = 0;
        for worker in workers {
            items += join(worker, "transaction")?;
        }
        Ok(items)
    });

    canceller.cancel();
    items
}

fn run_transaction(
    source: Source<Box<dyn SourceStep>>,
    done: DoneSignal,
    delays: [Duration; 4],
    recorder: &dyn Recorder,
) -> u64 {
    let mut steps = delays.map(DelayStep::new);
    let out = source.out();
    tracing::debug!(
        "Transaction steps: {:?}",
        steps.iter().map(DelayStep::delay).collect::<Vec<_>>()
    );

    std::thread::scope(|scope| {
        scope.spawn(move || source.run(done));

        let mut items = 0;
        for item in out.iter() {
            let item = steps.iter_mut().fold(item, |item, step| step.exec(item));
            recorder.record(SINK_ID, item.id, Phase::Duration, item.age());
            items += 1;
        }
        items
    })
}

/// Full replicas, each with one worker per stage, compete for items from a
/// single source.
pub fn scale_pipelines(
    settings: &RunSettings,
    config: &BenchConfig,
    recorder: Arc<dyn Recorder>,
) -> Result<u64> {
    let replicas = (0..settings.replicas())
        .map(|_| Replica::build(config, &recorder))
        .collect::<PipelineResult<Vec<_>>>()?;
    tracing::info!("Wiring {} pipeline replicas", replicas.len());

    let mut source = Source::new(
        SOURCE_ID,
        source_factory(config.source_interval(), 0, 1),
        Arc::clone(&recorder),
    );
    source.set_limit(settings.tasks);
    let source_out = source.out();
    let (source_cancel, source_done) = done_pair();

    std::thread::scope(|scope| -> Result<u64> {
        let sinks: Vec<_> = replicas
            .into_iter()
            .map(|replica| replica.spawn(scope, source_out.clone()))
            .collect();
        drop(source_out);

        let source_thread = scope.spawn(move || source.run(source_done));

        let mut items = 0;
        for sink in sinks {
            items += join(sink, "sink")?;
        }
        source_cancel.cancel();
        join(source_thread, "source")?;
        Ok(items)
    })
}

/// A single pipeline whose stages are scaled by the allocator before wiring.
pub fn scale_stages(
    settings: &RunSettings,
    config: &BenchConfig,
    recorder: Arc<dyn Recorder>,
) -> Result<u64> {
    let replica = Replica::build(config, &recorder)?;

    let factors = config.factors.for_tuning(settings.tuning);
    let allocator = Allocator::new(factors.to_vec())?;
    let plan = allocator.plan(settings.extra_workers());
    let added = plan
        .apply(&replica.targets())
        .context("Allocating extra stage workers")?;
    tracing::info!(
        "Allocated {} extra workers ({:?} factors {:?}): {:?}",
        added,
        settings.tuning,
        allocator.factors(),
        plan.workers()
    );

    let mut source = Source::new(
        SOURCE_ID,
        source_factory(config.source_interval(), 0, 1),
        Arc::clone(&recorder),
    );
    source.set_limit(settings.tasks);
    let source_out = source.out();
    let first_stage_done = replica.stages[0].done();

    std::thread::scope(|scope| -> Result<u64> {
        let source_thread = scope.spawn(move || source.run(first_stage_done));
        let sink = replica.spawn(scope, source_out);

        let items = join(sink, "sink")?;
        join(source_thread, "source")?;
        Ok(items)
    })
}

/// Generator for one source: immediate, or paced when an interval is set.
fn source_factory(
    interval: Option<Duration>,
    initial: u64,
    increment: u64,
) -> impl Fn() -> Box<dyn SourceStep> + Send + Sync + 'static {
    move || -> Box<dyn SourceStep> {
        match interval {
            Some(interval) => Box::new(RateLimitedSourceStep::with_sequence(
                interval, initial, increment,
            )),
            None => Box::new(CountingSourceStep::with_sequence(initial, increment)),
        }
    }
}

fn join<T>(handle: ScopedJoinHandle<'_, T>, what: &str) -> Result<T> {
    handle
        .join()
        .map_err(|_| BenchError::ThreadPanic(format!("{} thread", what)))
}

/// Three delay stages and a delay sink, not yet wired.
struct Replica {
    stages: [Stage<DelayStep>; 3],
    sink: Sink<DelayStep>,
}

impl Replica {
    fn build(config: &BenchConfig, recorder: &Arc<dyn Recorder>) -> PipelineResult<Self> {
        let [d1, d2, d3, d_sink] = config.stages.delays();
        let capacity = config.pool_capacity;
        let stage = |id: &str, delay: Duration| {
            Stage::with_capacity(
                id,
                capacity,
                move || DelayStep::new(delay),
                Arc::clone(recorder),
            )
        };

        Ok(Self {
            stages: [
                stage(STAGE_IDS[0], d1)?,
                stage(STAGE_IDS[1], d2)?,
                stage(STAGE_IDS[2], d3)?,
            ],
            sink: Sink::with_capacity(
                SINK_ID,
                capacity,
                move || DelayStep::new(d_sink),
                Arc::clone(recorder),
            )?,
        })
    }

    /// Allocator targets in declaration order, sink last.
    fn targets(&self) -> [&dyn Scalable; 4] {
        let [s1, s2, s3] = &self.stages;
        [s1 as &dyn Scalable, s2, s3, &self.sink]
    }

    /// Start every node on `scope`, reading from `input`. Returns the sink's
    /// join handle; the stage threads are joined when the scope ends.
    fn spawn<'scope>(
        self,
        scope: &'scope Scope<'scope, '_>,
        input: Receiver<Item>,
    ) -> ScopedJoinHandle<'scope, u64> {
        let Replica {
            stages: [s1, s2, s3],
            sink,
        } = self;

        let (out1, out2, out3) = (s1.out(), s2.out(), s3.out());
        let (done2, done3, done_sink) = (s2.done(), s3.done(), sink.done());

        scope.spawn(move || s1.run(input, done2));
        scope.spawn(move || s2.run(out1, done3));
        scope.spawn(move || s3.run(out2, done_sink));
        scope.spawn(move || sink.run(out3))
    }
}
