//! Test data builders for wiring small pipelines

use channel_scaling::pipeline::{
    CountingSourceStep, DelayStep, MemoryRecorder, Recorder, Sink, Source, SourceReport, Stage,
};
use std::sync::Arc;
use std::time::Duration;

/// Result of running a [`LinearPipeline`] to completion
pub struct LinearRun {
    pub source: SourceReport,
    pub stages: Vec<u64>,
    pub sink: u64,
    pub recorder: Arc<MemoryRecorder>,
}

/// Builder for a source, any number of delay stages, and a delay sink
pub struct LinearPipeline {
    limit: u64,
    stage_delays: Vec<Duration>,
    stage_workers: usize,
    sink_delay: Duration,
}

impl LinearPipeline {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            stage_delays: Vec::new(),
            stage_workers: 1,
            sink_delay: Duration::ZERO,
        }
    }

    pub fn stage(mut self, delay: Duration) -> Self {
        self.stage_delays.push(delay);
        self
    }

    pub fn stage_workers(mut self, workers: usize) -> Self {
        self.stage_workers = workers;
        self
    }

    pub fn sink(mut self, delay: Duration) -> Self {
        self.sink_delay = delay;
        self
    }

    /// Wire and run every node on its own thread, blocking until the sink
    /// has consumed everything.
    pub fn run(self) -> LinearRun {
        let recorder = Arc::new(MemoryRecorder::new());
        let shared: Arc<dyn Recorder> = recorder.clone();

        let mut source = Source::new("Stage 0", CountingSourceStep::new, Arc::clone(&shared));
        source.set_limit(self.limit);

        let stages: Vec<Stage<DelayStep>> = self
            .stage_delays
            .iter()
            .enumerate()
            .map(|(i, &delay)| {
                let stage = Stage::new(
                    format!("Stage {}", i + 1),
                    move || DelayStep::new(delay),
                    Arc::clone(&shared),
                )
                .unwrap();
                for _ in 1..self.stage_workers {
                    stage.scale_up().unwrap();
                }
                stage
            })
            .collect();
        let sink_delay = self.sink_delay;
        let sink = Sink::new(
            format!("Stage {}", stages.len() + 1),
            move || DelayStep::new(sink_delay),
            Arc::clone(&shared),
        )
        .unwrap();

        // Each node's downstream done signal is its consumer's.
        let mut downstream = Vec::with_capacity(stages.len() + 1);
        for stage in stages.iter().skip(1) {
            downstream.push(stage.done());
        }
        downstream.push(sink.done());
        let source_done = stages.first().map_or_else(|| sink.done(), |s| s.done());

        std::thread::scope(|scope| {
            let mut input = source.out();
            let source_thread = scope.spawn(move || source.run(source_done));

            let stage_threads: Vec<_> = stages
                .into_iter()
                .zip(downstream)
                .map(|(stage, done)| {
                    let stage_input = std::mem::replace(&mut input, stage.out());
                    scope.spawn(move || stage.run(stage_input, done))
                })
                .collect();

            let sink = sink.run(input);
            LinearRun {
                source: source_thread.join().unwrap(),
                stages: stage_threads
                    .into_iter()
                    .map(|t| t.join().unwrap())
                    .collect(),
                sink,
                recorder,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel_scaling::pipeline::SourceExit;

    #[test]
    fn test_source_straight_into_sink() {
        let run = LinearPipeline::new(5).run();
        assert_eq!(run.source.exit, SourceExit::LimitReached);
        assert!(run.stages.is_empty());
        assert_eq!(run.sink, 5);
    }
}
