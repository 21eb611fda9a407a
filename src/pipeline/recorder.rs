//! Timing records emitted by pipeline components.
//!
//! Every component reports per-item phase timings through a shared
//! [`Recorder`]. The benchmark binary writes them as CSV on stdout:
//!
//! ```text
//! Stage,Element,Step,Microseconds
//! Stage 1,0,Starvation,12
//! Stage 1,0,Saturation,1
//! Stage 1,0,Active,100134
//! ```

use std::fmt;
use std::io::{self, BufWriter, Write};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// CSV header line (without newline).
pub const CSV_HEADER: &str = "Stage,Element,Step,Microseconds";

/// Timed phase of an item's trip through a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Step execution.
    Active,
    /// Waiting for the next input item.
    Starvation,
    /// Waiting for a free worker.
    Saturation,
    /// Publishing the result downstream.
    Transmission,
    /// Creation to terminal consumption.
    Duration,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Active => "Active",
            Phase::Starvation => "Starvation",
            Phase::Saturation => "Saturation",
            Phase::Transmission => "Transmission",
            Phase::Duration => "Duration",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single timing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseRecord {
    pub stage: String,
    pub item_id: u64,
    pub phase: Phase,
    pub elapsed: Duration,
}

impl PhaseRecord {
    pub fn micros(&self) -> u128 {
        self.elapsed.as_micros()
    }
}

/// Destination for timing records. Shared by every worker thread.
pub trait Recorder: Send + Sync {
    fn record(&self, stage: &str, item_id: u64, phase: Phase, elapsed: Duration);

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ==================== CSV ====================

/// Writes records as `Stage,Element,Step,Microseconds` lines.
pub struct CsvRecorder<W: Write + Send> {
    writer: Mutex<BufWriter<W>>,
}

impl<W: Write + Send> CsvRecorder<W> {
    /// Wrap `writer` and emit the header line.
    pub fn new(writer: W) -> io::Result<Self> {
        let mut writer = BufWriter::new(writer);
        writeln!(writer, "{}", CSV_HEADER)?;
        Ok(Self {
            writer: Mutex::new(writer),
        })
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        let writer = match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        writer.into_inner().map_err(|e| e.into_error())
    }
}

impl CsvRecorder<io::Stdout> {
    pub fn stdout() -> io::Result<Self> {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> Recorder for CsvRecorder<W> {
    fn record(&self, stage: &str, item_id: u64, phase: Phase, elapsed: Duration) {
        let mut writer = lock(&self.writer);
        let _ = writeln!(
            writer,
            "{},{},{},{}",
            stage,
            item_id,
            phase,
            elapsed.as_micros()
        );
    }

    fn flush(&self) -> io::Result<()> {
        lock(&self.writer).flush()
    }
}

// ==================== In-memory ====================

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    records: Mutex<Vec<PhaseRecord>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records in arrival order.
    pub fn records(&self) -> Vec<PhaseRecord> {
        lock(&self.records).clone()
    }

    /// Records for one stage and phase, in arrival order.
    pub fn for_phase(&self, stage: &str, phase: Phase) -> Vec<PhaseRecord> {
        lock(&self.records)
            .iter()
            .filter(|r| r.phase == phase && r.stage == stage)
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        lock(&self.records).len()
    }
}

impl Recorder for MemoryRecorder {
    fn record(&self, stage: &str, item_id: u64, phase: Phase, elapsed: Duration) {
        lock(&self.records).push(PhaseRecord {
            stage: stage.to_string(),
            item_id,
            phase,
            elapsed,
        });
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn record(&self, _stage: &str, _item_id: u64, _phase: Phase, _elapsed: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_layout() {
        let recorder = CsvRecorder::new(Vec::new()).expect("header write");
        recorder.record("Stage 1", 4, Phase::Starvation, Duration::from_micros(250));
        recorder.record("Stage 4", 4, Phase::Duration, Duration::from_millis(3));
        let out = String::from_utf8(recorder.into_inner().expect("flush")).expect("utf8");
        assert_eq!(
            out,
            "Stage,Element,Step,Microseconds\nStage 1,4,Starvation,250\nStage 4,4,Duration,3000\n"
        );
    }

    #[test]
    fn test_memory_recorder_filters() {
        let recorder = MemoryRecorder::new();
        recorder.record("Stage 1", 0, Phase::Active, Duration::from_micros(10));
        recorder.record("Stage 2", 0, Phase::Active, Duration::from_micros(20));
        recorder.record("Stage 1", 1, Phase::Saturation, Duration::from_micros(5));

        assert_eq!(recorder.count(), 3);
        let active = recorder.for_phase("Stage 1", Phase::Active);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].micros(), 10);
    }

    #[test]
    fn test_phase_names() {
        let names: Vec<String> = [
            Phase::Active,
            Phase::Starvation,
            Phase::Saturation,
            Phase::Transmission,
            Phase::Duration,
        ]
        .iter()
        .map(|p| p.to_string())
        .collect();
        assert_eq!(
            names,
            ["Active", "Starvation", "Saturation", "Transmission", "Duration"]
        );
    }
}
