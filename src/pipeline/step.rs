//! Units of computation executed by pooled workers.
//!
//! Two capabilities:
//! - **`Step`**: transforms an input item (stages and sinks).
//! - **`SourceStep`**: produces the next item from nothing (sources).
//!
//! Steps carry no concurrency of their own. A pool holds several instances
//! of the same step and lends one to each in-flight execution.

use crate::pipeline::item::Item;
use crossbeam_channel::{tick, Receiver};
use std::time::{Duration, Instant};

/// Transform executed by a stage or sink worker.
pub trait Step: Send + 'static {
    fn exec(&mut self, item: Item) -> Item;
}

impl Step for Box<dyn Step> {
    fn exec(&mut self, item: Item) -> Item {
        (**self).exec(item)
    }
}

/// Generator driven by a [`Source`](crate::pipeline::Source).
pub trait SourceStep: Send {
    fn exec(&mut self) -> Item;
}

impl SourceStep for Box<dyn SourceStep> {
    fn exec(&mut self) -> Item {
        (**self).exec()
    }
}

// ==================== Delay Step ====================

/// Sleeps for a fixed latency and passes the item through unchanged.
#[derive(Debug, Clone)]
pub struct DelayStep {
    delay: Duration,
}

impl DelayStep {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Step for DelayStep {
    fn exec(&mut self, item: Item) -> Item {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        item
    }
}

// ==================== Source Steps ====================

/// Arithmetic id sequence shared by both generator steps.
#[derive(Debug, Clone, Copy)]
struct IdSequence {
    next: u64,
    increment: u64,
}

impl IdSequence {
    #[inline]
    fn advance(&mut self) -> u64 {
        let id = self.next;
        self.next += self.increment;
        id
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self {
            next: 0,
            increment: 1,
        }
    }
}

/// Produces items immediately with ids `initial, initial + increment, ...`.
///
/// Sharded sources stay disjoint when each uses `initial = shard index` and
/// `increment = shard count`.
#[derive(Debug, Clone, Default)]
pub struct CountingSourceStep {
    seq: IdSequence,
}

impl CountingSourceStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sequence(initial: u64, increment: u64) -> Self {
        Self {
            seq: IdSequence {
                next: initial,
                increment,
            },
        }
    }

    pub fn set_initial(&mut self, initial: u64) {
        self.seq.next = initial;
    }

    pub fn set_increment(&mut self, increment: u64) {
        self.seq.increment = increment;
    }
}

impl SourceStep for CountingSourceStep {
    fn exec(&mut self) -> Item {
        Item::new(self.seq.advance())
    }
}

/// Same sequence as [`CountingSourceStep`], gated by a periodic timer so at
/// most one item is produced per interval.
///
/// The timer lives exactly as long as the step; dropping the step releases it.
pub struct RateLimitedSourceStep {
    ticker: Receiver<Instant>,
    seq: IdSequence,
}

impl RateLimitedSourceStep {
    pub fn new(interval: Duration) -> Self {
        Self {
            ticker: tick(interval),
            seq: IdSequence::default(),
        }
    }

    pub fn with_sequence(interval: Duration, initial: u64, increment: u64) -> Self {
        Self {
            ticker: tick(interval),
            seq: IdSequence {
                next: initial,
                increment,
            },
        }
    }
}

impl SourceStep for RateLimitedSourceStep {
    fn exec(&mut self) -> Item {
        // A tick channel never disconnects while we hold the receiver.
        let _ = self.ticker.recv();
        Item::new(self.seq.advance())
    }
}
