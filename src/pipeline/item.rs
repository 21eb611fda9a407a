//! The unit of work flowing through a pipeline.

use std::time::{Duration, Instant};

/// An item with an identity and the instant it was created.
///
/// Items are `Copy` and never mutated after creation; every stage reads the
/// same value and the sink measures end-to-end latency from `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub id: u64,
    pub created_at: Instant,
}

impl Item {
    /// Create an item stamped with the current instant.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            created_at: Instant::now(),
        }
    }

    /// Time elapsed since the item was created.
    #[inline]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}
