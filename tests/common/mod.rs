//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use channel_scaling::config::{BenchConfig, StageTimings};
use channel_scaling::pipeline::PhaseRecord;
use std::time::Duration;

/// Upper bound for anything that should finish promptly
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// A configuration with millisecond-scale latencies for fast end-to-end runs
pub fn fast_config() -> BenchConfig {
    BenchConfig {
        stages: StageTimings {
            stage1_ms: 2,
            stage2_ms: 4,
            stage3_ms: 1,
            sink_ms: 1,
        },
        ..Default::default()
    }
}

/// Item ids of `records`, in record order
pub fn ids(records: &[PhaseRecord]) -> Vec<u64> {
    records.iter().map(|r| r.item_id).collect()
}

/// Item ids of `records`, sorted
pub fn sorted_ids(records: &[PhaseRecord]) -> Vec<u64> {
    let mut ids = ids(records);
    ids.sort_unstable();
    ids
}
