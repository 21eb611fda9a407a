//! Configuration module for the benchmark harness
//!
//! This module handles benchmark configuration including:
//! - Stage latencies and worker pool capacity ([`BenchConfig`])
//! - Allocator cost factors ([`ScaleFactors`])
//! - Per-run settings chosen on the command line ([`RunSettings`])
//!
//! # Files
//!
//! A configuration file is optional. Every field has a default, so a TOML
//! file only needs the values it overrides:
//!
//! ```toml
//! pool_capacity = 32
//! source_interval_ms = 5
//!
//! [stages]
//! stage2_ms = 150
//!
//! [factors]
//! tuned = [2, 1, 20, 4]
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{BenchError, Result, ResultExt};
use crate::pipeline::DEFAULT_POOL_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default Stage 1 latency in milliseconds
pub const DEFAULT_STAGE1_MS: u64 = 100;

/// Default Stage 2 latency in milliseconds
pub const DEFAULT_STAGE2_MS: u64 = 200;

/// Default Stage 3 latency in milliseconds
pub const DEFAULT_STAGE3_MS: u64 = 10;

/// Default sink latency in milliseconds
pub const DEFAULT_SINK_MS: u64 = 50;

/// Untuned allocator factors: stage 1, stage 2, stage 3, sink
pub const UNTUNED_FACTORS: [u32; 4] = [2, 1, 2, 2];

/// Tuned allocator factors: stage 1, stage 2, stage 3, sink
pub const TUNED_FACTORS: [u32; 4] = [2, 1, 20, 4];

// ==================== Stage Timings ====================

/// Fixed latency of each pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTimings {
    pub stage1_ms: u64,
    pub stage2_ms: u64,
    pub stage3_ms: u64,
    pub sink_ms: u64,
}

impl Default for StageTimings {
    fn default() -> Self {
        Self {
            stage1_ms: DEFAULT_STAGE1_MS,
            stage2_ms: DEFAULT_STAGE2_MS,
            stage3_ms: DEFAULT_STAGE3_MS,
            sink_ms: DEFAULT_SINK_MS,
        }
    }
}

impl StageTimings {
    /// Latencies in pipeline order, sink last
    pub fn delays(&self) -> [Duration; 4] {
        [
            Duration::from_millis(self.stage1_ms),
            Duration::from_millis(self.stage2_ms),
            Duration::from_millis(self.stage3_ms),
            Duration::from_millis(self.sink_ms),
        ]
    }
}

// ==================== Scale Factors ====================

/// Allocator cost factors; a smaller factor marks a slower stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleFactors {
    pub untuned: [u32; 4],
    pub tuned: [u32; 4],
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self {
            untuned: UNTUNED_FACTORS,
            tuned: TUNED_FACTORS,
        }
    }
}

impl ScaleFactors {
    /// Factors for the given tuning
    pub fn for_tuning(&self, tuning: Tuning) -> [u32; 4] {
        match tuning {
            Tuning::Untuned => self.untuned,
            Tuning::Tuned => self.tuned,
        }
    }
}

// ==================== Bench Config ====================

/// Benchmark configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Worker pool capacity for every stage and sink
    pub pool_capacity: usize,

    /// When set, sources emit at most one item per interval
    pub source_interval_ms: Option<u64>,

    /// Step latencies
    pub stages: StageTimings,

    /// Allocator cost factors
    pub factors: ScaleFactors,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            source_interval_ms: None,
            stages: StageTimings::default(),
            factors: ScaleFactors::default(),
        }
    }
}

impl BenchConfig {
    /// Load and validate a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BenchError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        tracing::info!("Loaded benchmark config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| BenchError::Serialization(e.to_string()))
    }

    /// Reject configurations no pipeline can run with
    pub fn validate(&self) -> Result<()> {
        if self.pool_capacity == 0 {
            return Err(BenchError::Config(
                "pool_capacity must be at least 1".to_string(),
            ));
        }
        if self.source_interval_ms == Some(0) {
            return Err(BenchError::Config(
                "source_interval_ms must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Source pacing interval, if rate limited
    pub fn source_interval(&self) -> Option<Duration> {
        self.source_interval_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_benchmark_constants() {
        let config = BenchConfig::default();
        assert_eq!(config.pool_capacity, 20);
        assert_eq!(
            config.stages.delays(),
            [
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(10),
                Duration::from_millis(50),
            ]
        );
        assert_eq!(config.factors.for_tuning(Tuning::Untuned), [2, 1, 2, 2]);
        assert_eq!(config.factors.for_tuning(Tuning::Tuned), [2, 1, 20, 4]);
        assert!(config.source_interval().is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BenchConfig::from_toml(
            r#"
            pool_capacity = 8

            [stages]
            stage2_ms = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.pool_capacity, 8);
        assert_eq!(config.stages.stage2_ms, 5);
        assert_eq!(config.stages.stage1_ms, DEFAULT_STAGE1_MS);
        assert_eq!(config.factors, ScaleFactors::default());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = BenchConfig::from_toml("pool_capacity = 0").unwrap_err();
        assert!(err.to_string().contains("pool_capacity"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(BenchConfig::from_toml("source_interval_ms = 0").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = BenchConfig::default();
        config.source_interval_ms = Some(3);
        config.factors.tuned = [1, 1, 1, 1];
        let text = config.to_toml().unwrap();
        assert_eq!(BenchConfig::from_toml(&text).unwrap(), config);
    }
}
