//! Error handling for the benchmark harness
//!
//! This module defines the application-level error type and a Result alias.
//! Pipeline runtime errors live in [`crate::pipeline::PipelineError`] and
//! convert into [`BenchError`] with `?`.

use crate::pipeline::PipelineError;
use thiserror::Error;

/// Main error type for harness operations
#[derive(Error, Debug)]
pub enum BenchError {
    /// Errors raised by the pipeline runtime
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Errors related to configuration loading or validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A worker thread panicked
    #[error("Thread panicked: {0}")]
    ThreadPanic(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<BenchError>,
    },
}

impl BenchError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        BenchError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, PipelineError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| BenchError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| BenchError::from(e).with_context(f()))
    }
}
