//! Error types for the indexing pipeline.
//!
//! Failures fall into three tiers:
//!
//! - [`TransformError`]: one record could not be turned into a document. The
//!   record is dropped and the run continues.
//! - [`StageError`]: a read or write of a whole chunk failed. The chunk's stage
//!   work is abandoned and the failure counts against the skip limit.
//! - [`PipelineError`]: the run cannot continue, most notably because the skip
//!   limit was exceeded.

use batch_indexer_repository::{SinkError, SourceError};
use thiserror::Error;

/// Errors raised while transforming a single record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// The record has no primary key, so no document id can be derived.
    #[error("record has no primary key")]
    MissingId,

    /// A decimal column does not fit a finite float.
    #[error("field `{field}` cannot be represented as a finite number: {value}")]
    NumericConversion { field: &'static str, value: String },

    /// The transformer panicked.
    #[error("transformer panicked: {0}")]
    Panicked(String),
}

impl TransformError {
    /// Create a numeric conversion error.
    pub fn numeric(field: &'static str, value: impl ToString) -> Self {
        Self::NumericConversion {
            field,
            value: value.to_string(),
        }
    }
}

/// Errors raised by the read or write stage of a chunk.
#[derive(Error, Debug, Clone)]
pub enum StageError {
    /// Reading the next page from the source failed.
    #[error("Read stage failed: {0}")]
    Read(#[from] SourceError),

    /// Writing the chunk to the search index failed.
    #[error("Write stage failed: {0}")]
    Write(#[from] SinkError),
}

/// Errors that stop a pipeline run or prevent it from starting.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// More errors were absorbed than the skip limit allows.
    #[error("Skip limit exceeded: {errors} errors (limit {limit}); last error: {last_error}")]
    SkipLimitExceeded {
        errors: usize,
        limit: usize,
        last_error: String,
    },

    /// The pipeline was configured with invalid settings.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A blocking worker task was cancelled or died outside a record.
    #[error("Worker task failed: {0}")]
    WorkerError(String),
}

impl PipelineError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a worker task error.
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::WorkerError(msg.into())
    }
}
