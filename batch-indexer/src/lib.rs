//! # Batch Indexer
//!
//! Main library for the batch search indexer.
//!
//! This crate provides the configuration, dependency wiring and job runner
//! behind the `batch-indexer` binary.

pub mod config;
pub mod logging;
pub mod runner;

pub use config::{Dependencies, IndexerConfig};
pub use runner::{select_job, IndexingJob, JobSelection};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] batch_indexer_pipeline::PipelineError),

    /// Relational store error.
    #[error("Source error: {0}")]
    SourceError(#[from] batch_indexer_repository::SourceError),

    /// Search index error.
    #[error("Sink error: {0}")]
    SinkError(#[from] batch_indexer_repository::SinkError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
