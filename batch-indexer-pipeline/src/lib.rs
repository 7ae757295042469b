//! # Batch Indexer Pipeline
//!
//! This crate provides the pipeline that reads records from the relational
//! store and bulk-indexes them as search documents.
//!
//! ## Architecture
//!
//! The pipeline follows the Cursor-Processor-Loader pattern:
//!
//! 1. **Cursor**: Reads pages of records in primary key order
//! 2. **Processor**: Transforms records into search documents
//! 3. **Loader**: Upserts documents into OpenSearch
//! 4. **Orchestrator**: Runs chunks through the stages under a skip limit
//!
//! A [`job::JobRun`] wraps one orchestrator run with its id and parameters.

pub mod cursor;
pub mod errors;
pub mod job;
pub mod loader;
pub mod orchestrator;
pub mod processor;

pub use cursor::SourceCursor;
pub use errors::{PipelineError, StageError, TransformError};
pub use job::{JobParameters, JobRun, JobStatus};
pub use loader::{BatchWriteResult, IndexLoader, LoaderConfig};
pub use orchestrator::{ChunkOrchestrator, OrchestratorConfig, RunSummary};
pub use processor::{ChunkProcessor, ProductTransformer, Transformer, UserTransformer};
