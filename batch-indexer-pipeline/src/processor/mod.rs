//! Processor module for the indexing pipeline.
//!
//! Transforms source records into search documents.

mod product_transformer;
mod user_transformer;

pub use product_transformer::ProductTransformer;
pub use user_transformer::UserTransformer;

use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error, instrument};

use crate::errors::{PipelineError, TransformError};
use batch_indexer_shared::{IndexDocument, SourceRecord};

/// Turns one source record into one search document.
///
/// Implementations must be pure: the same record and timestamp always yield
/// the same document.
pub trait Transformer: Send + Sync + 'static {
    type Record: SourceRecord + 'static;
    type Document: IndexDocument + 'static;

    fn transform(
        &self,
        record: &Self::Record,
        indexed_at: DateTime<Utc>,
    ) -> Result<Self::Document, TransformError>;
}

/// Documents produced from one chunk of records.
#[derive(Debug)]
pub struct ProcessedChunk<D> {
    /// Successfully transformed documents, in record order.
    pub documents: Vec<D>,
    /// Records that failed to transform.
    pub skipped: usize,
}

/// Applies a [`Transformer`] to whole chunks on a dedicated worker pool.
pub struct ChunkProcessor<T: Transformer> {
    transformer: T,
    pool: ThreadPool,
}

impl<T: Transformer> ChunkProcessor<T> {
    /// Create a processor with `workers` transform threads.
    pub fn new(transformer: T, workers: usize) -> Result<Self, PipelineError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("transform-{}", i))
            .build()
            .map_err(|e| PipelineError::config(format!("transform pool: {}", e)))?;

        Ok(Self { transformer, pool })
    }

    pub fn transformer(&self) -> &T {
        &self.transformer
    }

    /// Transform a chunk of records.
    ///
    /// Records are transformed independently. A failing record, including one
    /// whose transformer panics, is logged with its key and counted as skipped;
    /// it never fails the chunk.
    #[instrument(skip(self, records), fields(record_count = records.len()))]
    pub fn process_chunk(
        &self,
        records: &[T::Record],
        indexed_at: DateTime<Utc>,
    ) -> ProcessedChunk<T::Document> {
        let results: Vec<Result<T::Document, TransformError>> = self.pool.install(|| {
            records
                .par_iter()
                .map(|record| self.transform_guarded(record, indexed_at))
                .collect()
        });

        let mut documents = Vec::with_capacity(results.len());
        let mut skipped = 0;

        for (record, result) in records.iter().zip(results) {
            match result {
                Ok(document) => documents.push(document),
                Err(e) => {
                    error!(
                        record_id = ?record.source_key(),
                        error = %e,
                        "Failed to transform record"
                    );
                    skipped += 1;
                }
            }
        }

        debug!(
            documents = documents.len(),
            skipped = skipped,
            "Processed chunk"
        );

        ProcessedChunk { documents, skipped }
    }

    fn transform_guarded(
        &self,
        record: &T::Record,
        indexed_at: DateTime<Utc>,
    ) -> Result<T::Document, TransformError> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            self.transformer.transform(record, indexed_at)
        }))
        .unwrap_or_else(|payload| Err(TransformError::Panicked(panic_message(&*payload))))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
