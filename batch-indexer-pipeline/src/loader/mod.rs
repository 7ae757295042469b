//! Loader module for the indexing pipeline.
//!
//! Writes transformed documents into the search index.

use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use batch_indexer_repository::{BulkDocument, SearchIndexProvider, SinkError};
use batch_indexer_shared::IndexDocument;

/// Configuration for the index loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    /// Largest batch accepted in one bulk request. `None` means unbounded.
    pub max_batch_size: Option<usize>,
}

/// Outcome of a successful batch write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchWriteResult {
    /// Documents sent to the search index.
    pub submitted: usize,
    /// Documents the search index accepted.
    pub written: usize,
}

/// Loader that upserts document batches into the search index.
///
/// Each non-empty batch becomes exactly one bulk request. Documents are keyed
/// by their id, so writing the same batch twice leaves the index unchanged.
/// Failures are returned to the caller as-is; the loader never retries.
pub struct IndexLoader {
    provider: Arc<dyn SearchIndexProvider>,
    config: LoaderConfig,
}

impl IndexLoader {
    /// Create a new loader with the given provider.
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self::with_config(provider, LoaderConfig::default())
    }

    /// Create a new loader with custom configuration.
    pub fn with_config(provider: Arc<dyn SearchIndexProvider>, config: LoaderConfig) -> Self {
        Self { provider, config }
    }

    /// Write one batch of documents to `index_name`.
    ///
    /// An empty batch is a no-op and makes no request. If the search index
    /// rejects any document, the batch fails with [`SinkError::PartialFailure`]
    /// carrying the first rejection reason.
    #[instrument(skip(self, documents), fields(index = %index_name, document_count = documents.len()))]
    pub async fn write_batch<D: IndexDocument>(
        &self,
        index_name: &str,
        documents: &[D],
    ) -> Result<BatchWriteResult, SinkError> {
        if documents.is_empty() {
            debug!("Empty batch, nothing to write");
            return Ok(BatchWriteResult::default());
        }

        if let Some(max) = self.config.max_batch_size {
            if documents.len() > max {
                return Err(SinkError::batch_size_exceeded(documents.len(), max));
            }
        }

        let bulk = documents
            .iter()
            .map(BulkDocument::from_document)
            .collect::<Result<Vec<_>, _>>()?;

        let summary = self.provider.bulk_upsert(index_name, &bulk).await?;

        if summary.failed > 0 {
            let reason = summary.first_error().unwrap_or("unknown error").to_string();
            error!(
                failed = summary.failed,
                total = summary.total,
                reason = %reason,
                "Bulk write partially failed"
            );
            return Err(SinkError::partial_failure(
                summary.failed,
                summary.total,
                reason,
            ));
        }

        info!(written = summary.succeeded, "Wrote batch to search index");

        Ok(BatchWriteResult {
            submitted: bulk.len(),
            written: summary.succeeded,
        })
    }

    /// Check whether `index_name` exists.
    pub async fn index_exists(&self, index_name: &str) -> Result<bool, SinkError> {
        self.provider.index_exists(index_name).await
    }

    /// Check if the search engine is healthy.
    pub async fn health_check(&self) -> Result<bool, SinkError> {
        self.provider.health_check().await
    }
}
