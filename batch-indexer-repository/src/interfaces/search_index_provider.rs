//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;

use crate::errors::SinkError;
use crate::types::{BulkDocument, BulkUpsertSummary};

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// All methods return `Result<T, SinkError>` for consistent error handling across
/// different backend implementations.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Insert or replace multiple documents in one bulk request.
    ///
    /// Each document is written under its own id, overwriting any existing
    /// document with the same id. Replaying the same request yields the same
    /// index state.
    ///
    /// # Arguments
    ///
    /// * `index_name` - The target index
    /// * `documents` - Documents with their ids and serialized bodies
    ///
    /// # Returns
    ///
    /// * `Ok(BulkUpsertSummary)` - Per-document outcome of an accepted request
    /// * `Err(SinkError)` - If the request failed entirely
    async fn bulk_upsert(
        &self,
        index_name: &str,
        documents: &[BulkDocument],
    ) -> Result<BulkUpsertSummary, SinkError>;

    /// Check whether an index exists.
    ///
    /// Indices and their mappings are created outside of the indexer; this is
    /// only used to warn operators early.
    async fn index_exists(&self, index_name: &str) -> Result<bool, SinkError>;

    /// Check if the search engine is healthy and reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the search engine is healthy
    /// * `Ok(false)` - If the search engine is unhealthy
    /// * `Err(SinkError)` - If the health check fails to execute
    async fn health_check(&self) -> Result<bool, SinkError>;
}
