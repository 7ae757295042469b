//! Dependency initialization and wiring for the batch indexer.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use super::IndexerConfig;
use crate::runner::IndexingJob;
use crate::IndexingError;
use batch_indexer_repository::{postgres, OpenSearchClient, SearchIndexProvider};
use batch_indexer_shared::EntityKind;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// Pool shared by the record sources.
    pub pool: PgPool,
    /// The search index the documents are written to.
    pub search_index: Arc<dyn SearchIndexProvider>,
    pub config: IndexerConfig,
}

impl Dependencies {
    /// Connect to OpenSearch and PostgreSQL.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If either store is unreachable or OpenSearch is unhealthy
    pub async fn new(config: IndexerConfig) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %config.opensearch.url,
            chunk_size = config.pipeline.chunk_size,
            skip_limit = config.pipeline.skip_limit,
            transform_workers = config.pipeline.transform_workers,
            "Initializing dependencies"
        );

        let search_client = OpenSearchClient::new(&config.opensearch)
            .await
            .map_err(|e| IndexingError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        let healthy = search_client
            .health_check()
            .await
            .map_err(|e| IndexingError::config(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(IndexingError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        let pool = postgres::connect(&config.postgres).await?;

        Ok(Self {
            pool,
            search_index: Arc::new(search_client),
            config,
        })
    }

    /// Warn when the index for `kind` is missing.
    ///
    /// Indices are created outside of the indexer, so a missing one is not an
    /// error here; the first bulk write will surface it.
    pub async fn check_index(&self, kind: EntityKind) {
        match self.search_index.index_exists(kind.index_name()).await {
            Ok(true) => {}
            Ok(false) => warn!(
                index = kind.index_name(),
                "Target index does not exist; create it with its mappings before indexing"
            ),
            Err(e) => warn!(index = kind.index_name(), error = %e, "Could not check target index"),
        }
    }

    /// Build the pipeline for `kind`.
    pub fn job(&self, kind: EntityKind) -> Result<IndexingJob, IndexingError> {
        IndexingJob::build(
            kind,
            self.pool.clone(),
            self.search_index.clone(),
            self.config.pipeline.clone(),
        )
        .map_err(IndexingError::from)
    }
}
