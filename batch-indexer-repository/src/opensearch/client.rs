//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::IndicesExistsParts,
    BulkParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::OpenSearchConfig;
use crate::errors::SinkError;
use crate::interfaces::SearchIndexProvider;
use crate::types::{BulkDocument, BulkItemResult, BulkUpsertSummary};

/// OpenSearch client implementation.
///
/// Writes documents with the bulk `index` action, which inserts a document or
/// replaces the one stored under the same id.
///
/// # Example
///
/// ```ignore
/// let client = OpenSearchClient::new(&OpenSearchConfig::new("http://localhost:9200")).await?;
/// let summary = client.bulk_upsert("products_search", &documents).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the configured URL.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SinkError)` - If connection setup fails
    pub async fn new(config: &OpenSearchConfig) -> Result<Self, SinkError> {
        let parsed_url =
            Url::parse(&config.url).map_err(|e| SinkError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SinkError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %config.url,
            timeout_secs = config.request_timeout.as_secs(),
            "Created OpenSearch client"
        );

        Ok(Self { client })
    }

    /// Build the newline-delimited bulk body: one action line and one source
    /// line per document.
    fn bulk_body(index_name: &str, documents: &[BulkDocument]) -> Vec<JsonBody<Value>> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);

        for doc in documents {
            body.push(json!({"index": {"_index": index_name, "_id": doc.id}}).into());
            body.push(doc.body.clone().into());
        }

        body
    }

    /// Turn a bulk response into per-document results.
    ///
    /// Items are matched to documents by position, as the bulk API answers in
    /// request order.
    fn parse_bulk_response(
        response: &Value,
        documents: &[BulkDocument],
    ) -> Result<BulkUpsertSummary, SinkError> {
        let has_errors = response
            .get("errors")
            .and_then(Value::as_bool)
            .ok_or_else(|| SinkError::response("bulk response is missing `errors`"))?;

        if !has_errors {
            let results = documents
                .iter()
                .map(|doc| BulkItemResult {
                    id: doc.id.clone(),
                    success: true,
                    error: None,
                })
                .collect();
            return Ok(BulkUpsertSummary::from_results(results));
        }

        let items = response
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| SinkError::response("bulk response is missing `items`"))?;

        if items.len() != documents.len() {
            return Err(SinkError::response(format!(
                "bulk response has {} items for {} documents",
                items.len(),
                documents.len()
            )));
        }

        let results = items
            .iter()
            .zip(documents)
            .map(|(item, doc)| {
                let action = item.get("index").unwrap_or(&Value::Null);
                let error = action.get("error").map(|e| {
                    e.get("reason")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string())
                });
                BulkItemResult {
                    id: doc.id.clone(),
                    success: error.is_none(),
                    error,
                }
            })
            .collect();

        Ok(BulkUpsertSummary::from_results(results))
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchClient {
    #[instrument(skip(self, documents), fields(index = %index_name, count = documents.len()))]
    async fn bulk_upsert(
        &self,
        index_name: &str,
        documents: &[BulkDocument],
    ) -> Result<BulkUpsertSummary, SinkError> {
        if documents.is_empty() {
            return Ok(BulkUpsertSummary::default());
        }

        let response = self
            .client
            .bulk(BulkParts::Index(index_name))
            .body(Self::bulk_body(index_name, documents))
            .send()
            .await
            .map_err(|e| SinkError::bulk_request(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SinkError::bulk_request(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SinkError::response(e.to_string()))?;

        let summary = Self::parse_bulk_response(&body, documents)?;

        debug!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk request completed"
        );
        Ok(summary)
    }

    async fn index_exists(&self, index_name: &str) -> Result<bool, SinkError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index_name]))
            .send()
            .await
            .map_err(|e| SinkError::connection(e.to_string()))?;

        Ok(response.status_code().is_success())
    }

    async fn health_check(&self) -> Result<bool, SinkError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| SinkError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Ok(false);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SinkError::response(e.to_string()))?;

        let status = body.get("status").and_then(Value::as_str).unwrap_or("red");
        debug!(status = %status, "Cluster health");
        Ok(status != "red")
    }
}
