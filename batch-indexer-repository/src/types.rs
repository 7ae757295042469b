//! Request and response types for bulk index operations.

use serde_json::Value;

use crate::errors::SinkError;
use batch_indexer_shared::IndexDocument;

/// A document ready to be sent in a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkDocument {
    /// The document id, used as the index `_id`.
    pub id: String,
    /// The serialized document body.
    pub body: Value,
}

impl BulkDocument {
    /// Serialize an index document into its bulk form.
    pub fn from_document<D: IndexDocument>(document: &D) -> Result<Self, SinkError> {
        let body = serde_json::to_value(document).map_err(|e| {
            SinkError::serialization(format!(
                "document {}: {}",
                document.document_id(),
                e
            ))
        })?;

        Ok(Self {
            id: document.document_id().to_string(),
            body,
        })
    }
}

/// Result of a bulk operation for a single document.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemResult {
    /// The document id.
    pub id: String,
    /// Whether the document was written.
    pub success: bool,
    /// Failure reason reported by the search engine.
    pub error: Option<String>,
}

/// Summary of a bulk operation containing aggregate statistics and individual results.
///
/// This allows callers to decide how to treat partial failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkUpsertSummary {
    /// Total number of documents in the request.
    pub total: usize,
    /// Number of documents written.
    pub succeeded: usize,
    /// Number of documents rejected.
    pub failed: usize,
    /// Individual results for each document.
    pub results: Vec<BulkItemResult>,
}

impl BulkUpsertSummary {
    /// Build a summary from per-document results.
    pub fn from_results(results: Vec<BulkItemResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// The first failure reason, if any document failed.
    pub fn first_error(&self) -> Option<&str> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .find_map(|r| r.error.as_deref())
    }
}
