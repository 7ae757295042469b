//! Sink error types.
//!
//! This module defines the errors that can occur while writing documents to
//! the search index.

use thiserror::Error;

/// Errors that can occur during search index write operations.
#[derive(Error, Debug, Clone)]
pub enum SinkError {
    /// Failed to establish connection to the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The bulk request itself failed or was rejected.
    #[error("Bulk request error: {0}")]
    BulkRequestError(String),

    /// Some documents of an accepted bulk request were not written.
    #[error("Bulk write failed for {failed} of {total} documents: {reason}")]
    PartialFailure {
        failed: usize,
        total: usize,
        reason: String,
    },

    /// Failed to serialize a document.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Failed to parse the response from the search engine.
    #[error("Response error: {0}")]
    ResponseError(String),

    /// Batch size exceeds configured maximum.
    #[error("Batch size {provided} exceeds maximum {max}")]
    BatchSizeExceeded { provided: usize, max: usize },
}

impl SinkError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a bulk request error.
    pub fn bulk_request(msg: impl Into<String>) -> Self {
        Self::BulkRequestError(msg.into())
    }

    /// Create a partial failure error.
    pub fn partial_failure(failed: usize, total: usize, reason: impl Into<String>) -> Self {
        Self::PartialFailure {
            failed,
            total,
            reason: reason.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a response error.
    pub fn response(msg: impl Into<String>) -> Self {
        Self::ResponseError(msg.into())
    }

    /// Create a batch size exceeded error.
    pub fn batch_size_exceeded(provided: usize, max: usize) -> Self {
        Self::BatchSizeExceeded { provided, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_failure_message() {
        let err = SinkError::partial_failure(2, 500, "mapper_parsing_exception");
        assert_eq!(
            err.to_string(),
            "Bulk write failed for 2 of 500 documents: mapper_parsing_exception"
        );
    }
}
