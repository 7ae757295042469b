//! Source error types.
//!
//! This module defines the errors that can occur while reading records from
//! the relational store.

use thiserror::Error;

/// Errors that can occur while reading a page of source records.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    /// Failed to establish or keep a connection to the store.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The page query failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// A row could not be decoded into a record.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// The store did not answer in time.
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl SourceError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }

    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }
}

impl From<sqlx::Error> for SourceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::timeout("timed out acquiring a database connection"),
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolClosed => {
                Self::connection(err.to_string())
            }
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_) => Self::decode(err.to_string()),
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("57014") => {
                // query_canceled, raised when statement_timeout fires
                Self::timeout(err.to_string())
            }
            _ => Self::query(err.to_string()),
        }
    }
}
