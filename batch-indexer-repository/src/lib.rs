//! # Batch Indexer Repository
//!
//! This crate provides the traits and implementations for the indexer's two
//! external collaborators: the relational store the records are read from and
//! the search engine the documents are written to. It includes definitions
//! for errors and interfaces, a PostgreSQL source and an OpenSearch sink.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod postgres;
pub mod types;

pub use config::{OpenSearchConfig, PostgresConfig};
pub use errors::{SinkError, SourceError};
pub use interfaces::{RecordSource, SearchIndexProvider};
pub use opensearch::OpenSearchClient;
pub use postgres::{ProductSource, UserSource};
pub use types::{BulkDocument, BulkItemResult, BulkUpsertSummary};
