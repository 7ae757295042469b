//! Interface definitions for the indexer's external collaborators.
//!
//! This module defines the abstract `RecordSource` and `SearchIndexProvider`
//! traits that allow for dependency injection and swappable backends.

mod record_source;
mod search_index_provider;

pub use record_source::RecordSource;
pub use search_index_provider::SearchIndexProvider;
