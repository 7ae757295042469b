//! Record source trait definition.
//!
//! This module defines the abstract interface for paged reads from the
//! relational store.

use async_trait::async_trait;

use crate::errors::SourceError;
use batch_indexer_shared::{EntityKind, SourceRecord};

/// Paged, key-ordered read access to one kind of source record.
///
/// Implementations must:
///
/// - return records ordered by primary key ascending, all with a key greater
///   than `after_key` (or from the start when `after_key` is `None`);
/// - exclude soft-deleted rows;
/// - return fully populated aggregates, with every association resolved.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// The aggregate type produced by this source.
    type Record: SourceRecord + 'static;

    /// The entity kind this source reads.
    fn entity_kind(&self) -> EntityKind;

    /// Fetch the next page of records.
    ///
    /// # Arguments
    ///
    /// * `after_key` - Exclusive lower bound on the primary key
    /// * `page_size` - Maximum number of records to return
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Record>)` - Up to `page_size` records; fewer means the source is exhausted
    /// * `Err(SourceError)` - If the page could not be read
    async fn fetch_page(
        &self,
        after_key: Option<i64>,
        page_size: usize,
    ) -> Result<Vec<Self::Record>, SourceError>;
}
