//! Source cursor for the indexing pipeline.
//!
//! Walks a [`RecordSource`] page by page in primary key order.

use tracing::{debug, warn};

use batch_indexer_repository::{RecordSource, SourceError};
use batch_indexer_shared::SourceRecord;

/// Number of records requested per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 500;

/// Forward-only, restartable cursor over a record source.
///
/// The cursor remembers the highest primary key it has handed out and asks the
/// source for the records after it. A failed read leaves the position
/// untouched, so the next call requests the same key range again.
pub struct SourceCursor<S: RecordSource> {
    source: S,
    page_size: usize,
    after_key: Option<i64>,
    exhausted: bool,
    pages_read: usize,
}

impl<S: RecordSource> SourceCursor<S> {
    /// Open a cursor positioned before the first record.
    pub fn open(source: S, page_size: usize) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            after_key: None,
            exhausted: false,
            pages_read: 0,
        }
    }

    /// Rewind to the start of the source.
    pub fn reset(&mut self) {
        self.after_key = None;
        self.exhausted = false;
        self.pages_read = 0;
    }

    /// The last primary key handed out, if any.
    pub fn position(&self) -> Option<i64> {
        self.after_key
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn pages_read(&self) -> usize {
        self.pages_read
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Read the next page.
    ///
    /// Returns `Ok(None)` once the source is exhausted. A page shorter than the
    /// page size marks the end, so no trailing empty query is issued after it.
    pub async fn next_page(&mut self) -> Result<Option<Vec<S::Record>>, SourceError> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self
            .source
            .fetch_page(self.after_key, self.page_size)
            .await?;

        if page.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        let last_key = page
            .iter()
            .filter_map(SourceRecord::source_key)
            .max()
            .ok_or_else(|| SourceError::decode("page contains no primary keys"))?;

        if let Some(previous) = self.after_key {
            if last_key <= previous {
                return Err(SourceError::decode(format!(
                    "source returned key {} at or before cursor position {}",
                    last_key, previous
                )));
            }
        }

        let fetched = page.len();
        self.after_key = Some(last_key);
        self.exhausted = fetched < self.page_size;
        self.pages_read += 1;

        let live: Vec<S::Record> = page.into_iter().filter(|r| !r.is_soft_deleted()).collect();
        if live.len() < fetched {
            warn!(
                entity = %self.source.entity_kind(),
                dropped = fetched - live.len(),
                "Source returned soft-deleted records; dropping them"
            );
        }

        debug!(
            entity = %self.source.entity_kind(),
            page = self.pages_read,
            count = live.len(),
            position = last_key,
            "Read source page"
        );

        Ok(Some(live))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use batch_indexer_shared::{EntityKind, UserRecord};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory source that records every request it receives.
    struct VecSource {
        records: Vec<UserRecord>,
        requests: Mutex<Vec<(Option<i64>, usize)>>,
        fail_next: AtomicUsize,
    }

    impl VecSource {
        fn with_ids(ids: impl IntoIterator<Item = i64>) -> Self {
            let now = Utc::now();
            Self {
                records: ids
                    .into_iter()
                    .map(|id| UserRecord::new(id, format!("u{}@example.com", id), format!("u{}", id), now))
                    .collect(),
                requests: Mutex::new(Vec::new()),
                fail_next: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RecordSource for VecSource {
        type Record = UserRecord;

        fn entity_kind(&self) -> EntityKind {
            EntityKind::User
        }

        async fn fetch_page(
            &self,
            after_key: Option<i64>,
            page_size: usize,
        ) -> Result<Vec<UserRecord>, SourceError> {
            self.requests.lock().unwrap().push((after_key, page_size));
            if self.fail_next.load(Ordering::SeqCst) > 0 {
                self.fail_next.fetch_sub(1, Ordering::SeqCst);
                return Err(SourceError::timeout("statement timeout"));
            }
            Ok(self
                .records
                .iter()
                .filter(|r| after_key.map_or(true, |k| r.id.unwrap_or(i64::MIN) > k))
                .take(page_size)
                .cloned()
                .collect())
        }
    }

    #[tokio::test]
    async fn test_pages_in_key_order() {
        let mut cursor = SourceCursor::open(VecSource::with_ids(1..=5), 2);

        let mut pages = Vec::new();
        while let Some(page) = cursor.next_page().await.unwrap() {
            pages.push(page.iter().map(|r| r.id.unwrap()).collect::<Vec<_>>());
        }

        assert_eq!(pages, vec![vec![1, 2], vec![3, 4], vec![5]]);
        assert_eq!(cursor.position(), Some(5));
        // the short last page ends the walk without an extra query
        assert_eq!(cursor.source().requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_trailing_query() {
        let mut cursor = SourceCursor::open(VecSource::with_ids(1..=4), 2);

        let mut count = 0;
        while let Some(page) = cursor.next_page().await.unwrap() {
            count += page.len();
        }

        assert_eq!(count, 4);
        assert_eq!(
            *cursor.source().requests.lock().unwrap(),
            vec![(None, 2), (Some(2), 2), (Some(4), 2)]
        );
    }

    #[tokio::test]
    async fn test_failed_read_keeps_position() {
        let source = VecSource::with_ids(1..=3);
        let mut cursor = SourceCursor::open(source, 2);

        cursor.next_page().await.unwrap();
        cursor.source().fail_next.store(1, Ordering::SeqCst);

        assert!(cursor.next_page().await.is_err());
        assert_eq!(cursor.position(), Some(2));

        let page = cursor.next_page().await.unwrap().unwrap();
        assert_eq!(page[0].id, Some(3));
    }

    #[tokio::test]
    async fn test_drops_soft_deleted_records() {
        let mut source = VecSource::with_ids(1..=3);
        source.records[1].deleted_at = Some(Utc::now());
        let mut cursor = SourceCursor::open(source, 10);

        let page = cursor.next_page().await.unwrap().unwrap();

        let ids: Vec<i64> = page.iter().filter_map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_reset_restarts_from_beginning() {
        let mut cursor = SourceCursor::open(VecSource::with_ids(1..=3), 10);

        while cursor.next_page().await.unwrap().is_some() {}
        assert!(cursor.next_page().await.unwrap().is_none());

        cursor.reset();
        let page = cursor.next_page().await.unwrap().unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(cursor.pages_read(), 1);
    }
}
