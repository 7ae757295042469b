//! Run-level behaviour of the pipeline against in-memory source and index doubles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use batch_indexer_pipeline::{
    ChunkOrchestrator, IndexLoader, JobParameters, JobRun, JobStatus, OrchestratorConfig,
    ProductTransformer, Transformer, UserTransformer,
};
use batch_indexer_repository::{
    BulkDocument, BulkItemResult, BulkUpsertSummary, RecordSource, SearchIndexProvider, SinkError,
    SourceError,
};
use batch_indexer_shared::{EntityKind, ProductRecord, SourceRecord, UserRecord};

/// Table of records served with keyset pagination, like the PostgreSQL sources.
struct MemorySource<R> {
    kind: EntityKind,
    rows: Vec<R>,
    /// Skip the `deleted_at IS NULL` filter, as a misbehaving store would.
    leak_deleted: bool,
    fail_reads: usize,
    reads: AtomicUsize,
}

impl<R: SourceRecord + Clone + 'static> MemorySource<R> {
    fn new(kind: EntityKind, rows: Vec<R>) -> Self {
        Self {
            kind,
            rows,
            leak_deleted: false,
            fail_reads: 0,
            reads: AtomicUsize::new(0),
        }
    }

    fn failing_reads(mut self, count: usize) -> Self {
        self.fail_reads = count;
        self
    }
}

#[async_trait]
impl<R: SourceRecord + Clone + 'static> RecordSource for MemorySource<R> {
    type Record = R;

    fn entity_kind(&self) -> EntityKind {
        self.kind
    }

    async fn fetch_page(
        &self,
        after_key: Option<i64>,
        page_size: usize,
    ) -> Result<Vec<R>, SourceError> {
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.fail_reads {
            return Err(SourceError::timeout("canceling statement due to statement timeout"));
        }

        Ok(self
            .rows
            .iter()
            .filter(|r| self.leak_deleted || !r.is_soft_deleted())
            .filter(|r| match (r.source_key(), after_key) {
                (Some(key), Some(after)) => key > after,
                (_, None) => true,
                (None, Some(_)) => false,
            })
            .take(page_size)
            .cloned()
            .collect())
    }
}

type FailWhen = Box<dyn Fn(usize) -> bool + Send + Sync>;

/// Index keyed by document id that records every bulk request.
struct MemoryIndex {
    documents: Mutex<HashMap<String, Value>>,
    batches: Mutex<Vec<usize>>,
    calls: AtomicUsize,
    fail_when: FailWhen,
}

impl MemoryIndex {
    fn new() -> Arc<Self> {
        Self::failing(|_| false)
    }

    fn failing(fail_when: impl Fn(usize) -> bool + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            documents: Mutex::new(HashMap::new()),
            batches: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fail_when: Box::new(fail_when),
        })
    }

    /// Index contents without the per-run `indexedAt` stamp.
    async fn snapshot(&self) -> HashMap<String, Value> {
        self.documents
            .lock()
            .await
            .iter()
            .map(|(id, body)| {
                let mut body = body.clone();
                if let Some(obj) = body.as_object_mut() {
                    obj.remove("indexedAt");
                }
                (id.clone(), body)
            })
            .collect()
    }
}

#[async_trait]
impl SearchIndexProvider for MemoryIndex {
    async fn bulk_upsert(
        &self,
        _index_name: &str,
        documents: &[BulkDocument],
    ) -> Result<BulkUpsertSummary, SinkError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if (self.fail_when)(call) {
            return Err(SinkError::bulk_request("cluster unavailable"));
        }

        let mut stored = self.documents.lock().await;
        for doc in documents {
            stored.insert(doc.id.clone(), doc.body.clone());
        }
        self.batches.lock().await.push(documents.len());

        Ok(BulkUpsertSummary::from_results(
            documents
                .iter()
                .map(|d| BulkItemResult {
                    id: d.id.clone(),
                    success: true,
                    error: None,
                })
                .collect(),
        ))
    }

    async fn index_exists(&self, _index_name: &str) -> Result<bool, SinkError> {
        Ok(true)
    }

    async fn health_check(&self) -> Result<bool, SinkError> {
        Ok(true)
    }
}

fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn users(ids: impl IntoIterator<Item = i64>) -> Vec<UserRecord> {
    ids.into_iter()
        .map(|id| UserRecord::new(id, format!("user{}@example.com", id), format!("user{}", id), timestamp()))
        .collect()
}

fn products(ids: impl IntoIterator<Item = i64>) -> Vec<ProductRecord> {
    ids.into_iter()
        .map(|id| ProductRecord::new(id, format!("Product {}", id), "Books", BigDecimal::from(10), timestamp()))
        .collect()
}

fn config(chunk_size: usize) -> OrchestratorConfig {
    OrchestratorConfig {
        chunk_size,
        transform_workers: 2,
        ..Default::default()
    }
}

fn orchestrator<R, T>(
    source: MemorySource<R>,
    transformer: T,
    index: &Arc<MemoryIndex>,
    config: OrchestratorConfig,
) -> ChunkOrchestrator<MemorySource<R>, T>
where
    R: SourceRecord + Clone + 'static,
    T: Transformer<Record = R>,
{
    ChunkOrchestrator::with_config(source, transformer, IndexLoader::new(index.clone()), config)
        .unwrap()
}

#[tokio::test]
async fn test_chunks_of_500() {
    let index = MemoryIndex::new();
    let source = MemorySource::new(EntityKind::User, users(1..=1001));
    let mut run = orchestrator(source, UserTransformer, &index, config(500));

    let summary = run.run().await;

    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(*index.batches.lock().await, vec![500, 500, 1]);
    assert_eq!(summary.records_read, 1001);
    assert_eq!(summary.documents_written, 1001);
    assert_eq!(summary.records_skipped, 0);
    assert_eq!(summary.errors, 0);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let index = MemoryIndex::new();
    let source = MemorySource::new(EntityKind::Product, products(1..=25));
    let mut run = orchestrator(source, ProductTransformer, &index, config(10));

    let first = run.run().await;
    let after_first = index.snapshot().await;
    let second = run.run().await;
    let after_second = index.snapshot().await;

    assert_eq!(first.status, JobStatus::Completed);
    assert_eq!(second.status, JobStatus::Completed);
    assert_eq!(after_first.len(), 25);
    assert_eq!(after_first, after_second);
    assert_eq!(*index.batches.lock().await, vec![10, 10, 5, 10, 10, 5]);
}

#[tokio::test]
async fn test_soft_deleted_records_are_not_indexed() {
    let mut rows = users(1..=6);
    rows[1].deleted_at = Some(timestamp());
    rows[4].deleted_at = Some(timestamp());

    for leak_deleted in [false, true] {
        let index = MemoryIndex::new();
        let mut source = MemorySource::new(EntityKind::User, rows.clone());
        source.leak_deleted = leak_deleted;
        let mut run = orchestrator(source, UserTransformer, &index, config(4));

        let summary = run.run().await;

        let stored = index.snapshot().await;
        assert_eq!(summary.status, JobStatus::Completed);
        assert_eq!(stored.len(), 4);
        assert!(!stored.contains_key("2"));
        assert!(!stored.contains_key("5"));
    }
}

#[tokio::test]
async fn test_write_failures_within_skip_limit() {
    // the first 100 writes fail, every later one succeeds
    let index = MemoryIndex::failing(|call| call < 100);
    let source = MemorySource::new(EntityKind::User, users(1..=150));
    let mut run = orchestrator(source, UserTransformer, &index, config(1));

    let summary = run.run().await;

    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.errors, 100);
    assert_eq!(summary.records_read, 150);
    assert_eq!(summary.documents_written, 50);
    assert_eq!(index.snapshot().await.len(), 50);
}

#[tokio::test]
async fn test_write_failures_beyond_skip_limit() {
    let index = MemoryIndex::failing(|_| true);
    let source = MemorySource::new(EntityKind::User, users(1..=150));
    let mut run = orchestrator(source, UserTransformer, &index, config(1));

    let summary = run.run().await;

    assert_eq!(summary.status, JobStatus::Failed);
    assert_eq!(summary.errors, 101);
    // nothing is read after the run fails
    assert_eq!(summary.records_read, 101);
    assert!(summary.failure.unwrap().contains("Skip limit exceeded"));
}

#[tokio::test]
async fn test_written_chunks_survive_failure() {
    let index = MemoryIndex::failing(|call| call >= 2);
    let source = MemorySource::new(EntityKind::User, users(1..=20));
    let mut run = orchestrator(
        source,
        UserTransformer,
        &index,
        OrchestratorConfig {
            skip_limit: 1,
            ..config(5)
        },
    );

    let summary = run.run().await;

    assert_eq!(summary.status, JobStatus::Failed);
    assert_eq!(summary.documents_written, 10);
    assert_eq!(index.snapshot().await.len(), 10);
}

#[tokio::test]
async fn test_read_failures_are_retried_from_same_position() {
    let index = MemoryIndex::new();
    let source = MemorySource::new(EntityKind::User, users(1..=12)).failing_reads(3);
    let mut run = orchestrator(source, UserTransformer, &index, config(5));

    let summary = run.run().await;

    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.errors, 3);
    assert_eq!(summary.records_read, 12);
    assert_eq!(index.snapshot().await.len(), 12);
}

#[tokio::test]
async fn test_persistent_read_failure_fails_run() {
    let index = MemoryIndex::new();
    let source = MemorySource::new(EntityKind::User, users(1..=12)).failing_reads(usize::MAX);
    let mut run = orchestrator(source, UserTransformer, &index, config(5));

    let summary = run.run().await;

    assert_eq!(summary.status, JobStatus::Failed);
    assert_eq!(summary.errors, 101);
    assert_eq!(summary.records_read, 0);
    assert_eq!(index.calls.load(Ordering::SeqCst), 0);
}

fn unconvertible_products(count: i64) -> Vec<ProductRecord> {
    let huge: BigDecimal = "1e400".parse().unwrap();
    products(1..=count)
        .into_iter()
        .map(|mut p| {
            p.price = huge.clone();
            p
        })
        .collect()
}

#[tokio::test]
async fn test_transform_failures_do_not_count_by_default() {
    let index = MemoryIndex::new();
    let mut rows = unconvertible_products(101);
    rows.extend(products(102..=110));
    let source = MemorySource::new(EntityKind::Product, rows);
    let mut run = orchestrator(source, ProductTransformer, &index, config(50));

    let summary = run.run().await;

    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.records_skipped, 101);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.documents_written, 9);
}

#[tokio::test]
async fn test_transform_failures_counted_when_enabled() {
    let counted = OrchestratorConfig {
        count_transform_failures: true,
        ..config(50)
    };

    let index = MemoryIndex::new();
    let source = MemorySource::new(EntityKind::Product, unconvertible_products(101));
    let summary = orchestrator(source, ProductTransformer, &index, counted.clone())
        .run()
        .await;
    assert_eq!(summary.status, JobStatus::Failed);

    let index = MemoryIndex::new();
    let source = MemorySource::new(EntityKind::Product, unconvertible_products(100));
    let summary = orchestrator(source, ProductTransformer, &index, counted)
        .run()
        .await;
    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.errors, 100);
}

#[tokio::test]
async fn test_record_without_key_is_skipped() {
    let mut rows = users(1..=3);
    rows[0].id = None;
    let index = MemoryIndex::new();
    let source = MemorySource::new(EntityKind::User, rows);
    let mut run = orchestrator(source, UserTransformer, &index, config(10));

    let summary = run.run().await;

    let stored = index.snapshot().await;
    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.records_skipped, 1);
    assert_eq!(stored.len(), 2);
    assert!(!stored.keys().any(|id| id.is_empty()));
}

#[tokio::test]
async fn test_job_run_reports_parameters_and_status() {
    let index = MemoryIndex::new();
    let source = MemorySource::new(EntityKind::User, users(1..=3));
    let mut run = orchestrator(source, UserTransformer, &index, config(10));
    let params = JobParameters::parse(["requestedBy=ops"], timestamp());

    let job = JobRun::launch(&mut run, params).await;

    assert_eq!(job.kind, EntityKind::User);
    assert_eq!(job.status(), JobStatus::Completed);
    assert_eq!(job.parameters.get("requestedBy"), Some("ops"));
    assert!(job.parameters.get("runTime").is_some());
    assert!(job.finished_at >= job.started_at);
    assert_eq!(job.summary.documents_written, 3);
}
