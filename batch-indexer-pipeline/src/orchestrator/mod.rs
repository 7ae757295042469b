//! Orchestrator module for the indexing pipeline.
//!
//! Drives chunks of records through the cursor, processor and loader.

mod run_context;

pub use run_context::{ChunkResult, RunContext, RunState, RunSummary};

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{error, info, instrument, warn, Span};

use crate::cursor::{SourceCursor, DEFAULT_PAGE_SIZE};
use crate::errors::{PipelineError, StageError};
use crate::loader::IndexLoader;
use crate::processor::{ChunkProcessor, ProcessedChunk, Transformer};
use batch_indexer_repository::RecordSource;
use batch_indexer_shared::EntityKind;

/// Errors tolerated per run unless configured otherwise.
pub const DEFAULT_SKIP_LIMIT: usize = 100;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Records read, transformed and written together.
    pub chunk_size: usize,
    /// Errors tolerated before the run fails.
    pub skip_limit: usize,
    /// Threads transforming records within a chunk.
    pub transform_workers: usize,
    /// Also count every transform failure against the skip limit.
    pub count_transform_failures: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_PAGE_SIZE,
            skip_limit: DEFAULT_SKIP_LIMIT,
            transform_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            count_transform_failures: false,
        }
    }
}

/// Orchestrator that runs one entity kind through the pipeline chunk by chunk.
///
/// Each chunk is read, transformed and written before the next is read. Read
/// and write failures are absorbed until the skip limit is exceeded, at which
/// point the run fails. Chunks already written stay in the index.
pub struct ChunkOrchestrator<S, T>
where
    S: RecordSource,
    T: Transformer<Record = S::Record>,
{
    kind: EntityKind,
    cursor: SourceCursor<S>,
    processor: Arc<ChunkProcessor<T>>,
    loader: IndexLoader,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl<S, T> ChunkOrchestrator<S, T>
where
    S: RecordSource,
    T: Transformer<Record = S::Record>,
{
    /// Create an orchestrator with the default configuration.
    pub fn new(source: S, transformer: T, loader: IndexLoader) -> Result<Self, PipelineError> {
        Self::with_config(source, transformer, loader, OrchestratorConfig::default())
    }

    /// Create an orchestrator with custom configuration.
    pub fn with_config(
        source: S,
        transformer: T,
        loader: IndexLoader,
        config: OrchestratorConfig,
    ) -> Result<Self, PipelineError> {
        if config.chunk_size == 0 {
            return Err(PipelineError::config("chunk size must be at least 1"));
        }
        if config.transform_workers == 0 {
            return Err(PipelineError::config("transform workers must be at least 1"));
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        Ok(Self {
            kind: source.entity_kind(),
            cursor: SourceCursor::open(source, config.chunk_size),
            processor: Arc::new(ChunkProcessor::new(transformer, config.transform_workers)?),
            loader,
            config,
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn entity_kind(&self) -> EntityKind {
        self.kind
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Handle for requesting a stop from another task.
    ///
    /// A stop takes effect at the next chunk boundary.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Request a stop at the next chunk boundary.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Run over the whole source, starting from its first record.
    ///
    /// Never returns an error: the outcome, including a failure, is reported
    /// through the summary's status.
    #[instrument(skip(self), fields(entity = %self.kind))]
    pub async fn run(&mut self) -> RunSummary {
        let index_name = self.kind.index_name();
        let mut ctx = RunContext::new(self.config.skip_limit);

        info!(
            index = index_name,
            chunk_size = self.config.chunk_size,
            skip_limit = self.config.skip_limit,
            "Starting indexing run"
        );

        self.cursor.reset();

        loop {
            if self.stop_requested() {
                info!("Stop requested, ending run at chunk boundary");
                ctx.stop();
                break;
            }

            match self.run_chunk(&mut ctx, index_name).await {
                Ok(Some(result)) => info!(
                    read = result.read,
                    written = result.written,
                    skipped = result.skipped,
                    errors = result.errors,
                    "Chunk complete"
                ),
                Ok(None) => {
                    ctx.complete();
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Indexing run failed");
                    ctx.fail(&e);
                    break;
                }
            }
        }

        let summary = ctx.summary();
        info!(
            status = %summary.status,
            records_read = summary.records_read,
            documents_written = summary.documents_written,
            records_skipped = summary.records_skipped,
            errors = summary.errors,
            "Indexing run finished"
        );
        summary
    }

    /// Run one chunk through read, transform and write.
    ///
    /// Returns `Ok(None)` when the source is exhausted and `Err` when the skip
    /// limit is exceeded. A stage error within the limit abandons the chunk.
    async fn run_chunk(
        &mut self,
        ctx: &mut RunContext,
        index_name: &str,
    ) -> Result<Option<ChunkResult>, PipelineError> {
        let mut result = ChunkResult::default();

        ctx.enter(RunState::Read);
        let records = match self.cursor.next_page().await {
            Ok(Some(records)) => records,
            Ok(None) => return Ok(None),
            Err(e) => {
                ctx.record_error(&StageError::Read(e))?;
                result.errors += 1;
                return Ok(Some(result));
            }
        };
        result.read = records.len();
        ctx.add_read(records.len());

        ctx.enter(RunState::Transform);
        let processed = self.transform(records).await?;
        result.skipped = processed.skipped;
        ctx.add_skipped(processed.skipped);

        if self.config.count_transform_failures && processed.skipped > 0 {
            warn!(failures = processed.skipped, "Counting transform failures against skip limit");
            for _ in 0..processed.skipped {
                ctx.record_error(&"record failed to transform")?;
                result.errors += 1;
            }
        }

        ctx.enter(RunState::Write);
        match self.loader.write_batch(index_name, &processed.documents).await {
            Ok(written) => {
                result.written = written.written;
                ctx.add_written(written.written);
            }
            Err(e) => {
                ctx.record_error(&StageError::Write(e))?;
                result.errors += 1;
            }
        }

        Ok(Some(result))
    }

    /// Transform a chunk on the processor's pool without holding a runtime
    /// worker thread.
    async fn transform(
        &self,
        records: Vec<S::Record>,
    ) -> Result<ProcessedChunk<T::Document>, PipelineError> {
        let processor = Arc::clone(&self.processor);
        let indexed_at = Utc::now();
        let span = Span::current();

        tokio::task::spawn_blocking(move || {
            span.in_scope(|| processor.process_chunk(&records, indexed_at))
        })
        .await
        .map_err(|e| PipelineError::worker(format!("transform task: {}", e)))
    }

    fn stop_requested(&mut self) -> bool {
        match self.shutdown_rx.try_recv() {
            Ok(()) | Err(broadcast::error::TryRecvError::Lagged(_)) => true,
            Err(_) => false,
        }
    }
}
