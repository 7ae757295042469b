//! Per-run state and counters.

use std::fmt;

use tracing::{debug, warn};

use crate::errors::PipelineError;
use crate::job::JobStatus;

/// Stage a run is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Read,
    Transform,
    Write,
    Completed,
    Failed,
    Stopped,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Failed | RunState::Stopped
        )
    }
}

/// Counters and state of one run, threaded through every stage call.
#[derive(Debug)]
pub struct RunContext {
    state: RunState,
    skip_limit: usize,
    records_read: usize,
    documents_written: usize,
    records_skipped: usize,
    errors: usize,
    chunks_written: usize,
    failure: Option<String>,
}

impl RunContext {
    pub fn new(skip_limit: usize) -> Self {
        Self {
            state: RunState::Running,
            skip_limit,
            records_read: 0,
            documents_written: 0,
            records_skipped: 0,
            errors: 0,
            chunks_written: 0,
            failure: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub(crate) fn enter(&mut self, state: RunState) {
        debug!(from = ?self.state, to = ?state, "Run state change");
        self.state = state;
    }

    pub(crate) fn add_read(&mut self, records: usize) {
        self.records_read += records;
    }

    pub(crate) fn add_skipped(&mut self, records: usize) {
        self.records_skipped += records;
    }

    /// Count a successful write. An empty write is not a written chunk.
    pub(crate) fn add_written(&mut self, documents: usize) {
        if documents == 0 {
            return;
        }
        self.documents_written += documents;
        self.chunks_written += 1;
    }

    /// Count one error against the skip limit.
    ///
    /// Fails once the number of errors exceeds the limit; exactly `skip_limit`
    /// errors are still tolerated.
    pub(crate) fn record_error(&mut self, error: &dyn fmt::Display) -> Result<(), PipelineError> {
        self.errors += 1;

        if self.errors > self.skip_limit {
            return Err(PipelineError::SkipLimitExceeded {
                errors: self.errors,
                limit: self.skip_limit,
                last_error: error.to_string(),
            });
        }

        warn!(
            stage = ?self.state,
            errors = self.errors,
            skip_limit = self.skip_limit,
            error = %error,
            "Skipping failed chunk stage"
        );
        Ok(())
    }

    pub(crate) fn fail(&mut self, error: &PipelineError) {
        self.failure = Some(error.to_string());
        self.state = RunState::Failed;
    }

    pub(crate) fn stop(&mut self) {
        self.state = RunState::Stopped;
    }

    pub(crate) fn complete(&mut self) {
        self.state = RunState::Completed;
    }

    /// Final report of the run.
    pub fn summary(&self) -> RunSummary {
        let status = match self.state {
            RunState::Failed => JobStatus::Failed,
            RunState::Stopped => JobStatus::Stopped,
            _ => JobStatus::Completed,
        };

        RunSummary {
            status,
            records_read: self.records_read,
            documents_written: self.documents_written,
            records_skipped: self.records_skipped,
            errors: self.errors,
            chunks_written: self.chunks_written,
            failure: self.failure.clone(),
        }
    }
}

/// Operator-facing report of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub status: JobStatus,
    pub records_read: usize,
    pub documents_written: usize,
    /// Records dropped because they failed to transform.
    pub records_skipped: usize,
    /// Stage errors absorbed under the skip limit, plus the one that exceeded it.
    pub errors: usize,
    /// Chunks that wrote at least one document.
    pub chunks_written: usize,
    pub failure: Option<String>,
}

/// Counts for a single chunk, logged once the chunk is done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkResult {
    pub read: usize,
    pub written: usize,
    pub skipped: usize,
    /// Errors counted against the skip limit while running this chunk.
    pub errors: usize,
}
