//! Job runs: parameters, identity and final status of one indexing run.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::orchestrator::{ChunkOrchestrator, RunSummary};
use crate::processor::Transformer;
use batch_indexer_repository::RecordSource;
use batch_indexer_shared::EntityKind;

/// Parameter always added to a run, holding its start time in epoch millis.
pub const RUN_TIME_PARAM: &str = "runTime";

/// Key of the job selector, which is never stored as a run parameter.
pub const JOB_PARAM: &str = "job";

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// The source was exhausted within the skip limit.
    Completed,
    /// The skip limit was exceeded or the run could not proceed.
    Failed,
    /// A stop was requested and honored at a chunk boundary.
    Stopped,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
            JobStatus::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form `key=value` metadata attached to a run.
#[derive(Debug, Clone, PartialEq)]
pub struct JobParameters {
    run_time: DateTime<Utc>,
    values: BTreeMap<String, String>,
}

impl JobParameters {
    /// Parameters holding only the run time.
    pub fn new(run_time: DateTime<Utc>) -> Self {
        let mut values = BTreeMap::new();
        values.insert(
            RUN_TIME_PARAM.to_string(),
            run_time.timestamp_millis().to_string(),
        );
        Self { run_time, values }
    }

    /// Parse `key=value` arguments, with or without a leading `--`.
    ///
    /// Malformed arguments are logged and ignored. A user supplied `runTime`
    /// is replaced by `run_time`, and a `job` selector is dropped.
    pub fn parse<I, S>(args: I, run_time: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut params = Self::new(run_time);

        for arg in args {
            let arg = arg.as_ref();
            let pair = arg.strip_prefix("--").unwrap_or(arg);
            match pair.split_once('=') {
                Some((key, _)) if key.trim() == RUN_TIME_PARAM || key.trim() == JOB_PARAM => {
                    warn!(argument = arg, "Ignoring reserved run parameter");
                }
                Some((key, value)) if !key.trim().is_empty() => {
                    params
                        .values
                        .insert(key.trim().to_string(), value.to_string());
                }
                _ => warn!(argument = arg, "Ignoring malformed run parameter"),
            }
        }

        params
    }

    pub fn run_time(&self) -> DateTime<Utc> {
        self.run_time
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for JobParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.values {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

/// Record of one finished job run.
#[derive(Debug, Clone)]
pub struct JobRun {
    pub id: Uuid,
    pub kind: EntityKind,
    pub parameters: JobParameters,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: RunSummary,
}

impl JobRun {
    /// Run `orchestrator` to completion under a fresh run id.
    ///
    /// A failed run is logged and reported through the returned status; it is
    /// never raised as an error.
    pub async fn launch<S, T>(
        orchestrator: &mut ChunkOrchestrator<S, T>,
        parameters: JobParameters,
    ) -> JobRun
    where
        S: RecordSource,
        T: Transformer<Record = S::Record>,
    {
        let id = Uuid::new_v4();
        let kind = orchestrator.entity_kind();
        let started_at = Utc::now();

        info!(
            run_id = %id,
            job = %kind,
            parameters = %parameters,
            "Job started"
        );

        let summary = orchestrator.run().await;
        let finished_at = Utc::now();

        match summary.status {
            JobStatus::Failed => error!(
                run_id = %id,
                job = %kind,
                error = summary.failure.as_deref().unwrap_or("unknown"),
                records_read = summary.records_read,
                documents_written = summary.documents_written,
                "Job failed"
            ),
            status => info!(
                run_id = %id,
                job = %kind,
                status = %status,
                records_read = summary.records_read,
                documents_written = summary.documents_written,
                records_skipped = summary.records_skipped,
                errors = summary.errors,
                elapsed_ms = (finished_at - started_at).num_milliseconds(),
                "Job finished"
            ),
        }

        JobRun {
            id,
            kind,
            parameters,
            started_at,
            finished_at,
            summary,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.summary.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn run_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_run_time_is_always_present() {
        let params = JobParameters::new(run_time());

        assert_eq!(params.get(RUN_TIME_PARAM), Some("1704164645000"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_parse_key_value_pairs() {
        let params = JobParameters::parse(
            ["requestedBy=ops", "--batch=nightly", "note=a=b"],
            run_time(),
        );

        assert_eq!(params.get("requestedBy"), Some("ops"));
        assert_eq!(params.get("batch"), Some("nightly"));
        assert_eq!(params.get("note"), Some("a=b"));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_parse_ignores_malformed_and_reserved() {
        let params = JobParameters::parse(["novalue", "=x", "runTime=1"], run_time());

        assert_eq!(params.len(), 1);
        assert_eq!(params.get(RUN_TIME_PARAM), Some("1704164645000"));
    }

    #[test]
    fn test_parse_drops_job_selector() {
        let params = JobParameters::parse(["--date=1", "--job=user", "job=product"], run_time());

        assert_eq!(params.get("date"), Some("1"));
        assert_eq!(params.get(JOB_PARAM), None);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_display() {
        let params = JobParameters::parse(["a=1"], run_time());

        assert_eq!(params.to_string(), "a=1, runTime=1704164645000");
    }

    #[test]
    fn test_status_names() {
        assert_eq!(JobStatus::Completed.to_string(), "COMPLETED");
        assert_eq!(JobStatus::Failed.to_string(), "FAILED");
        assert_eq!(JobStatus::Stopped.to_string(), "STOPPED");
    }
}
