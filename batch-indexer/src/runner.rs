//! Job selection and execution.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tracing::info;

use crate::config::{Dependencies, IndexerConfig};
use crate::IndexingError;
use batch_indexer_pipeline::{
    ChunkOrchestrator, IndexLoader, JobParameters, JobRun, OrchestratorConfig, PipelineError,
    ProductTransformer, UserTransformer,
};
use batch_indexer_repository::{ProductSource, SearchIndexProvider, UserSource};
use batch_indexer_shared::EntityKind;

/// Outcome of interpreting the `--job` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSelection {
    /// No job was given.
    None,
    /// The job name matches no known job.
    Unknown(String),
    Known(EntityKind),
}

/// Interpret the requested job name.
pub fn select_job(name: Option<&str>) -> JobSelection {
    match name.map(str::trim) {
        None | Some("") => JobSelection::None,
        Some(name) => match EntityKind::from_name(name) {
            Some(kind) => JobSelection::Known(kind),
            None => JobSelection::Unknown(name.to_string()),
        },
    }
}

/// Pull the `--job` selector out of the run arguments.
///
/// The selector may appear anywhere, as `--job=<name>` or `--job <name>`. An
/// already parsed `job` wins over one found in `args`. Every selector is
/// removed from the returned arguments.
pub fn extract_job(job: Option<String>, args: Vec<String>) -> (Option<String>, Vec<String>) {
    let mut job = job;
    let mut params = Vec::with_capacity(args.len());
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let found = if let Some(name) = arg.strip_prefix("--job=") {
            Some(name.to_string())
        } else if arg == "--job" {
            args.next()
        } else {
            params.push(arg);
            continue;
        };

        if job.is_none() {
            job = found;
        }
    }

    (job, params)
}

/// Comma-separated names of every runnable job.
pub fn available_jobs() -> String {
    EntityKind::ALL
        .iter()
        .map(EntityKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One of the two fixed pipeline instantiations.
pub enum IndexingJob {
    Product(ChunkOrchestrator<ProductSource, ProductTransformer>),
    User(ChunkOrchestrator<UserSource, UserTransformer>),
}

impl IndexingJob {
    /// Assemble the pipeline for `kind` over `pool` and `search_index`.
    pub fn build(
        kind: EntityKind,
        pool: PgPool,
        search_index: Arc<dyn SearchIndexProvider>,
        config: OrchestratorConfig,
    ) -> Result<Self, PipelineError> {
        let loader = IndexLoader::new(search_index);

        Ok(match kind {
            EntityKind::Product => IndexingJob::Product(ChunkOrchestrator::with_config(
                ProductSource::new(pool),
                ProductTransformer,
                loader,
                config,
            )?),
            EntityKind::User => IndexingJob::User(ChunkOrchestrator::with_config(
                UserSource::new(pool),
                UserTransformer,
                loader,
                config,
            )?),
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            IndexingJob::Product(o) => o.entity_kind(),
            IndexingJob::User(o) => o.entity_kind(),
        }
    }

    /// Handle for stopping the job at its next chunk boundary.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        match self {
            IndexingJob::Product(o) => o.shutdown_handle(),
            IndexingJob::User(o) => o.shutdown_handle(),
        }
    }

    /// Run the job to completion.
    pub async fn launch(&mut self, parameters: JobParameters) -> JobRun {
        match self {
            IndexingJob::Product(o) => JobRun::launch(o, parameters).await,
            IndexingJob::User(o) => JobRun::launch(o, parameters).await,
        }
    }
}

/// Connect to both stores and run the `kind` job once.
///
/// Ctrl-C requests a stop that takes effect at the next chunk boundary. A
/// failed run is reported through the returned [`JobRun`]; only startup
/// failures are errors.
pub async fn run_job(kind: EntityKind, params: Vec<String>) -> Result<JobRun, IndexingError> {
    let config = IndexerConfig::from_env()?;
    let deps = Dependencies::new(config).await?;

    deps.check_index(kind).await;

    let mut job = deps.job(kind)?;
    let parameters = JobParameters::parse(params, Utc::now());

    let shutdown = job.shutdown_handle();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, stopping at the next chunk boundary");
            let _ = shutdown.send(());
        }
    });

    let run = job.launch(parameters).await;
    signal.abort();

    Ok(run)
}
