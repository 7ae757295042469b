use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use batch_indexer::logging::{self, LogFormat};
use batch_indexer::runner::{available_jobs, extract_job, run_job, select_job, JobSelection};

#[derive(Parser)]
#[command(name = "batch-indexer", version)]
#[command(about = "Bulk-indexes relational records into OpenSearch", long_about = None)]
struct Cli {
    /// Job to run (product | user)
    #[arg(long)]
    job: Option<String>,

    /// Run parameters as key=value, optionally prefixed with --
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    params: Vec<String>,
}

impl Cli {
    /// The job name and run parameters, wherever `--job` was given.
    fn into_job_args(self) -> (Option<String>, Vec<String>) {
        extract_job(self.job, self.params)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let (job, params) = Cli::parse().into_job_args();

    logging::init(LogFormat::from_env());

    let kind = match select_job(job.as_deref()) {
        JobSelection::None => {
            info!(
                "No job specified. Use --job=<name> to run one of: {}",
                available_jobs()
            );
            return ExitCode::SUCCESS;
        }
        JobSelection::Unknown(name) => {
            info!(job = %name, "Unknown job. Available jobs: {}", available_jobs());
            return ExitCode::SUCCESS;
        }
        JobSelection::Known(kind) => kind,
    };

    match run_job(kind, params).await {
        Ok(run) => {
            info!(run_id = %run.id, status = %run.status(), "Indexer exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Indexer failed to start");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_args(argv: &[&str]) -> (Option<String>, Vec<String>) {
        Cli::try_parse_from(argv).unwrap().into_job_args()
    }

    #[test]
    fn test_job_first() {
        let (job, params) = job_args(&["batch-indexer", "--job=product", "--date=1"]);

        assert_eq!(job.as_deref(), Some("product"));
        assert_eq!(params, vec!["--date=1".to_string()]);
    }

    #[test]
    fn test_job_after_parameters() {
        let (job, params) = job_args(&["batch-indexer", "--date=1", "--job=user"]);

        assert_eq!(job.as_deref(), Some("user"));
        assert_eq!(params, vec!["--date=1".to_string()]);

        let (job, params) = job_args(&["batch-indexer", "a=b", "--job=product"]);

        assert_eq!(job.as_deref(), Some("product"));
        assert_eq!(params, vec!["a=b".to_string()]);
    }

    #[test]
    fn test_no_job() {
        let (job, params) = job_args(&["batch-indexer"]);

        assert_eq!(job, None);
        assert!(params.is_empty());
    }
}
