//! Indexer configuration read from the environment.

mod dependencies;

pub use dependencies::Dependencies;

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::IndexingError;
use batch_indexer_pipeline::OrchestratorConfig;
use batch_indexer_repository::{OpenSearchConfig, PostgresConfig};

/// Settings for one indexer process.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub postgres: PostgresConfig,
    pub opensearch: OpenSearchConfig,
    pub pipeline: OrchestratorConfig,
}

impl IndexerConfig {
    /// Read the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: PostgreSQL connection string (default: postgres://localhost:5432/catalog)
    /// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
    /// - `DATABASE_ACQUIRE_TIMEOUT_SECS`: pool acquire timeout (default: 5)
    /// - `DATABASE_STATEMENT_TIMEOUT_SECS`: per-query timeout (default: 30)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_TIMEOUT_SECS`: request timeout (default: 30)
    /// - `CHUNK_SIZE`: records per chunk (default: 500)
    /// - `SKIP_LIMIT`: errors tolerated per run (default: 100)
    /// - `TRANSFORM_WORKERS`: transform threads (default: available parallelism)
    /// - `COUNT_TRANSFORM_FAILURES`: count transform failures against the skip limit (default: false)
    ///
    /// # Returns
    ///
    /// * `Ok(IndexerConfig)` - The parsed configuration
    /// * `Err(IndexingError)` - If a variable holds an invalid value
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, IndexingError> {
        let postgres_defaults = PostgresConfig::default();
        let opensearch_defaults = OpenSearchConfig::default();
        let pipeline_defaults = OrchestratorConfig::default();

        let postgres = PostgresConfig {
            url: lookup("DATABASE_URL").unwrap_or(postgres_defaults.url),
            max_connections: parse_var(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                postgres_defaults.max_connections,
            )?,
            acquire_timeout: parse_secs(
                &lookup,
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                postgres_defaults.acquire_timeout,
            )?,
            statement_timeout: parse_secs(
                &lookup,
                "DATABASE_STATEMENT_TIMEOUT_SECS",
                postgres_defaults.statement_timeout,
            )?,
        };

        let opensearch = OpenSearchConfig {
            url: lookup("OPENSEARCH_URL").unwrap_or(opensearch_defaults.url),
            request_timeout: parse_secs(
                &lookup,
                "OPENSEARCH_TIMEOUT_SECS",
                opensearch_defaults.request_timeout,
            )?,
        };

        let pipeline = OrchestratorConfig {
            chunk_size: parse_var(&lookup, "CHUNK_SIZE", pipeline_defaults.chunk_size)?,
            skip_limit: parse_var(&lookup, "SKIP_LIMIT", pipeline_defaults.skip_limit)?,
            transform_workers: parse_var(
                &lookup,
                "TRANSFORM_WORKERS",
                pipeline_defaults.transform_workers,
            )?,
            count_transform_failures: parse_var(
                &lookup,
                "COUNT_TRANSFORM_FAILURES",
                pipeline_defaults.count_transform_failures,
            )?,
        };

        if pipeline.chunk_size == 0 {
            return Err(IndexingError::config("CHUNK_SIZE must be at least 1"));
        }
        if pipeline.transform_workers == 0 {
            return Err(IndexingError::config("TRANSFORM_WORKERS must be at least 1"));
        }
        if postgres.max_connections == 0 {
            return Err(IndexingError::config(
                "DATABASE_MAX_CONNECTIONS must be at least 1",
            ));
        }

        Ok(Self {
            postgres,
            opensearch,
            pipeline,
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, IndexingError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| IndexingError::config(format!("invalid {} `{}`: {}", key, raw, e))),
        _ => Ok(default),
    }
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration, IndexingError> {
    parse_var(lookup, key, default.as_secs()).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = IndexerConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.postgres.url, "postgres://localhost:5432/catalog");
        assert_eq!(config.postgres.max_connections, 5);
        assert_eq!(config.postgres.statement_timeout, Duration::from_secs(30));
        assert_eq!(config.opensearch.url, "http://localhost:9200");
        assert_eq!(config.pipeline.chunk_size, 500);
        assert_eq!(config.pipeline.skip_limit, 100);
        assert!(config.pipeline.transform_workers >= 1);
        assert!(!config.pipeline.count_transform_failures);
    }

    #[test]
    fn test_overrides() {
        let config = IndexerConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db:5432/shop"),
            ("OPENSEARCH_TIMEOUT_SECS", "5"),
            ("CHUNK_SIZE", "250"),
            ("SKIP_LIMIT", "0"),
            ("TRANSFORM_WORKERS", "3"),
            ("COUNT_TRANSFORM_FAILURES", "true"),
        ]))
        .unwrap();

        assert_eq!(config.postgres.url, "postgres://db:5432/shop");
        assert_eq!(config.opensearch.request_timeout, Duration::from_secs(5));
        assert_eq!(config.pipeline.chunk_size, 250);
        assert_eq!(config.pipeline.skip_limit, 0);
        assert_eq!(config.pipeline.transform_workers, 3);
        assert!(config.pipeline.count_transform_failures);
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = IndexerConfig::from_lookup(lookup(&[("SKIP_LIMIT", "lots")])).unwrap_err();

        assert!(matches!(err, IndexingError::ConfigError(_)));
        assert!(err.to_string().contains("SKIP_LIMIT"));
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let err = IndexerConfig::from_lookup(lookup(&[("CHUNK_SIZE", "0")])).unwrap_err();

        assert!(matches!(err, IndexingError::ConfigError(_)));
    }
}
