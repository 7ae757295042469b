//! PostgreSQL implementation of the record sources.
//!
//! Pages are read with keyset pagination on the primary key, so every page
//! query is independent of how many rows were read before it.

mod products;
mod users;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use tracing::info;

use crate::config::PostgresConfig;
use crate::errors::SourceError;

pub use products::ProductSource;
pub use users::UserSource;

/// Open a connection pool for the source database.
///
/// The statement timeout is set on every connection so that a stuck page
/// query surfaces as a [`SourceError::Timeout`].
pub async fn connect(config: &PostgresConfig) -> Result<PgPool, SourceError> {
    let statement_timeout_ms = config.statement_timeout.as_millis().to_string();
    let options = PgConnectOptions::from_str(&config.url)
        .map_err(|e| SourceError::connection(format!("Invalid database URL: {}", e)))?
        .options([("statement_timeout", statement_timeout_ms.as_str())]);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(|e| SourceError::connection(format!("Failed to connect to PostgreSQL: {}", e)))?;

    info!(
        max_connections = config.max_connections,
        statement_timeout_ms = %statement_timeout_ms,
        "Connected to source database"
    );

    Ok(pool)
}

/// Convert a page size into a `LIMIT` parameter.
fn limit(page_size: usize) -> i64 {
    i64::try_from(page_size).unwrap_or(i64::MAX)
}
