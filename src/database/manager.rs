use std::sync::Arc;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::memory::MemoryRepository;
use crate::database::postgres::PgRepository;
use crate::database::repository::Repository;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// URL scheme that selects the in-process store instead of Postgres.
pub const MEMORY_URL_SCHEME: &str = "memory:";

/// Builds the repository named by `DATABASE_URL`.
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn Repository>, DatabaseError> {
        if config.url.starts_with(MEMORY_URL_SCHEME) {
            info!("Using in-memory repository; data is lost on restart");
            return Ok(Arc::new(MemoryRepository::new()));
        }

        let pool = Self::pool(config).await?;
        if config.run_migrations {
            Self::migrate(&pool).await?;
        }
        Ok(Arc::new(PgRepository::new(pool)))
    }

    /// Bounded connection pool; each statement runs in its own implicit transaction.
    pub async fn pool(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        info!(
            "Database connection pool initialized (max {} connections)",
            config.max_connections
        );
        Ok(pool)
    }

    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        info!("Database migrations applied");
        Ok(())
    }
}

/// Maps unique-key violations to `Conflict`, leaving other errors untouched.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            DatabaseError::Conflict(message.to_string())
        }
        _ => DatabaseError::Sqlx(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_url_selects_in_process_store() {
        let config = DatabaseConfig {
            url: "memory://".to_string(),
            max_connections: 1,
            connection_timeout: 1,
            run_migrations: true,
        };
        let repo = DatabaseManager::connect(&config).await.unwrap();
        assert!(repo.health_check().await.is_ok());
    }

    #[test]
    fn non_unique_errors_pass_through() {
        let err = conflict_on_unique(sqlx::Error::RowNotFound, "taken");
        assert!(matches!(err, DatabaseError::Sqlx(sqlx::Error::RowNotFound)));
    }
}
