//! Persistent storage for servers, templates and report dedupe keys.
//!
//! SQLite through SQLx. Concurrency control is left to SQLite itself (WAL,
//! single writer); the only uniqueness the application relies on is the
//! `(serial, request_id)` unique key of `processed_requests`.

mod models;
mod servers;
mod templates;

pub use models::{ConfigTemplate, NewServer, Server, ServerStatus, TemplateInput};
pub use servers::{ReportOutcome, ServerRepository};
pub use templates::TemplateRepository;

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server {serial}: cannot move from {from} to {to}")]
    InvalidTransition {
        serial: String,
        from: ServerStatus,
        to: ServerStatus,
    },
}

/// Database handle with connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `path` and run migrations.
    ///
    /// `":memory:"` gives a private in-memory database on a single
    /// connection that lives as long as the pool.
    pub async fn new(path: &str) -> Result<Self, StorageError> {
        let pool = if path == ":memory:" {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        tracing::warn!(path = %parent.display(), error = %e, "Failed to create database directory");
                    }
                }
            }

            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(std::time::Duration::from_secs(5));

            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        info!(path = %path, "Database connected");

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations checked/applied");

        Ok(Self { pool })
    }

    pub fn servers(&self) -> ServerRepository<'_> {
        ServerRepository::new(&self.pool)
    }

    pub fn templates(&self) -> TemplateRepository<'_> {
        TemplateRepository::new(&self.pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_database_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data/pxe.db");

        let db = Database::new(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());
        assert!(db.servers().list(None).await.unwrap().is_empty());
    }
}
