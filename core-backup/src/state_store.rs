//! # Transient State Store Provisioning
//!
//! Provisions the uniquely-named, throwaway SQLite database one
//! synchronization run uses for its bookkeeping.
//!
//! The store is exclusively owned by a single run: the backing file is a
//! `tempfile`-managed path that is removed when the store is dropped, on
//! success and on failure alike. Nothing survives across runs.

use async_trait::async_trait;
use bridge_traits::error::BridgeError;
use bridge_traits::store::StateStore;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::{BackupError, Result};

/// Bookkeeping schema the engine records per-run sync state in.
const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS sync_journal (
    path TEXT PRIMARY KEY,
    etag TEXT,
    modtime INTEGER,
    size INTEGER
)";

/// Transient per-run bookkeeping store backed by a temporary SQLite file.
pub struct SqliteStateStore {
    file: NamedTempFile,
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Create a fresh store.
    ///
    /// The backing file is placed in `state_dir` when given, otherwise in
    /// the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::StateStore`] when the file or database cannot
    /// be created.
    pub async fn create(state_dir: Option<&Path>) -> Result<Self> {
        let builder = {
            let mut builder = tempfile::Builder::new();
            builder.prefix(".sync_journal_").suffix(".db");
            builder
        };

        let file = match state_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| BackupError::StateStore(e.to_string()))?;

        let options = SqliteConnectOptions::new()
            .filename(file.path())
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| BackupError::StateStore(e.to_string()))?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| BackupError::StateStore(e.to_string()))?;

        debug!(path = %file.path().display(), "Provisioned transient sync journal");

        Ok(Self { file, pool })
    }

    /// The connection pool over the backing database.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool.
    ///
    /// Dropping the store removes the backing file either way; closing first
    /// lets SQLite flush cleanly.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    fn location(&self) -> &Path {
        self.file.path()
    }

    async fn reset(&self) -> bridge_traits::error::Result<()> {
        sqlx::query("DELETE FROM sync_journal")
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::Database(e.to_string()))?;
        Ok(())
    }
}
