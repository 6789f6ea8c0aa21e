//! SQLite-backed persistent store.
//!
//! Split into focused submodules:
//! - `identities` — identity rows, consent flags, scheduled deletions and purges
//! - `messages` — batched message capture, quotas and log import
//! - `profiles` — named attribution profiles

mod identities;
mod messages;
mod profiles;

pub use identities::ScheduleOutcome;
pub use messages::{parse_log_line, ImportSummary};
pub use profiles::{ProfileCreation, PROFILE_DELIMITER};

use hearsay_core::{config::StorageConfig, error::HearsayError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Persistent store backed by SQLite.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open the store, running migrations on first use.
    pub async fn new(config: &StorageConfig) -> Result<Self, HearsayError> {
        let db_path = &config.db_path;

        // Ensure parent directory exists.
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    HearsayError::Storage(format!("failed to create data dir: {e}"))
                })?;
            }
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| HearsayError::Storage(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| HearsayError::Storage(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("Store initialized at {db_path}");

        Ok(Self { pool })
    }

    /// Private in-memory store on a single pinned connection.
    ///
    /// The database lives as long as that connection, so it is never
    /// recycled.
    pub async fn in_memory() -> Result<Self, HearsayError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| HearsayError::Storage(format!("invalid db path: {e}")))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(opts)
            .await
            .map_err(|e| HearsayError::Storage(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cheap round-trip used by `hearsay status`.
    pub async fn ping(&self) -> Result<(), HearsayError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| HearsayError::Storage(format!("ping failed: {e}")))?;
        Ok(())
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), HearsayError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| HearsayError::Storage(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] = &[
            ("001_init", include_str!("../../migrations/001_init.sql")),
            (
                "002_deletion_index",
                include_str!("../../migrations/002_deletion_index.sql"),
            ),
            (
                "003_profile_unique",
                include_str!("../../migrations/003_profile_unique.sql"),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        HearsayError::Storage(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| HearsayError::Storage(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    HearsayError::Storage(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }
}
