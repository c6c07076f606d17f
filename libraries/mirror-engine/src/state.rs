//! Persisted sync state: last-known-good fingerprints and per-target
//! configuration.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mirror_core::{SyncRecord, TargetConfig};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::debug;

/// Errors from the persisted state store.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid persisted timestamp: {0:?}")]
    InvalidTimestamp(String),
}

/// External state store, keyed by sync target name.
///
/// Read-before-write, upsert semantics, last-writer-wins. Concurrent runs for
/// the same target are not coordinated here.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Last-known-good record for a target; `None` before the first
    /// successful run.
    async fn get_record(&self, target: &str) -> Result<Option<SyncRecord>, StateError>;

    /// Upsert the record for a target after a successful cycle.
    async fn put_record(&self, target: &str, fingerprint: &str) -> Result<(), StateError>;

    /// Per-target configuration, if any has been stored.
    async fn get_target_config(&self, target: &str) -> Result<Option<TargetConfig>, StateError>;

    /// Backfill or update the per-target configuration.
    async fn put_target_config(&self, target: &str, remote_folder: &str)
        -> Result<(), StateError>;
}

/// SQLite-backed state store. Schema is created on connect.
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Connect and bootstrap the schema.
    ///
    /// `database_url` is an sqlx SQLite URL, e.g.
    /// `sqlite:///var/lib/drive-mirror/state.db?mode=rwc`.
    pub async fn connect(database_url: &str) -> Result<Self, StateError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(database_url)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sync_records (
                target TEXT PRIMARY KEY,
                fingerprint TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS target_configs (
                target TEXT PRIMARY KEY,
                remote_folder TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        debug!(database_url = %database_url, "State store connected");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn parse_timestamp(raw: String) -> Result<DateTime<Utc>, StateError> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| StateError::InvalidTimestamp(raw))
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn get_record(&self, target: &str) -> Result<Option<SyncRecord>, StateError> {
        let row = sqlx::query("SELECT fingerprint, updated_at FROM sync_records WHERE target = ?")
            .bind(target)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let fingerprint: String = row.get("fingerprint");
            let updated_at = parse_timestamp(row.get("updated_at"))?;
            Ok(SyncRecord {
                fingerprint,
                updated_at,
            })
        })
        .transpose()
    }

    async fn put_record(&self, target: &str, fingerprint: &str) -> Result<(), StateError> {
        sqlx::query(
            "INSERT INTO sync_records (target, fingerprint, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(target) DO UPDATE SET
                fingerprint = excluded.fingerprint,
                updated_at = excluded.updated_at",
        )
        .bind(target)
        .bind(fingerprint)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(target = %target, "Persisted sync record");
        Ok(())
    }

    async fn get_target_config(&self, target: &str) -> Result<Option<TargetConfig>, StateError> {
        let row =
            sqlx::query("SELECT remote_folder, updated_at FROM target_configs WHERE target = ?")
                .bind(target)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|row| {
            let remote_folder: String = row.get("remote_folder");
            let updated_at = parse_timestamp(row.get("updated_at"))?;
            Ok(TargetConfig {
                remote_folder,
                updated_at,
            })
        })
        .transpose()
    }

    async fn put_target_config(
        &self,
        target: &str,
        remote_folder: &str,
    ) -> Result<(), StateError> {
        sqlx::query(
            "INSERT INTO target_configs (target, remote_folder, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(target) DO UPDATE SET
                remote_folder = excluded.remote_folder,
                updated_at = excluded.updated_at",
        )
        .bind(target)
        .bind(remote_folder)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(target = %target, "Persisted target config");
        Ok(())
    }
}
