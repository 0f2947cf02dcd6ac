use anyhow::Result;
use async_trait::async_trait;
use libsql::params;

use super::models::{MonitorTarget, PollResult, TargetStatus};
use crate::pool::DbPool;
use crate::validation::{validate_http_endpoint, validate_interval};

/// Persistence gateway consumed by the polling engine.
///
/// The engine re-reads targets through this trait every cycle and never
/// caches them; writes are per-operation with no cross-task transactions.
#[async_trait]
pub trait Database: Send + Sync {
    /// Get all registered targets
    async fn list_targets(&self) -> Result<Vec<MonitorTarget>>;

    /// Get a target by id
    async fn get_target(&self, id: i64) -> Result<Option<MonitorTarget>>;

    /// Register a new target, returning its id
    async fn save_target(&self, target: &MonitorTarget) -> Result<i64>;

    /// Persist status/timestamp changes for an existing target
    async fn update_target(&self, target: &MonitorTarget) -> Result<()>;

    /// Remove a target (poll history goes with it)
    async fn delete_target(&self, id: i64) -> Result<()>;

    /// Append a poll result
    async fn insert_result(&self, result: &PollResult) -> Result<i64>;

    /// Get the most recent poll results for a target, newest first
    async fn get_recent_results(&self, target_id: i64, limit: usize) -> Result<Vec<PollResult>>;
}

/// LibSQL-backed gateway implementation
pub struct DatabaseImpl {
    pool: DbPool,
}

impl DatabaseImpl {
    /// Create a new database instance from a pool
    pub fn new_from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a connection from the pool
    async fn get_conn(&self) -> Result<deadpool::managed::Object<crate::pool::DbManager>> {
        Ok(self.pool.get().await?)
    }

    fn row_to_target(row: &libsql::Row) -> Result<MonitorTarget> {
        let status: String = row.get(4)?;
        let created_at: i64 = row.get(5)?;
        let updated_at: i64 = row.get(6)?;

        Ok(MonitorTarget {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            interval_seconds: row.get(3)?,
            status: TargetStatus::parse(&status),
            created_at: MonitorTarget::i64_to_timestamp(created_at),
            updated_at: MonitorTarget::i64_to_timestamp(updated_at),
        })
    }
}

const TARGET_COLUMNS: &str = "id, name, url, interval_seconds, status, created_at, updated_at";

#[async_trait]
impl Database for DatabaseImpl {
    async fn list_targets(&self) -> Result<Vec<MonitorTarget>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(&format!("SELECT {TARGET_COLUMNS} FROM targets ORDER BY id"))
            .await?;

        let mut rows = stmt.query(()).await?;
        let mut targets = Vec::new();

        while let Some(row) = rows.next().await? {
            targets.push(Self::row_to_target(&row)?);
        }

        Ok(targets)
    }

    async fn get_target(&self, id: i64) -> Result<Option<MonitorTarget>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(&format!("SELECT {TARGET_COLUMNS} FROM targets WHERE id = ?"))
            .await?;

        let mut rows = stmt.query(params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_target(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn save_target(&self, target: &MonitorTarget) -> Result<i64> {
        validate_http_endpoint(&target.url).to_result()?;
        validate_interval(target.interval_seconds).to_result()?;

        let conn = self.get_conn().await?;
        let created_at = MonitorTarget::timestamp_to_i64(target.created_at);
        let updated_at = MonitorTarget::timestamp_to_i64(target.updated_at);

        conn.execute(
            "INSERT INTO targets (name, url, interval_seconds, status, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)",
            params![
                target.name.clone(),
                target.url.clone(),
                target.interval_seconds,
                target.status.to_string(),
                created_at,
                updated_at
            ],
        )
        .await?;

        Ok(conn.last_insert_rowid())
    }

    async fn update_target(&self, target: &MonitorTarget) -> Result<()> {
        let conn = self.get_conn().await?;
        let updated_at = MonitorTarget::timestamp_to_i64(target.updated_at);

        conn.execute(
            "UPDATE targets SET name = ?, url = ?, interval_seconds = ?, status = ?, updated_at = ?
                WHERE id = ?",
            params![
                target.name.clone(),
                target.url.clone(),
                target.interval_seconds,
                target.status.to_string(),
                updated_at,
                target.id
            ],
        )
        .await?;

        Ok(())
    }

    async fn delete_target(&self, id: i64) -> Result<()> {
        let conn = self.get_conn().await?;

        // Related poll_results rows are removed via ON DELETE CASCADE
        conn.execute("DELETE FROM targets WHERE id = ?", params![id]).await?;
        Ok(())
    }

    async fn insert_result(&self, result: &PollResult) -> Result<i64> {
        let conn = self.get_conn().await?;
        let timestamp = MonitorTarget::timestamp_to_i64(result.timestamp);

        conn.execute(
            "INSERT INTO poll_results (target_id, status_code, latency_ms, timestamp)
                VALUES (?, ?, ?, ?)",
            params![result.target_id, result.status_code as i64, result.latency_ms, timestamp],
        )
        .await?;

        Ok(conn.last_insert_rowid())
    }

    async fn get_recent_results(&self, target_id: i64, limit: usize) -> Result<Vec<PollResult>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(
                "SELECT id, target_id, status_code, latency_ms, timestamp FROM poll_results
                    WHERE target_id = ? ORDER BY timestamp DESC, id DESC LIMIT ?",
            )
            .await?;

        let mut rows = stmt.query(params![target_id, limit as i64]).await?;
        let mut results = Vec::new();

        while let Some(row) = rows.next().await? {
            let timestamp: i64 = row.get(4)?;
            results.push(PollResult {
                id: Some(row.get(0)?),
                target_id: row.get(1)?,
                status_code: row.get::<i64>(2)? as u16,
                latency_ms: row.get(3)?,
                timestamp: MonitorTarget::i64_to_timestamp(timestamp),
            });
        }

        Ok(results)
    }
}
