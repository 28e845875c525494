//! Durable FIFO queue of pending test-result submissions.
//!
//! Backed by a SQLite table so pending items survive process restarts.
//! Items are consumed front-to-back; the attempt counter lives here (queue
//! state, not dispatcher state), and an item whose counter reaches the
//! configured ceiling is deleted in the same `mark_failed` call.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use thiserror::Error;

use resultwire_core::BuildRef;

/// Default ceiling on submission attempts per item.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Queue storage error.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("queue io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("queue row decode error: {0}")]
    Decode(String),
}

/// One pending submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    /// Storage ordinal; defines FIFO order.
    pub seq: i64,
    pub build: BuildRef,
    /// Failed attempts recorded so far.
    pub attempts: u32,
    pub enqueued_at: DateTime<Utc>,
}

/// SQLite-backed FIFO queue.
///
/// Cheap to clone and safe to share across tasks.
#[derive(Debug, Clone)]
pub struct ResultQueue {
    pool: SqlitePool,
    max_attempts: u32,
}

impl ResultQueue {
    /// Open (or create) the queue database at `path`.
    pub async fn open(path: &Path) -> Result<Self, QueueError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(QueueError::Storage)?;
        Self::init(pool).await
    }

    /// In-memory queue for tests/dev; not durable.
    pub async fn in_memory() -> Result<Self, QueueError> {
        let options = SqliteConnectOptions::new().in_memory(true);
        // One connection, or each would see its own private database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(QueueError::Storage)?;
        Self::init(pool).await
    }

    async fn init(pool: SqlitePool) -> Result<Self, QueueError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS result_queue (
                seq          INTEGER PRIMARY KEY AUTOINCREMENT,
                project      TEXT NOT NULL,
                build_number INTEGER NOT NULL,
                attempts     INTEGER NOT NULL DEFAULT 0,
                enqueued_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            pool,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        })
    }

    /// Override the per-item attempt ceiling.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Append a pending submission for `build`.
    pub async fn enqueue(&self, build: BuildRef) -> Result<(), QueueError> {
        sqlx::query(
            r#"
            INSERT INTO result_queue (project, build_number, attempts, enqueued_at)
            VALUES (?1, ?2, 0, ?3)
            "#,
        )
        .bind(&build.project)
        .bind(i64::from(build.number))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Oldest pending item, without removing it.
    ///
    /// Stable across repeated calls until the item is explicitly removed.
    pub async fn peek_first(&self) -> Result<Option<QueueItem>, QueueError> {
        let row = sqlx::query(
            r#"
            SELECT seq, project, build_number, attempts, enqueued_at
            FROM result_queue
            ORDER BY seq ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_item).transpose()
    }

    /// Remove the current oldest item.
    pub async fn remove(&self) -> Result<(), QueueError> {
        sqlx::query(
            r#"
            DELETE FROM result_queue
            WHERE seq = (SELECT MIN(seq) FROM result_queue)
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a failed attempt for `item`.
    ///
    /// Returns whether the item is still eligible for future attempts. Once
    /// the ceiling is reached the row is deleted and `false` is returned, so
    /// an exhausted item can never wedge the head of the queue.
    pub async fn mark_failed(&self, item: &QueueItem) -> Result<bool, QueueError> {
        sqlx::query("UPDATE result_queue SET attempts = attempts + 1 WHERE seq = ?1")
            .bind(item.seq)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query("SELECT attempts FROM result_queue WHERE seq = ?1")
            .bind(item.seq)
            .fetch_optional(&self.pool)
            .await?;
        let attempts: i64 = match row {
            Some(row) => row.try_get("attempts")?,
            // Row vanished underneath us; nothing left to retry.
            None => return Ok(false),
        };

        if attempts as u32 >= self.max_attempts {
            sqlx::query("DELETE FROM result_queue WHERE seq = ?1")
                .bind(item.seq)
                .execute(&self.pool)
                .await?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Number of pending items.
    pub async fn len(&self) -> Result<u64, QueueError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM result_queue")
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n as u64)
    }

    pub async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len().await? == 0)
    }
}

fn row_to_item(row: SqliteRow) -> Result<QueueItem, QueueError> {
    let seq: i64 = row.try_get("seq")?;
    let project: String = row.try_get("project")?;
    let number: i64 = row.try_get("build_number")?;
    let attempts: i64 = row.try_get("attempts")?;
    let enqueued_at_str: String = row.try_get("enqueued_at")?;
    let enqueued_at = DateTime::parse_from_rfc3339(&enqueued_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| QueueError::Decode(format!("invalid enqueued_at: {e}")))?;

    Ok(QueueItem {
        seq,
        build: BuildRef::new(project, number as u32),
        attempts: attempts as u32,
        enqueued_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fifo_order_and_stable_peek() {
        let queue = ResultQueue::in_memory().await.unwrap();
        queue.enqueue(BuildRef::new("alpha", 1)).await.unwrap();
        queue.enqueue(BuildRef::new("beta", 7)).await.unwrap();

        let first = queue.peek_first().await.unwrap().unwrap();
        assert_eq!(first.build, BuildRef::new("alpha", 1));

        // Peek is non-destructive and stable.
        let again = queue.peek_first().await.unwrap().unwrap();
        assert_eq!(again, first);

        queue.remove().await.unwrap();
        let next = queue.peek_first().await.unwrap().unwrap();
        assert_eq!(next.build, BuildRef::new("beta", 7));
    }

    #[tokio::test]
    async fn empty_queue_peeks_nothing() {
        let queue = ResultQueue::in_memory().await.unwrap();
        assert!(queue.peek_first().await.unwrap().is_none());
        assert!(queue.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn mark_failed_counts_attempts_and_removes_at_ceiling() {
        let queue = ResultQueue::in_memory()
            .await
            .unwrap()
            .with_max_attempts(2);
        queue.enqueue(BuildRef::new("alpha", 1)).await.unwrap();

        let item = queue.peek_first().await.unwrap().unwrap();
        assert_eq!(item.attempts, 0);
        assert!(queue.mark_failed(&item).await.unwrap());

        let item = queue.peek_first().await.unwrap().unwrap();
        assert_eq!(item.attempts, 1);

        // Second failure hits the ceiling: no longer eligible, row deleted.
        assert!(!queue.mark_failed(&item).await.unwrap());
        assert!(queue.peek_first().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mark_failed_does_not_touch_other_items() {
        let queue = ResultQueue::in_memory()
            .await
            .unwrap()
            .with_max_attempts(1);
        queue.enqueue(BuildRef::new("alpha", 1)).await.unwrap();
        queue.enqueue(BuildRef::new("beta", 2)).await.unwrap();

        let head = queue.peek_first().await.unwrap().unwrap();
        assert!(!queue.mark_failed(&head).await.unwrap());

        let survivor = queue.peek_first().await.unwrap().unwrap();
        assert_eq!(survivor.build, BuildRef::new("beta", 2));
        assert_eq!(survivor.attempts, 0);
    }

    #[tokio::test]
    async fn queue_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.db");

        {
            let queue = ResultQueue::open(&path).await.unwrap();
            queue.enqueue(BuildRef::new("alpha", 42)).await.unwrap();
        }

        let queue = ResultQueue::open(&path).await.unwrap();
        let item = queue.peek_first().await.unwrap().unwrap();
        assert_eq!(item.build, BuildRef::new("alpha", 42));
        assert_eq!(queue.len().await.unwrap(), 1);
    }
}
