use anyhow::{Result, anyhow};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::TransferJob;

/// Persistence for transfer jobs. Every status write is conditional on the
/// current status, so rows only ever move forward.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, source_url: &str, meeting_name: &str) -> Result<TransferJob>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TransferJob>>;

    /// Atomically moves the oldest pending job to `processing` and returns it.
    async fn claim_next_pending(&self) -> Result<Option<TransferJob>>;

    async fn mark_completed(&self, id: Uuid, result_url: &str) -> Result<()>;

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()>;
}

const JOB_COLUMNS: &str =
    "id, source_url, meeting_name, status, result_url, error, created_at, updated_at";

pub struct TransferJobRepository {
    pool: PgPool,
}

impl TransferJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for TransferJobRepository {
    async fn create(&self, source_url: &str, meeting_name: &str) -> Result<TransferJob> {
        let job = sqlx::query_as::<_, TransferJob>(&format!(
            r#"
            INSERT INTO video_transfer_jobs (source_url, meeting_name, status)
            VALUES ($1, $2, 'pending')
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(source_url)
        .bind(meeting_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to create transfer job: {}", e))?;

        Ok(job)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TransferJob>> {
        let job = sqlx::query_as::<_, TransferJob>(&format!(
            "SELECT {JOB_COLUMNS} FROM video_transfer_jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to fetch transfer job: {}", e))?;

        Ok(job)
    }

    async fn claim_next_pending(&self) -> Result<Option<TransferJob>> {
        // SKIP LOCKED lets overlapping triggers pass over a row another one is claiming.
        let job = sqlx::query_as::<_, TransferJob>(&format!(
            r#"
            UPDATE video_transfer_jobs
            SET status = 'processing', updated_at = NOW()
            WHERE id = (
                SELECT id
                FROM video_transfer_jobs
                WHERE status = 'pending'
                ORDER BY created_at ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            AND status = 'pending'
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to claim pending job: {}", e))?;

        Ok(job)
    }

    async fn mark_completed(&self, id: Uuid, result_url: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE video_transfer_jobs
            SET status = 'completed', result_url = $2, error = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(id)
        .bind(result_url)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to complete job {}: {}", id, e))?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("Job {} is not processing", id));
        }

        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE video_transfer_jobs
            SET status = 'failed', error = $2, result_url = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to fail job {}: {}", id, e))?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("Job {} is not processing", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::transfer::model::JobStatus;

    async fn backdate(pool: &PgPool, id: Uuid, seconds: i64) {
        sqlx::query("UPDATE video_transfer_jobs SET created_at = NOW() - make_interval(secs => $2) WHERE id = $1")
            .bind(id)
            .bind(seconds as f64)
            .execute(pool)
            .await
            .unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn created_jobs_start_pending(pool: PgPool) {
        let repo = TransferJobRepository::new(pool);
        let job = repo.create("https://x/video.raw", "Team Sync!").await.unwrap();

        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.result_url.is_none());
        assert!(job.error.is_none());

        let found = repo.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(found.meeting_name, "Team Sync!");
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn claims_oldest_pending_first(pool: PgPool) {
        let repo = TransferJobRepository::new(pool.clone());
        let newer = repo.create("https://x/new.raw", "newer").await.unwrap();
        let older = repo.create("https://x/old.raw", "older").await.unwrap();
        backdate(&pool, older.id, 60).await;

        let first = repo.claim_next_pending().await.unwrap().unwrap();
        assert_eq!(first.id, older.id);
        assert_eq!(first.status, JobStatus::Processing);

        let second = repo.claim_next_pending().await.unwrap().unwrap();
        assert_eq!(second.id, newer.id);

        assert!(repo.claim_next_pending().await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a Postgres DATABASE_URL"]
    async fn terminal_writes_require_processing(pool: PgPool) {
        let repo = TransferJobRepository::new(pool);
        let job = repo.create("https://x/video.raw", "standup").await.unwrap();

        assert!(repo.mark_completed(job.id, "https://signed").await.is_err());

        repo.claim_next_pending().await.unwrap().unwrap();
        repo.mark_failed(job.id, "404 Not Found").await.unwrap();

        let failed = repo.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("404 Not Found"));
        assert!(failed.result_url.is_none());

        assert!(repo.mark_completed(job.id, "https://signed").await.is_err());
    }
}
