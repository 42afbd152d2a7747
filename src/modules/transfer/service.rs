use anyhow::Context;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::{DirectTransferResponse, JobStatusResponse, ProcessResponse, SubmitTransferResponse};
use super::pipeline;
use crate::common::error::AppError;
use crate::state::AppState;

pub const JOB_NOT_FOUND: &str = "Job not found";
pub const MISSING_JOB_ID: &str = "Missing required parameter: job_id";

pub struct TransferService;

impl TransferService {
    pub async fn submit(
        state: AppState,
        source_url: String,
        meeting_name: String,
    ) -> Result<SubmitTransferResponse, AppError> {
        let job = state
            .job_store()?
            .create(&source_url, &meeting_name)
            .await?;

        info!("📦 Queued transfer job {} for '{}'", job.id, job.meeting_name);
        Ok(SubmitTransferResponse::queued(&job))
    }

    pub async fn status(state: AppState, job_id: Option<String>) -> Result<JobStatusResponse, AppError> {
        let job_id = job_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::BadRequest(MISSING_JOB_ID.to_string()))?;

        // A malformed id cannot name a row.
        let id = Uuid::parse_str(&job_id).map_err(|_| AppError::NotFound(JOB_NOT_FOUND.to_string()))?;

        let job = state
            .job_store()?
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(JOB_NOT_FOUND.to_string()))?;

        Ok(JobStatusResponse::from(job))
    }

    /// Claims the oldest pending job, if any, and runs it to a terminal state.
    /// A failing transfer is recorded on the job; only store errors surface here.
    pub async fn process_next(state: AppState) -> Result<ProcessResponse, AppError> {
        let jobs = state.job_store()?;

        let Some(job) = jobs.claim_next_pending().await? else {
            return Ok(ProcessResponse::idle());
        };

        info!("🎬 Processing transfer job {} ({})", job.id, job.source_url);

        // A failed completion write is recorded as a job failure.
        let result = match pipeline::run(
            &state.source,
            state.destination.as_ref(),
            &job.source_url,
            &job.meeting_name,
        )
        .await
        {
            Ok(outcome) => jobs
                .mark_completed(job.id, &outcome.url)
                .await
                .context("Transfer succeeded but the job could not be completed")
                .map(|_| outcome),
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => {
                info!("✅ Job {} completed as {}", job.id, outcome.filename);
            }
            Err(e) => {
                let message = format!("{:#}", e);
                warn!("❌ Job {} failed: {}", job.id, message);
                if let Err(store_err) = jobs.mark_failed(job.id, &message).await {
                    error!("Failed to record failure of job {}: {:#}", job.id, store_err);
                    return Err(store_err.into());
                }
            }
        }

        Ok(ProcessResponse::processed(job.id))
    }

    pub async fn transfer_now(
        state: AppState,
        source_url: String,
        meeting_name: String,
    ) -> Result<DirectTransferResponse, AppError> {
        let outcome = pipeline::run(
            &state.source,
            state.destination.as_ref(),
            &source_url,
            &meeting_name,
        )
        .await?;

        Ok(DirectTransferResponse {
            success: true,
            url: outcome.url,
            filename: outcome.filename,
        })
    }
}
