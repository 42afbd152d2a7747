use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::model::{JobStatus, TransferJob};
use crate::common::error::AppError;

pub const MISSING_FIELDS: &str = "Missing required fields: source_url and meeting_name";
pub const INVALID_JSON: &str = "Invalid JSON body";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TransferRequest {
    #[validate(required, length(min = 1))]
    pub source_url: Option<String>,
    #[validate(required, length(min = 1))]
    pub meeting_name: Option<String>,
}

impl TransferRequest {
    /// Parses a raw body. Missing or empty fields are a client error.
    pub fn from_body(body: &[u8]) -> Result<(String, String), AppError> {
        let invalid = || AppError::BadRequest(INVALID_JSON.to_string());

        // Derived struct visitors also accept positional arrays; only objects are requests.
        let value: serde_json::Value = serde_json::from_slice(body).map_err(|_| invalid())?;
        if !value.is_object() {
            return Err(invalid());
        }
        let req: TransferRequest = serde_json::from_value(value).map_err(|_| invalid())?;

        req.validate()
            .map_err(|_| AppError::BadRequest(MISSING_FIELDS.to_string()))?;

        match (req.source_url, req.meeting_name) {
            (Some(source_url), Some(meeting_name)) => Ok((source_url, meeting_name)),
            _ => Err(AppError::BadRequest(MISSING_FIELDS.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitTransferResponse {
    pub success: bool,
    pub job_id: Uuid,
    pub status: JobStatus,
    pub message: String,
}

impl SubmitTransferResponse {
    pub fn queued(job: &TransferJob) -> Self {
        Self {
            success: true,
            job_id: job.id,
            status: job.status,
            message: format!("Job queued. Poll /api/status?job_id={} for updates.", job.id),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    /// Identifier returned by `POST /api/transfer`.
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobStatusResponse {
    /// True only once the job has completed.
    pub success: bool,
    pub job_id: Uuid,
    pub status: JobStatus,
    pub meeting_name: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<TransferJob> for JobStatusResponse {
    fn from(job: TransferJob) -> Self {
        let (result_url, error) = match job.status {
            JobStatus::Completed => (job.result_url, None),
            JobStatus::Failed => (None, job.error),
            JobStatus::Pending | JobStatus::Processing => (None, None),
        };

        Self {
            success: job.status == JobStatus::Completed,
            job_id: job.id,
            status: job.status,
            meeting_name: job.meeting_name,
            created_at: job.created_at,
            result_url,
            error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcessResponse {
    pub success: bool,
    pub message: String,
    pub processed: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
}

impl ProcessResponse {
    pub fn idle() -> Self {
        Self {
            success: true,
            message: "No pending jobs".to_string(),
            processed: 0,
            job_id: None,
        }
    }

    pub fn processed(job_id: Uuid) -> Self {
        Self {
            success: true,
            message: "Job processed".to_string(),
            processed: 1,
            job_id: Some(job_id),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DirectTransferResponse {
    pub success: bool,
    pub url: String,
    pub filename: String,
}
