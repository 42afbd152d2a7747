use axum::{
    body::Bytes,
    extract::{
        Query, State,
        rejection::{BytesRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};

use super::dto::{JobStatusResponse, ProcessResponse, StatusQuery, SubmitTransferResponse, TransferRequest};
use super::service::TransferService;
use crate::common::response::{ApiError, ApiSuccess, ErrorBody};
use crate::state::AppState;

/// Queue a video transfer
#[utoipa::path(
    post,
    path = "/api/transfer",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Job queued. In direct mode the body is a DirectTransferResponse instead", body = SubmitTransferResponse),
        (status = 400, description = "Malformed body or missing fields", body = ErrorBody),
        (status = 413, description = "Body too large", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    ),
    tag = "Transfer"
)]
pub async fn submit_transfer(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };
    let (source_url, meeting_name) = match TransferRequest::from_body(&body) {
        Ok(fields) => fields,
        Err(e) => return ApiError::from(e).into_response(),
    };

    match TransferService::submit(state, source_url, meeting_name).await {
        Ok(res) => ApiSuccess(res, StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Direct-mode replacement for `submit_transfer`: transfers synchronously and
/// answers with a `DirectTransferResponse`. Nothing is persisted.
pub async fn transfer_direct(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };
    let (source_url, meeting_name) = match TransferRequest::from_body(&body) {
        Ok(fields) => fields,
        Err(e) => return ApiError::from(e).into_response(),
    };

    match TransferService::transfer_now(state, source_url, meeting_name).await {
        Ok(res) => ApiSuccess(res, StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Get the status of a transfer job
#[utoipa::path(
    get,
    path = "/api/status",
    params(StatusQuery),
    responses(
        (status = 200, description = "Current job state", body = JobStatusResponse),
        (status = 400, description = "Missing or malformed job_id", body = ErrorBody),
        (status = 404, description = "Job not found", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    ),
    tag = "Transfer"
)]
pub async fn get_status(
    State(state): State<AppState>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> impl IntoResponse {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };

    match TransferService::status(state, query.job_id).await {
        Ok(res) => ApiSuccess(res, StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Process the oldest pending job
/// Meant to be called by a scheduler; handles at most one job per call.
#[utoipa::path(
    get,
    path = "/api/cron/process",
    responses(
        (status = 200, description = "Zero or one job processed", body = ProcessResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    ),
    tag = "Transfer",
    security((), ("cron_secret" = []))
)]
pub async fn process_jobs(State(state): State<AppState>) -> impl IntoResponse {
    match TransferService::process_next(state).await {
        Ok(res) => ApiSuccess(res, StatusCode::OK).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}
