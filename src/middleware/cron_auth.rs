use crate::common::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

/// Guards the processing trigger. With no secret configured every caller is let
/// through; otherwise the header must read exactly `Bearer <secret>`.
pub async fn cron_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(secret) = state.config.cron_secret.as_deref() else {
        return Ok(next.run(req).await);
    };

    let provided = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if !bearer_matches(provided, secret) {
        warn!("Rejected processing trigger with a missing or wrong secret");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(req).await)
}

fn bearer_matches(header_value: Option<&str>, secret: &str) -> bool {
    match header_value.and_then(|v| v.strip_prefix("Bearer ")) {
        Some(token) => token == secret,
        None => false,
    }
}
