use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::config::settings::TransferMode;
use crate::state::AppState;

pub mod dto;
pub mod handler;
pub mod model;
pub mod pipeline;
pub mod repository;
pub mod service;

pub fn router(state: AppState) -> Router<AppState> {
    let mode = state.config.mode;
    match mode {
        TransferMode::Direct => Router::new().route("/transfer", post(handler::transfer_direct)),
        TransferMode::Queued => {
            let public_routes = Router::new()
                .route("/transfer", post(handler::submit_transfer))
                .route("/status", get(handler::get_status));

            let cron_routes = Router::new()
                .route("/cron/process", get(handler::process_jobs))
                .route_layer(middleware::from_fn_with_state(
                    state,
                    crate::middleware::cron_auth::cron_auth,
                ));

            public_routes.merge(cron_routes)
        }
    }
}
