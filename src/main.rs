use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use video_transfer::app;
use video_transfer::config::settings::{AppConfig, TransferMode};
use video_transfer::infrastructure::db::pool::{connect_to_db, run_migrations};
use video_transfer::infrastructure::source::SourceClient;
use video_transfer::infrastructure::storage;
use video_transfer::modules::transfer::repository::{JobStore, TransferJobRepository};
use video_transfer::state::AppState;
use video_transfer::workers::scheduler::start_transfer_scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    info!("Starting server...");

    let config = AppConfig::new().context("Invalid configuration")?;

    let jobs: Option<Arc<dyn JobStore>> = match config.mode {
        TransferMode::Queued => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required in queued mode")?;
            let pool = connect_to_db(database_url).await?;
            run_migrations(&pool).await?;
            Some(Arc::new(TransferJobRepository::new(pool)))
        }
        TransferMode::Direct => {
            info!("Direct mode: transfers run inside the request, no job queue");
            None
        }
    };

    let destination = storage::build(&config)?;
    let source = SourceClient::new(config.download_timeout)?;
    let port = config.server_port;

    let state = AppState::new(config, jobs, destination, source);

    if let Some(schedule) = state.config.cron_schedule.clone() {
        if state.config.mode == TransferMode::Queued {
            tokio::spawn(start_transfer_scheduler(state.clone(), schedule));
        } else {
            warn!("CRON_SCHEDULE is ignored in direct mode");
        }
    }

    let app = app::create_app(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
