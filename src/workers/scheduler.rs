use chrono::{DateTime, Utc};
use cron::Schedule;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::modules::transfer::service::TransferService;
use crate::state::AppState;

/// Runs the processing routine on every tick of `schedule`, one job per tick,
/// for deployments without an external scheduler hitting `/api/cron/process`.
pub async fn start_transfer_scheduler(state: AppState, schedule: Schedule) {
    info!("⏰ Starting transfer scheduler");

    loop {
        let Some(delay) = delay_until_next(&schedule, Utc::now()) else {
            warn!("Transfer schedule has no upcoming ticks, stopping scheduler");
            return;
        };

        tokio::time::sleep(delay).await;

        match TransferService::process_next(state.clone()).await {
            Ok(res) => match res.job_id {
                Some(job_id) => info!("⏰ Scheduled run processed job {}", job_id),
                None => debug!("⏰ Scheduled run found no pending jobs"),
            },
            Err(e) => error!("❌ Scheduled run failed: {}", e),
        }
    }
}

pub fn delay_until_next(schedule: &Schedule, now: DateTime<Utc>) -> Option<Duration> {
    let next = schedule.after(&now).next()?;
    Some((next - now).to_std().unwrap_or(Duration::ZERO))
}
