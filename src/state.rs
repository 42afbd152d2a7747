use std::sync::Arc;

use anyhow::anyhow;

use crate::common::error::AppError;
use crate::config::settings::AppConfig;
use crate::infrastructure::source::SourceClient;
use crate::infrastructure::storage::Destination;
use crate::modules::transfer::repository::JobStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Absent in direct mode, where nothing is persisted.
    pub jobs: Option<Arc<dyn JobStore>>,
    pub destination: Arc<dyn Destination>,
    pub source: SourceClient,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        jobs: Option<Arc<dyn JobStore>>,
        destination: Arc<dyn Destination>,
        source: SourceClient,
    ) -> Self {
        Self {
            config: Arc::new(config),
            jobs,
            destination,
            source,
        }
    }

    pub fn job_store(&self) -> Result<&Arc<dyn JobStore>, AppError> {
        self.jobs
            .as_ref()
            .ok_or_else(|| AppError::Internal(anyhow!("Job queue is not configured")))
    }
}
