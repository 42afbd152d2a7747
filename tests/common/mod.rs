#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use bytes::Bytes;
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

use video_transfer::app::create_app;
use video_transfer::config::settings::{AppConfig, DestinationConfig, TransferMode};
use video_transfer::infrastructure::source::SourceClient;
use video_transfer::infrastructure::storage::{Destination, StorageError, StorageResult};
use video_transfer::modules::transfer::model::{JobStatus, TransferJob};
use video_transfer::modules::transfer::repository::JobStore;
use video_transfer::state::AppState;

/// Job store with the same forward-only rules as the Postgres repository.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<Vec<TransferJob>>,
    /// When set, the next `mark_completed` fails with this message and writes nothing.
    pub completion_error: Mutex<Option<String>>,
}

impl MemoryJobStore {
    pub fn insert_at(&self, source_url: &str, meeting_name: &str, created_at: OffsetDateTime) -> TransferJob {
        let job = TransferJob {
            id: Uuid::new_v4(),
            source_url: source_url.to_string(),
            meeting_name: meeting_name.to_string(),
            status: JobStatus::Pending,
            result_url: None,
            error: None,
            created_at,
            updated_at: created_at,
        };
        self.jobs.lock().unwrap().push(job.clone());
        job
    }

    pub fn get(&self, id: Uuid) -> TransferJob {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.id == id)
            .cloned()
            .expect("job exists")
    }

    pub fn snapshot(&self) -> Vec<(Uuid, JobStatus, Option<String>, Option<String>)> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .map(|j| (j.id, j.status, j.result_url.clone(), j.error.clone()))
            .collect()
    }

    /// Moves a pending job straight to `completed`, for tests that need a settled row.
    pub fn finish(&self, id: Uuid) {
        self.transition(id, JobStatus::Processing, None, None).unwrap();
        self.transition(id, JobStatus::Completed, Some("https://links.example/done"), None).unwrap();
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    fn transition(&self, id: Uuid, next: JobStatus, result_url: Option<&str>, error: Option<&str>) -> Result<()> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| anyhow!("Job {} not found", id))?;

        if !job.status.can_transition_to(next) {
            return Err(anyhow!("Job {} is not processing", id));
        }

        job.status = next;
        job.result_url = result_url.map(str::to_string);
        job.error = error.map(str::to_string);
        job.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, source_url: &str, meeting_name: &str) -> Result<TransferJob> {
        Ok(self.insert_at(source_url, meeting_name, OffsetDateTime::now_utc()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TransferJob>> {
        Ok(self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned())
    }

    async fn claim_next_pending(&self) -> Result<Option<TransferJob>> {
        let mut jobs = self.jobs.lock().unwrap();
        let next = jobs
            .iter_mut()
            .filter(|j| j.status == JobStatus::Pending)
            .min_by_key(|j| j.created_at);

        Ok(next.map(|job| {
            job.status = JobStatus::Processing;
            job.updated_at = OffsetDateTime::now_utc();
            job.clone()
        }))
    }

    async fn mark_completed(&self, id: Uuid, result_url: &str) -> Result<()> {
        if let Some(message) = self.completion_error.lock().unwrap().take() {
            return Err(anyhow!(message));
        }
        self.transition(id, JobStatus::Completed, Some(result_url), None)
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<()> {
        self.transition(id, JobStatus::Failed, None, Some(error))
    }
}

/// Destination that keeps uploads in memory and links to a fake host.
#[derive(Default)]
pub struct StubDestination {
    pub uploads: Mutex<Vec<(String, String, Bytes)>>,
    pub fail_with: Option<String>,
}

#[async_trait]
impl Destination for StubDestination {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn publish(&self, filename: &str, content_type: &str, data: Bytes) -> StorageResult<String> {
        if let Some(message) = &self.fail_with {
            return Err(StorageError::UploadFailed(message.clone()));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((filename.to_string(), content_type.to_string(), data));
        Ok(format!("https://links.example/{}?token=signed", filename))
    }
}

impl StubDestination {
    pub fn filenames(&self) -> Vec<String> {
        self.uploads.lock().unwrap().iter().map(|u| u.0.clone()).collect()
    }
}

pub fn config(mode: TransferMode, cron_secret: Option<&str>) -> AppConfig {
    AppConfig {
        server_port: 0,
        mode,
        database_url: None,
        destination: DestinationConfig::Supabase {
            base_url: "http://127.0.0.1:1".to_string(),
            service_key: "unused".to_string(),
            bucket: "recordings".to_string(),
        },
        cron_secret: cron_secret.map(str::to_string),
        cron_schedule: None,
        download_timeout: Duration::from_secs(5),
        signed_url_ttl: Duration::from_secs(31_536_000),
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub jobs: Arc<MemoryJobStore>,
    pub destination: Arc<StubDestination>,
}

impl TestApp {
    pub fn queued(cron_secret: Option<&str>) -> Self {
        Self::build(TransferMode::Queued, cron_secret, StubDestination::default())
    }

    pub fn direct() -> Self {
        Self::build(TransferMode::Direct, None, StubDestination::default())
    }

    pub fn build(mode: TransferMode, cron_secret: Option<&str>, destination: StubDestination) -> Self {
        let jobs = Arc::new(MemoryJobStore::default());
        let destination = Arc::new(destination);

        let store: Option<Arc<dyn JobStore>> = match mode {
            TransferMode::Queued => Some(jobs.clone() as Arc<dyn JobStore>),
            TransferMode::Direct => None,
        };

        let state = AppState::new(
            config(mode, cron_secret),
            store,
            destination.clone(),
            SourceClient::new(Duration::from_secs(5)).unwrap(),
        );

        Self {
            router: create_app(state.clone()),
            state,
            jobs,
            destination,
        }
    }

    pub async fn request(&self, method: &str, path: &str, body: Option<&str>, auth: Option<&str>) -> TestResponse {
        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(auth) = auth {
            req = req.header("Authorization", auth);
        }

        let req = req
            .body(Body::from(body.unwrap_or_default().to_string()))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    pub async fn submit(&self, source_url: &str, meeting_name: &str) -> TestResponse {
        let body = serde_json::json!({ "source_url": source_url, "meeting_name": meeting_name }).to_string();
        self.request("POST", "/api/transfer", Some(&body), None).await
    }

    pub async fn trigger(&self) -> TestResponse {
        self.request("GET", "/api/cron/process", None, None).await
    }
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}
