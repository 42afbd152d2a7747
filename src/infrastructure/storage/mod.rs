//! Destinations that receive a finished transfer and hand back a link to it.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::config::settings::{AppConfig, DestinationConfig};

pub mod drive;
pub mod s3;
pub mod supabase;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Could not create share link: {0}")]
    ShareFailed(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A store that can take a video and return a URL anyone holding it can read.
#[async_trait]
pub trait Destination: Send + Sync {
    fn name(&self) -> &'static str;

    /// Upload `data` under `filename` and return its shareable URL.
    async fn publish(&self, filename: &str, content_type: &str, data: Bytes) -> StorageResult<String>;
}

pub fn build(config: &AppConfig) -> anyhow::Result<Arc<dyn Destination>> {
    let destination: Arc<dyn Destination> = match &config.destination {
        DestinationConfig::Supabase {
            base_url,
            service_key,
            bucket,
        } => Arc::new(supabase::SupabaseStorage::new(
            http_client(config)?,
            base_url,
            service_key,
            bucket,
            config.signed_url_ttl,
        )),
        DestinationConfig::S3 {
            endpoint,
            region,
            bucket,
            access_key,
            secret_key,
        } => Arc::new(s3::S3Storage::new(
            endpoint,
            region,
            bucket,
            access_key,
            secret_key,
            config.signed_url_ttl,
        )),
        DestinationConfig::Drive {
            service_account_json,
            folder_id,
        } => Arc::new(drive::DriveStorage::new(
            http_client(config)?,
            service_account_json,
            folder_id,
        )?),
    };

    tracing::info!("✅ Destination store: {}", destination.name());
    Ok(destination)
}

fn http_client(config: &AppConfig) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.download_timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Turns a non-2xx response into the message the vendor API sent back.
pub(crate) async fn error_text(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) if !body.trim().is_empty() => format!("{}: {}", status, body.trim()),
        _ => status.to_string(),
    }
}
