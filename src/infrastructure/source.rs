use anyhow::{Context, Result};
use bytes::Bytes;
use std::time::Duration;
use tracing::info;

/// Downloads source videos. One client is shared by every request.
#[derive(Clone)]
pub struct SourceClient {
    client: reqwest::Client,
}

impl SourceClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// Fetches the whole body. Any non-2xx status is an error.
    pub async fn fetch(&self, url: &str) -> Result<Bytes> {
        info!("⬇️ Downloading source video from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to download {}", url))?
            .error_for_status()
            .context("Source download was rejected")?;

        let body = response
            .bytes()
            .await
            .context("Failed to read source body")?;

        info!("⬇️ Downloaded {} bytes", body.len());
        Ok(body)
    }
}
