use anyhow::{Context, Result, bail};
use tracing::info;

use crate::common::filename::{self, VIDEO_CONTENT_TYPE};
use crate::infrastructure::source::SourceClient;
use crate::infrastructure::storage::Destination;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub filename: String,
    pub url: String,
}

/// Download the source, store it under a generated name and return the
/// shareable link. Nothing is retried and a partial upload is left as is.
pub async fn run(
    source: &SourceClient,
    destination: &dyn Destination,
    source_url: &str,
    meeting_name: &str,
) -> Result<TransferOutcome> {
    let data = source.fetch(source_url).await?;

    let filename = filename::generate(meeting_name);

    let url = destination
        .publish(&filename, VIDEO_CONTENT_TYPE, data)
        .await
        .with_context(|| format!("Failed to store {} in {}", filename, destination.name()))?;

    if url.trim().is_empty() {
        bail!("{} returned an empty link for {}", destination.name(), filename);
    }

    info!("✅ Stored {} in {}", filename, destination.name());
    Ok(TransferOutcome { filename, url })
}
