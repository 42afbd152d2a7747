use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::info;

use super::{Destination, StorageError, StorageResult, error_text};

/// Supabase Storage over its REST API, authenticated with the service key.
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
    signed_url_ttl: Duration,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl SupabaseStorage {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        service_key: &str,
        bucket: &str,
        signed_url_ttl: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            bucket: bucket.to_string(),
            signed_url_ttl,
        }
    }

    fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
    }

    async fn upload(&self, path: &str, content_type: &str, data: Bytes) -> StorageResult<()> {
        let url = self.storage_url(&format!("/object/{}/{}", self.bucket, path));

        let response = self
            .authorized(self.client.post(&url))
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::UploadFailed(error_text(response).await));
        }

        Ok(())
    }

    async fn create_signed_url(&self, path: &str) -> StorageResult<String> {
        let url = self.storage_url(&format!("/object/sign/{}/{}", self.bucket, path));

        let response = self
            .authorized(self.client.post(&url))
            .json(&json!({ "expiresIn": self.signed_url_ttl.as_secs() }))
            .send()
            .await
            .map_err(|e| StorageError::ShareFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::ShareFailed(error_text(response).await));
        }

        let signed: SignedUrlResponse = response
            .json()
            .await
            .map_err(|e| StorageError::ShareFailed(e.to_string()))?;

        Ok(self.resolve_signed_url(&signed.signed_url))
    }

    /// The API answers with a path relative to `/storage/v1`.
    fn resolve_signed_url(&self, signed: &str) -> String {
        if signed.starts_with("http://") || signed.starts_with("https://") {
            return signed.to_string();
        }

        if signed.starts_with('/') {
            self.storage_url(signed)
        } else {
            self.storage_url(&format!("/{}", signed))
        }
    }
}

#[async_trait]
impl Destination for SupabaseStorage {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn publish(&self, filename: &str, content_type: &str, data: Bytes) -> StorageResult<String> {
        info!("⬆️ Uploading {} ({} bytes) to bucket {}", filename, data.len(), self.bucket);
        self.upload(filename, content_type, data).await?;
        self.create_signed_url(filename).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn storage(base_url: &str) -> SupabaseStorage {
        SupabaseStorage::new(
            reqwest::Client::new(),
            base_url,
            "service-key",
            "recordings",
            Duration::from_secs(31_536_000),
        )
    }

    #[tokio::test]
    async fn uploads_then_signs_for_a_year() {
        let mut server = mockito::Server::new_async().await;

        let upload = server
            .mock("POST", "/storage/v1/object/recordings/team_sync.mp4")
            .match_header("authorization", "Bearer service-key")
            .match_header("apikey", "service-key")
            .match_header("content-type", "video/mp4")
            .match_body("video-bytes")
            .with_status(200)
            .with_body(r#"{"Key":"recordings/team_sync.mp4"}"#)
            .create_async()
            .await;

        let sign = server
            .mock("POST", "/storage/v1/object/sign/recordings/team_sync.mp4")
            .match_body(Matcher::Json(json!({ "expiresIn": 31_536_000 })))
            .with_status(200)
            .with_body(r#"{"signedURL":"/object/sign/recordings/team_sync.mp4?token=abc"}"#)
            .create_async()
            .await;

        let url = storage(&server.url())
            .publish("team_sync.mp4", "video/mp4", Bytes::from_static(b"video-bytes"))
            .await
            .unwrap();

        assert_eq!(
            url,
            format!("{}/storage/v1/object/sign/recordings/team_sync.mp4?token=abc", server.url())
        );
        upload.assert_async().await;
        sign.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_upload_reports_vendor_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/storage/v1/object/recordings/dup.mp4")
            .with_status(409)
            .with_body(r#"{"error":"Duplicate"}"#)
            .create_async()
            .await;
        let sign = server
            .mock("POST", "/storage/v1/object/sign/recordings/dup.mp4")
            .expect(0)
            .create_async()
            .await;

        let err = storage(&server.url())
            .publish("dup.mp4", "video/mp4", Bytes::from_static(b"x"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::UploadFailed(ref msg) if msg.contains("409") && msg.contains("Duplicate")));
        sign.assert_async().await;
    }

    #[test]
    fn absolute_signed_urls_pass_through() {
        let storage = storage("https://proj.supabase.co/");
        assert_eq!(
            storage.resolve_signed_url("https://cdn.example.com/x?token=1"),
            "https://cdn.example.com/x?token=1"
        );
        assert_eq!(
            storage.resolve_signed_url("object/sign/b/x?token=1"),
            "https://proj.supabase.co/storage/v1/object/sign/b/x?token=1"
        );
    }
}
