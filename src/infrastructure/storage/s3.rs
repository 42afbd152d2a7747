use async_trait::async_trait;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{Client, config::BehaviorVersion, config::Credentials, config::Region};
use bytes::Bytes;
use std::time::Duration;
use tracing::info;

use super::{Destination, StorageError, StorageResult};

/// SigV4 refuses presigned URLs that live longer than a week.
pub const MAX_PRESIGN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    signed_url_ttl: Duration,
}

impl S3Storage {
    pub fn new(
        endpoint: &str,
        region: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        signed_url_ttl: Duration,
    ) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");

        let config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO
            .build();

        let client = Client::from_conf(config);

        info!("✅ S3 client ready for bucket {}", bucket);

        Self {
            client,
            bucket: bucket.to_string(),
            signed_url_ttl: presign_ttl(signed_url_ttl),
        }
    }

    async fn put_object(&self, key: &str, content_type: &str, data: Bytes) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(aws_sdk_s3::Error::from(e).to_string()))?;

        Ok(())
    }

    async fn presigned_get(&self, key: &str) -> StorageResult<String> {
        let presigning = PresigningConfig::expires_in(self.signed_url_ttl)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::ShareFailed(aws_sdk_s3::Error::from(e).to_string()))?;

        Ok(request.uri().to_string())
    }
}

#[async_trait]
impl Destination for S3Storage {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn publish(&self, filename: &str, content_type: &str, data: Bytes) -> StorageResult<String> {
        info!("⬆️ Uploading {} ({} bytes) to s3://{}", filename, data.len(), self.bucket);
        self.put_object(filename, content_type, data).await?;
        self.presigned_get(filename).await
    }
}

pub fn presign_ttl(requested: Duration) -> Duration {
    requested.min(MAX_PRESIGN_TTL)
}
