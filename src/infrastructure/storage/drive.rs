use async_trait::async_trait;
use bytes::Bytes;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode, get_current_timestamp};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::{Destination, StorageError, StorageResult, error_text};

const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";
const GOOGLE_API_BASE: &str = "https://www.googleapis.com";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;

/// The fields of a Google service-account key file that the token exchange needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    web_view_link: Option<String>,
}

/// Google Drive folder, shared through an "anyone with the link" grant.
pub struct DriveStorage {
    client: reqwest::Client,
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    folder_id: String,
    api_base: String,
}

impl DriveStorage {
    pub fn new(client: reqwest::Client, service_account_json: &str, folder_id: &str) -> StorageResult<Self> {
        let key: ServiceAccountKey = serde_json::from_str(service_account_json)
            .map_err(|e| StorageError::ConfigError(format!("invalid service account JSON: {}", e)))?;

        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| StorageError::ConfigError(format!("invalid service account private key: {}", e)))?;

        Ok(Self {
            client,
            key,
            signing_key,
            folder_id: folder_id.to_string(),
            api_base: GOOGLE_API_BASE.to_string(),
        })
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn assertion(&self) -> StorageResult<String> {
        let now = get_current_timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: DRIVE_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| StorageError::AuthFailed(e.to_string()))
    }

    async fn access_token(&self) -> StorageResult<String> {
        let assertion = self.assertion()?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| StorageError::AuthFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::AuthFailed(error_text(response).await));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StorageError::AuthFailed(e.to_string()))?;

        Ok(token.access_token)
    }

    /// Opens a resumable session, then sends the whole body in one request.
    async fn upload(&self, token: &str, filename: &str, content_type: &str, data: Bytes) -> StorageResult<DriveFile> {
        let session = self
            .client
            .post(format!(
                "{}/upload/drive/v3/files?uploadType=resumable&supportsAllDrives=true&fields=id,webViewLink",
                self.api_base
            ))
            .bearer_auth(token)
            .header("X-Upload-Content-Type", content_type)
            .header("X-Upload-Content-Length", data.len().to_string())
            .json(&json!({
                "name": filename,
                "mimeType": content_type,
                "parents": [self.folder_id],
            }))
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        if !session.status().is_success() {
            return Err(StorageError::UploadFailed(error_text(session).await));
        }

        let location = session
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| StorageError::UploadFailed("resumable session returned no location".to_string()))?;

        let response = self
            .client
            .put(&location)
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::UploadFailed(error_text(response).await));
        }

        response
            .json()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))
    }

    async fn share_with_anyone(&self, token: &str, file_id: &str) -> StorageResult<()> {
        let response = self
            .client
            .post(format!(
                "{}/drive/v3/files/{}/permissions?supportsAllDrives=true",
                self.api_base, file_id
            ))
            .bearer_auth(token)
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(|e| StorageError::ShareFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::ShareFailed(error_text(response).await));
        }

        Ok(())
    }
}

#[async_trait]
impl Destination for DriveStorage {
    fn name(&self) -> &'static str {
        "drive"
    }

    async fn publish(&self, filename: &str, content_type: &str, data: Bytes) -> StorageResult<String> {
        let token = self.access_token().await?;

        info!("⬆️ Uploading {} ({} bytes) to drive folder {}", filename, data.len(), self.folder_id);
        let file = self.upload(&token, filename, content_type, data).await?;

        self.share_with_anyone(&token, &file.id).await?;

        Ok(file
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view", file.id)))
    }
}
