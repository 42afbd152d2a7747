use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKey {
    ServerPort,
    TransferMode,
    DatabaseUrl,
    Destination,
    SupabaseProjectId,
    SupabaseUrl,
    SupabaseServiceKey,
    SupabaseBucket,
    S3Endpoint,
    S3Region,
    S3Bucket,
    S3AccessKey,
    S3SecretKey,
    DriveServiceAccount,
    DriveFolderId,
    CronSecret,
    CronSchedule,
    DownloadTimeoutSecs,
    SignedUrlTtlSecs,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::TransferMode => "TRANSFER_MODE",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::Destination => "DESTINATION",
            EnvKey::SupabaseProjectId => "SUPABASE_PROJECT_ID",
            EnvKey::SupabaseUrl => "SUPABASE_URL",
            EnvKey::SupabaseServiceKey => "SUPABASE_SERVICE_KEY",
            EnvKey::SupabaseBucket => "SUPABASE_BUCKET",
            EnvKey::S3Endpoint => "S3_ENDPOINT",
            EnvKey::S3Region => "S3_REGION",
            EnvKey::S3Bucket => "S3_BUCKET",
            EnvKey::S3AccessKey => "S3_ACCESS_KEY_ID",
            EnvKey::S3SecretKey => "S3_SECRET_ACCESS_KEY",
            EnvKey::DriveServiceAccount => "DRIVE_SERVICE_ACCOUNT_JSON",
            EnvKey::DriveFolderId => "DRIVE_FOLDER_ID",
            EnvKey::CronSecret => "CRON_SECRET",
            EnvKey::CronSchedule => "CRON_SCHEDULE",
            EnvKey::DownloadTimeoutSecs => "DOWNLOAD_TIMEOUT_SECS",
            EnvKey::SignedUrlTtlSecs => "SIGNED_URL_TTL_SECS",
        }
    }
}

/// Reads variables through a lookup function so settings can be built from
/// the process environment or from a fixed map.
pub struct EnvSource<F> {
    lookup: F,
}

impl EnvSource<fn(&str) -> Option<String>> {
    pub fn process() -> Self {
        Self {
            lookup: |key| env::var(key).ok(),
        }
    }
}

impl<F> EnvSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    /// Blank values count as unset.
    pub fn get(&self, key: EnvKey) -> Option<String> {
        (self.lookup)(key.as_str())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn get_or(&self, key: EnvKey, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_parsed<T: FromStr>(&self, key: EnvKey, default: T) -> Result<T, String> {
        match self.get(key) {
            Some(val) => val.parse::<T>().map_err(|_| val),
            None => Ok(default),
        }
    }
}
