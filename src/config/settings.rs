use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::config::env::{EnvKey, EnvSource};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferMode {
    /// Submissions are persisted and processed by the trigger.
    Queued,
    /// Submissions are transferred synchronously, nothing is persisted.
    Direct,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DestinationConfig {
    Supabase {
        base_url: String,
        service_key: String,
        bucket: String,
    },
    S3 {
        endpoint: String,
        region: String,
        bucket: String,
        access_key: String,
        secret_key: String,
    },
    Drive {
        service_account_json: String,
        folder_id: String,
    },
}

impl DestinationConfig {
    pub fn name(&self) -> &'static str {
        match self {
            DestinationConfig::Supabase { .. } => "supabase",
            DestinationConfig::S3 { .. } => "s3",
            DestinationConfig::Drive { .. } => "drive",
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub mode: TransferMode,
    pub database_url: Option<String>,
    pub destination: DestinationConfig,
    pub cron_secret: Option<String>,
    pub cron_schedule: Option<cron::Schedule>,
    pub download_timeout: Duration,
    pub signed_url_ttl: Duration,
}

pub const DEFAULT_SUPABASE_BUCKET: &str = "meeting-recordings";
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 365 * 24 * 60 * 60;

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_source(&EnvSource::process())
    }

    pub fn from_source<F>(env: &EnvSource<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match env.get_or(EnvKey::TransferMode, "queued").to_lowercase().as_str() {
            "queued" => TransferMode::Queued,
            "direct" => TransferMode::Direct,
            other => return Err(invalid(EnvKey::TransferMode, other)),
        };

        let database_url = env.get(EnvKey::DatabaseUrl);
        if mode == TransferMode::Queued && database_url.is_none() {
            return Err(ConfigError::Missing(EnvKey::DatabaseUrl.as_str()));
        }

        let cron_schedule = env
            .get(EnvKey::CronSchedule)
            .map(|expr| cron::Schedule::from_str(&expr).map_err(|_| invalid(EnvKey::CronSchedule, &expr)))
            .transpose()?;

        Ok(Self {
            server_port: parsed(env, EnvKey::ServerPort, 3000)?,
            mode,
            database_url,
            destination: Self::destination(env)?,
            cron_secret: env.get(EnvKey::CronSecret),
            cron_schedule,
            download_timeout: Duration::from_secs(parsed(
                env,
                EnvKey::DownloadTimeoutSecs,
                DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            )?),
            signed_url_ttl: Duration::from_secs(parsed(
                env,
                EnvKey::SignedUrlTtlSecs,
                DEFAULT_SIGNED_URL_TTL_SECS,
            )?),
        })
    }

    fn destination<F>(env: &EnvSource<F>) -> Result<DestinationConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match env.get_or(EnvKey::Destination, "supabase").to_lowercase().as_str() {
            "supabase" => {
                let base_url = match env.get(EnvKey::SupabaseUrl) {
                    Some(url) => url.trim_end_matches('/').to_string(),
                    None => format!("https://{}.supabase.co", required(env, EnvKey::SupabaseProjectId)?),
                };

                Ok(DestinationConfig::Supabase {
                    base_url,
                    service_key: required(env, EnvKey::SupabaseServiceKey)?,
                    bucket: env.get_or(EnvKey::SupabaseBucket, DEFAULT_SUPABASE_BUCKET),
                })
            }
            "s3" => Ok(DestinationConfig::S3 {
                endpoint: required(env, EnvKey::S3Endpoint)?,
                region: env.get_or(EnvKey::S3Region, "us-east-1"),
                bucket: required(env, EnvKey::S3Bucket)?,
                access_key: required(env, EnvKey::S3AccessKey)?,
                secret_key: required(env, EnvKey::S3SecretKey)?,
            }),
            "drive" => Ok(DestinationConfig::Drive {
                service_account_json: required(env, EnvKey::DriveServiceAccount)?,
                folder_id: required(env, EnvKey::DriveFolderId)?,
            }),
            other => Err(invalid(EnvKey::Destination, other)),
        }
    }
}

fn required<F>(env: &EnvSource<F>, key: EnvKey) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    env.get(key).ok_or(ConfigError::Missing(key.as_str()))
}

fn parsed<F, T>(env: &EnvSource<F>, key: EnvKey, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    env.get_parsed(key, default).map_err(|value| invalid(key, &value))
}

fn invalid(key: EnvKey, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.as_str(),
        value: value.to_string(),
    }
}
