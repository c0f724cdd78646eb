//! Configuration management for the server.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default upload body limit (20 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Default idle time before an editing session is dropped (one hour).
const DEFAULT_SESSION_IDLE_SECS: u64 = 60 * 60;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Bearer token required on API calls when set
    pub auth_secret: Option<String>,
    /// Directory holding the media buckets
    pub storage_dir: PathBuf,
    /// Bucket media files are written to
    pub storage_bucket: String,
    /// Origin used to build public object URLs
    pub public_base_url: String,
    /// Largest accepted upload request
    pub max_upload_bytes: usize,
    /// Editing sessions untouched for this long are discarded
    pub session_idle: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        let auth_secret = env::var("AUTH_SECRET").ok().filter(|s| !s.is_empty());

        let storage_dir = env::var("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./storage"));

        let storage_bucket =
            env::var("STORAGE_BUCKET").unwrap_or_else(|_| "property-media".to_string());
        if storage_bucket.is_empty() || storage_bucket.contains(['/', '\\']) {
            return Err(ConfigError::InvalidBucket(storage_bucket));
        }

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let max_upload_bytes = match env::var("MAX_UPLOAD_BYTES") {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidUploadLimit(value))?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let session_idle_secs = match env::var("SESSION_IDLE_SECS") {
            Ok(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => return Err(ConfigError::InvalidSessionIdle(value)),
            },
            Err(_) => DEFAULT_SESSION_IDLE_SECS,
        };

        Ok(Self {
            host,
            port,
            database_url,
            auth_secret,
            storage_dir,
            storage_bucket,
            public_base_url,
            max_upload_bytes,
            session_idle: Duration::from_secs(session_idle_secs),
        })
    }

    /// Directory backing the media bucket.
    pub fn bucket_dir(&self) -> PathBuf {
        self.storage_dir.join(&self.storage_bucket)
    }

    /// Route prefix public object URLs are served under.
    pub fn public_object_route(&self) -> String {
        format!(
            "{}{}",
            casa_engine::storage::PUBLIC_OBJECT_MARKER,
            self.storage_bucket
        )
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL environment variable is required")]
    MissingDatabaseUrl,

    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid STORAGE_BUCKET value: {0:?}")]
    InvalidBucket(String),

    #[error("Invalid MAX_UPLOAD_BYTES value: {0}")]
    InvalidUploadLimit(String),

    #[error("Invalid SESSION_IDLE_SECS value: {0}")]
    InvalidSessionIdle(String),
}

#[cfg(test)]
impl Config {
    /// Configuration for route tests. Nothing here touches the network.
    pub fn for_tests(storage_dir: PathBuf) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "postgres://localhost/casa_test".to_string(),
            auth_secret: None,
            storage_dir,
            storage_bucket: "property-media".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_idle: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
        }
    }
}
