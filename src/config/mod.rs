use crate::error::DocumentError;
use std::env;
use std::time::Duration;

pub const BASE_URL_VAR: &str = "DOCUMENT_SERVICE_BASE_URL";
pub const API_SECRET_VAR: &str = "DOCUMENT_SERVICE_API_SECRET";

/// Deadline applied to each remote operation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub save_content: Duration,
    pub get_content: Duration,
    pub get_metadata: Duration,
    pub get_token: Duration,
    pub duplicate: Duration,
    pub confirm_upload: Duration,
    pub post_processing: Duration,
    pub declare_deleted: Duration,
    pub get_progress: Duration,
    pub change_metadata: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            save_content: Duration::from_secs(20),
            get_content: Duration::from_secs(20),
            get_metadata: Duration::from_secs(5),
            get_token: Duration::from_secs(5),
            duplicate: Duration::from_secs(20),
            confirm_upload: Duration::from_secs(5),
            post_processing: Duration::from_secs(60),
            declare_deleted: Duration::from_secs(2),
            get_progress: Duration::from_secs(2),
            change_metadata: Duration::from_secs(2),
        }
    }
}

impl Timeouts {
    /// Same deadline everywhere; handy for tests against a local mock.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            save_content: timeout,
            get_content: timeout,
            get_metadata: timeout,
            get_token: timeout,
            duplicate: timeout,
            confirm_upload: timeout,
            post_processing: timeout,
            declare_deleted: timeout,
            get_progress: timeout,
            change_metadata: timeout,
        }
    }
}

/// Connection settings for the document service. Built once at startup and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct DocumentServiceConfig {
    /// Always ends with `/`.
    pub base_url: String,
    /// Sent as `X-Api-Key` on authenticated calls.
    pub api_shared_secret: String,
    pub timeouts: Timeouts,
}

impl DocumentServiceConfig {
    pub fn new(
        base_url: &str,
        api_shared_secret: impl Into<String>,
    ) -> Result<Self, DocumentError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            api_shared_secret: api_shared_secret.into(),
            timeouts: Timeouts::default(),
        })
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, DocumentError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DocumentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(BASE_URL_VAR)
            .ok_or_else(|| DocumentError::Config(format!("{} must be set", BASE_URL_VAR)))?;
        let api_shared_secret = lookup(API_SECRET_VAR)
            .ok_or_else(|| DocumentError::Config(format!("{} must be set", API_SECRET_VAR)))?;

        let default = Timeouts::default();
        let secs = |name: &str, fallback: Duration| {
            lookup(&format!("DOCUMENT_SERVICE_{}_TIMEOUT", name))
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        let timeouts = Timeouts {
            save_content: secs("SAVE_CONTENT", default.save_content),
            get_content: secs("GET_CONTENT", default.get_content),
            get_metadata: secs("GET_METADATA", default.get_metadata),
            get_token: secs("GET_TOKEN", default.get_token),
            duplicate: secs("DUPLICATE", default.duplicate),
            confirm_upload: secs("CONFIRM_UPLOAD", default.confirm_upload),
            post_processing: secs("POST_PROCESSING", default.post_processing),
            declare_deleted: secs("DECLARE_DELETED", default.declare_deleted),
            get_progress: secs("GET_PROGRESS", default.get_progress),
            change_metadata: secs("CHANGE_METADATA", default.change_metadata),
        };

        Ok(Self::new(&base_url, api_shared_secret)?.with_timeouts(timeouts))
    }
}

fn normalize_base_url(raw: &str) -> Result<String, DocumentError> {
    let trimmed = raw.trim();
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| DocumentError::Config(format!("invalid base URL '{}': {}", trimmed, e)))?;
    if parsed.cannot_be_a_base() {
        return Err(DocumentError::Config(format!(
            "base URL '{}' cannot carry a path",
            trimmed
        )));
    }

    let mut base = parsed.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(base)
}
