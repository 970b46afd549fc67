use crate::config::DocumentServiceConfig;
use crate::error::DocumentError;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, RequestBuilder};

pub mod content;
pub mod delete;
pub mod metadata;
pub mod post_processing;
pub mod tokens;
pub mod types;
pub mod upload;

pub use types::{
    BatchTokens, ConfirmUpload, PostProcessingLaunch, PostProcessingProgress, TokenKind,
    TokenOutcome, TokenRequest,
};

pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Characters left as-is when a token or id is placed in a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b':');

/// HTTP client for the remote document service.
///
/// Holds no per-document state: every method is a single request under the
/// deadline configured for its operation family.
pub struct DocumentClient {
    config: DocumentServiceConfig,
    http: Client,
}

impl DocumentClient {
    pub fn new(config: DocumentServiceConfig) -> Result<Self, DocumentError> {
        let http = Client::builder()
            .build()
            .map_err(|e| DocumentError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_http_client(config, http))
    }

    /// Reuse an existing connection pool.
    pub fn with_http_client(config: DocumentServiceConfig, http: Client) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &DocumentServiceConfig {
        &self.config
    }

    /// Public download URL of a file, given a read token.
    pub fn file_url(&self, token: &str) -> String {
        self.url(&format!("file/{}", segment(token)))
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    pub(crate) fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(API_KEY_HEADER, &self.config.api_shared_secret)
    }
}

pub(crate) fn segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}
