use crate::utils::validation::ValidationError;
use std::time::Duration;
use thiserror::Error;

/// Status and body of a response the service refused.
#[derive(Debug, Clone)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
}

impl std::fmt::Display for RemoteResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "status {}: {}", self.status, self.body)
    }
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("{operation} could not reach the document service: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Remote save of raw content was refused ({0})")]
    SaveRawContent(RemoteResponse),

    #[error("{operation} failed with {response}")]
    UnexpectedStatus {
        operation: &'static str,
        response: RemoteResponse,
    },

    #[error("{operation} returned an invalid response: {reason}")]
    InvalidResponse {
        operation: &'static str,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DocumentError {
    /// Only a missed deadline is worth retrying; everything else is a
    /// request-shape or service-state problem.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DocumentError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, DocumentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_timeout_is_retryable() {
        let timeout = DocumentError::Timeout {
            operation: "get_token",
            timeout: Duration::from_secs(5),
        };
        assert!(timeout.is_retryable());

        let refused = DocumentError::SaveRawContent(RemoteResponse {
            status: 400,
            body: "bad file".to_string(),
        });
        assert!(!refused.is_retryable());
        assert_eq!(
            refused.to_string(),
            "Remote save of raw content was refused (status 400: bad file)"
        );
    }
}
