use crate::models::{ExpirationPolicy, FilterSource, PostProcessingType, RelatedModel};
use serde_json::{Map, Value, json};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenKind {
    #[default]
    Read,
    Write,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Read => "read",
            TokenKind::Write => "write",
        }
    }
}

/// Scope of the access token(s) being requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenRequest {
    pub kind: TokenKind,
    /// Ask for the output of this post-processing instead of the original file.
    pub wanted_post_process: Option<PostProcessingType>,
    /// Validity period in seconds; the service default applies when unset.
    pub custom_ttl: Option<u64>,
    pub for_modified_upload: bool,
}

impl TokenRequest {
    pub fn read() -> Self {
        Self::default()
    }

    pub fn write() -> Self {
        Self {
            kind: TokenKind::Write,
            ..Self::default()
        }
    }

    pub fn post_processed(mut self, kind: PostProcessingType) -> Self {
        self.wanted_post_process = Some(kind);
        self
    }

    pub fn ttl(mut self, seconds: u64) -> Self {
        self.custom_ttl = Some(seconds);
        self
    }

    pub fn modified_upload(mut self) -> Self {
        self.for_modified_upload = true;
        self
    }
}

/// Result of a single token issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome {
    Token(String),
    /// The service does not know this upload (404).
    UploadInvalid,
    /// The virus scan rejected the file.
    FileInfected,
    /// Malformed id or an unusable answer from the service.
    NotFound,
}

impl TokenOutcome {
    pub fn token(&self) -> Option<&str> {
        match self {
            TokenOutcome::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn into_token(self) -> Option<String> {
        match self {
            TokenOutcome::Token(token) => Some(token),
            _ => None,
        }
    }
}

/// Result of a batch read-token issuance.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchTokens {
    /// id → token, only for the ids that succeeded.
    Issued(HashMap<String, String>),
    /// Mixed success (206 or 500): the service answer, untouched, for the
    /// caller to inspect entry by entry.
    Partial(Value),
}

impl BatchTokens {
    pub fn issued(&self) -> Option<&HashMap<String, String>> {
        match self {
            BatchTokens::Issued(tokens) => Some(tokens),
            BatchTokens::Partial(_) => None,
        }
    }
}

/// Options for turning a write token into a stable upload id.
#[derive(Default)]
pub struct ConfirmUpload<'a> {
    /// Explicit destination; wins over `related_model`.
    pub upload_to: Option<String>,
    pub related_model: Option<RelatedModel>,
    pub instance: Option<&'a dyn FilterSource>,
    pub expiration_policy: ExpirationPolicy,
    pub metadata: Option<Map<String, Value>>,
}

impl<'a> ConfirmUpload<'a> {
    pub fn to_path(path: impl Into<String>) -> Self {
        Self {
            upload_to: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn for_related_model(related_model: RelatedModel) -> Self {
        Self {
            related_model: Some(related_model),
            ..Self::default()
        }
    }

    pub fn with_instance(mut self, instance: &'a dyn FilterSource) -> Self {
        self.instance = Some(instance);
        self
    }

    pub fn expiring(mut self, policy: ExpirationPolicy) -> Self {
        self.expiration_policy = policy;
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub(crate) fn payload(&self) -> Value {
        let mut data = Map::new();
        if let Some(upload_to) = self.upload_to.as_deref().filter(|p| !p.is_empty()) {
            data.insert("upload_to".into(), json!(upload_to));
        } else if let Some(related_model) = &self.related_model {
            data.insert(
                "related_model".into(),
                json!(related_model.resolve(self.instance)),
            );
        }
        data.insert(
            "document_expiration_policy".into(),
            json!(self.expiration_policy),
        );
        if let Some(metadata) = &self.metadata {
            data.insert("metadata".into(), Value::Object(metadata.clone()));
        }
        Value::Object(data)
    }
}

/// What launching a post-processing returns.
#[derive(Debug)]
pub enum PostProcessingLaunch {
    /// Synchronous run: the finished result.
    Completed(Value),
    /// Asynchronous run: the service acknowledgement, to be followed by
    /// progress polling.
    Pending(reqwest::Response),
}

/// One progress poll of an asynchronous post-processing.
#[derive(Debug, Clone, PartialEq)]
pub enum PostProcessingProgress {
    Percent(u8),
    Failed(Value),
    /// A shape this client does not interpret.
    Payload(Value),
}

impl PostProcessingProgress {
    pub fn from_value(value: Value) -> Self {
        let percent = match &value {
            Value::Number(n) => n.as_f64(),
            Value::Object(map) => map.get("progress").and_then(Value::as_f64),
            _ => None,
        };
        if let Some(percent) = percent {
            return PostProcessingProgress::Percent(percent.clamp(0.0, 100.0) as u8);
        }
        if value.get("error").is_some() || value.get("failed") == Some(&Value::Bool(true)) {
            return PostProcessingProgress::Failed(value);
        }
        PostProcessingProgress::Payload(value)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PostProcessingProgress::Percent(100) | PostProcessingProgress::Failed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins_over_related_model() {
        let mut confirm = ConfirmUpload::to_path("path");
        confirm.related_model = Some(RelatedModel::new("a", "B", "c"));
        assert_eq!(
            confirm.payload(),
            json!({"upload_to": "path", "document_expiration_policy": "NO_EXPIRATION"})
        );
    }

    #[test]
    fn test_related_model_payload_with_instance() {
        let instance = json!({"uuid": "1234"});
        let confirm = ConfirmUpload::for_related_model(
            RelatedModel::new("admission", "Admission", "documents")
                .with_instance_filter_fields(["uuid"]),
        )
        .with_instance(&instance)
        .expiring(ExpirationPolicy::ExportExpirationPolicy);

        assert_eq!(
            confirm.payload(),
            json!({
                "related_model": {
                    "app": "admission",
                    "model": "Admission",
                    "field": "documents",
                    "instance_filters": {"uuid": "1234"}
                },
                "document_expiration_policy": "EXPORT_EXPIRATION_POLICY"
            })
        );
    }

    #[test]
    fn test_metadata_overrides_are_sent() {
        let mut metadata = Map::new();
        metadata.insert("name".into(), json!("renamed.pdf"));
        let payload = ConfirmUpload::default().with_metadata(metadata).payload();
        assert_eq!(payload["metadata"], json!({"name": "renamed.pdf"}));
        assert!(payload.get("upload_to").is_none());
    }

    #[test]
    fn test_progress_shapes() {
        assert_eq!(
            PostProcessingProgress::from_value(json!(42)),
            PostProcessingProgress::Percent(42)
        );
        assert!(PostProcessingProgress::from_value(json!({"progress": 100})).is_terminal());
        assert!(PostProcessingProgress::from_value(json!({"error": "boom"})).is_terminal());
        assert!(!PostProcessingProgress::from_value(json!({"state": "queued"})).is_terminal());
        assert_eq!(
            PostProcessingProgress::from_value(json!(250)),
            PostProcessingProgress::Percent(100)
        );
    }

    #[test]
    fn test_token_request_builder() {
        let request = TokenRequest::write()
            .post_processed(PostProcessingType::Convert)
            .ttl(60)
            .modified_upload();
        assert_eq!(request.kind.as_str(), "write");
        assert_eq!(request.custom_ttl, Some(60));
        assert!(request.for_modified_upload);
    }
}
