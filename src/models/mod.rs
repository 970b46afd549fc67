use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Description of a stored file as reported by the document service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mimetype: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    /// Whatever else the service attaches (hash, upload date, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Server-side retention of a confirmed document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpirationPolicy {
    #[default]
    NoExpiration,
    ExportExpirationPolicy,
}

impl std::str::FromStr for ExpirationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "NO_EXPIRATION" => Ok(ExpirationPolicy::NoExpiration),
            "EXPORT_EXPIRATION_POLICY" | "EXPORT" => Ok(ExpirationPolicy::ExportExpirationPolicy),
            other => Err(format!("unknown expiration policy '{}'", other)),
        }
    }
}

/// Kinds of server-side post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostProcessingType {
    Convert,
    Merge,
}

impl PostProcessingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostProcessingType::Convert => "CONVERT",
            PostProcessingType::Merge => "MERGE",
        }
    }
}

impl std::str::FromStr for PostProcessingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CONVERT" => Ok(PostProcessingType::Convert),
            "MERGE" => Ok(PostProcessingType::Merge),
            other => Err(format!("unknown post-processing type '{}'", other)),
        }
    }
}

/// Parameters for one post-processing kind, e.g. `{"output_filename": "merged"}`.
pub type PostProcessParams = HashMap<PostProcessingType, HashMap<String, String>>;

/// Lets the document service compute the storage path itself from the model
/// that will own the upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelatedModel {
    pub app: String,
    pub model: String,
    pub field: String,
    /// Fields read off the owning instance at confirmation time.
    pub instance_filter_fields: Vec<String>,
}

/// Wire form of [`RelatedModel`], with the filter fields resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedModelPayload {
    pub app: String,
    pub model: String,
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_filters: Option<Map<String, Value>>,
}

impl RelatedModel {
    pub fn new(app: impl Into<String>, model: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            model: model.into(),
            field: field.into(),
            instance_filter_fields: Vec::new(),
        }
    }

    pub fn with_instance_filter_fields<S: Into<String>>(
        mut self,
        fields: impl IntoIterator<Item = S>,
    ) -> Self {
        self.instance_filter_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Folds the instance's live values into the descriptor. Filters are only
    /// sent when both filter fields and an instance are present; a field the
    /// instance lacks is sent as `null`.
    pub fn resolve(&self, instance: Option<&dyn FilterSource>) -> RelatedModelPayload {
        let instance_filters = match instance {
            Some(instance) if !self.instance_filter_fields.is_empty() => Some(
                self.instance_filter_fields
                    .iter()
                    .map(|key| (key.clone(), instance.filter_value(key).unwrap_or(Value::Null)))
                    .collect(),
            ),
            _ => None,
        };

        RelatedModelPayload {
            app: self.app.clone(),
            model: self.model.clone(),
            field: self.field.clone(),
            instance_filters,
        }
    }
}

/// An instance whose attributes can be read by name.
pub trait FilterSource {
    fn filter_value(&self, field: &str) -> Option<Value>;
}

impl FilterSource for Map<String, Value> {
    fn filter_value(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

impl FilterSource for HashMap<String, Value> {
    fn filter_value(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

impl FilterSource for Value {
    fn filter_value(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_keeps_unknown_keys() {
        let metadata: Metadata = serde_json::from_value(json!({
            "size": 1024,
            "mimetype": "image/jpeg",
            "name": "test.jpg",
            "url": "http://dummyurl.com/document/file/AZERTYIOOHGFDFGHJKLKJHG",
            "hash": "abc"
        }))
        .unwrap();
        assert_eq!(metadata.size, 1024);
        assert_eq!(metadata.extra.get("hash"), Some(&json!("abc")));

        let partial: Metadata =
            serde_json::from_value(json!({"name": "test.jpg", "size": 1})).unwrap();
        assert_eq!(partial.mimetype, "");
    }

    #[test]
    fn test_expiration_policy_wire_values() {
        assert_eq!(
            serde_json::to_value(ExpirationPolicy::ExportExpirationPolicy).unwrap(),
            json!("EXPORT_EXPIRATION_POLICY")
        );
        assert_eq!(
            serde_json::to_value(ExpirationPolicy::default()).unwrap(),
            json!("NO_EXPIRATION")
        );
        assert_eq!(
            "export".parse::<ExpirationPolicy>().unwrap(),
            ExpirationPolicy::ExportExpirationPolicy
        );
    }

    #[test]
    fn test_related_model_resolves_instance_filters() {
        let related = RelatedModel::new("admission", "Admission", "documents")
            .with_instance_filter_fields(["uuid", "missing"]);
        let instance = json!({"uuid": "abc", "other": 1});

        let payload = related.resolve(Some(&instance));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "app": "admission",
                "model": "Admission",
                "field": "documents",
                "instance_filters": {"uuid": "abc", "missing": null}
            })
        );
    }

    #[test]
    fn test_related_model_without_instance_sends_no_filters() {
        let related = RelatedModel::new("a", "B", "c").with_instance_filter_fields(["uuid"]);
        let payload = related.resolve(None);
        assert!(payload.instance_filters.is_none());
        assert!(
            serde_json::to_value(&payload)
                .unwrap()
                .get("instance_filter_fields")
                .is_none()
        );
    }
}
