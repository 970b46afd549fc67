use crate::utils::validation::{ValidationError, is_token_like, validate_upload_id_values};
use serde_json::Value;
use std::collections::HashMap;

/// Kind of host field a value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// List of stable upload ids stored on a record.
    UploadIds,
    /// A single access token submitted by a form.
    Token,
    /// Anything the document layer does not own.
    Plain,
}

/// Turns a field value into what travels over the wire.
pub trait WireSerializer: Send + Sync {
    fn serialize(&self, value: &Value) -> Result<Value, ValidationError>;
}

/// Canonical id strings; one bad entry rejects the whole list.
pub struct UploadIdListSerializer;

impl WireSerializer for UploadIdListSerializer {
    fn serialize(&self, value: &Value) -> Result<Value, ValidationError> {
        let items = match value {
            Value::Null => return Ok(Value::Array(Vec::new())),
            Value::Array(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        let ids = validate_upload_id_values(items)?;
        Ok(Value::Array(ids.into_iter().map(Value::String).collect()))
    }
}

pub struct TokenSerializer;

impl WireSerializer for TokenSerializer {
    fn serialize(&self, value: &Value) -> Result<Value, ValidationError> {
        match value.as_str() {
            Some(token) if is_token_like(token) => Ok(Value::String(token.to_string())),
            _ => Err(ValidationError {
                code: "INVALID_TOKEN",
                message: "File upload is either non-existent or has expired".to_string(),
            }),
        }
    }
}

pub struct PassThroughSerializer;

impl WireSerializer for PassThroughSerializer {
    fn serialize(&self, value: &Value) -> Result<Value, ValidationError> {
        Ok(value.clone())
    }
}

/// Serialization strategy per field kind, filled once at startup.
pub struct SerializerRegistry {
    by_kind: HashMap<FieldKind, Box<dyn WireSerializer>>,
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(FieldKind::UploadIds, Box::new(UploadIdListSerializer));
        registry.register(FieldKind::Token, Box::new(TokenSerializer));
        registry.register(FieldKind::Plain, Box::new(PassThroughSerializer));
        registry
    }
}

impl SerializerRegistry {
    pub fn empty() -> Self {
        Self {
            by_kind: HashMap::new(),
        }
    }

    /// Replaces any strategy already registered for `kind`.
    pub fn register(&mut self, kind: FieldKind, serializer: Box<dyn WireSerializer>) {
        self.by_kind.insert(kind, serializer);
    }

    pub fn serialize(&self, kind: FieldKind, value: &Value) -> Result<Value, ValidationError> {
        match self.by_kind.get(&kind) {
            Some(serializer) => serializer.serialize(value),
            None => Err(ValidationError {
                code: "NO_SERIALIZER",
                message: format!("No serializer registered for {:?}", kind),
            }),
        }
    }
}
