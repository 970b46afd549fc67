use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Anything that can claim to be a stable upload id.
///
/// Only UUID values and strings implement this, so handing the validator some
/// other type is rejected by the compiler. Loosely typed input (JSON coming
/// from a form or a serializer) goes through [`check_upload_id_value`].
pub trait UploadIdCandidate {
    fn canonical_upload_id(&self) -> Option<String>;
}

impl UploadIdCandidate for Uuid {
    fn canonical_upload_id(&self) -> Option<String> {
        Some(self.hyphenated().to_string())
    }
}

impl UploadIdCandidate for str {
    fn canonical_upload_id(&self) -> Option<String> {
        Uuid::parse_str(self)
            .ok()
            .map(|uuid| uuid.hyphenated().to_string())
    }
}

impl UploadIdCandidate for String {
    fn canonical_upload_id(&self) -> Option<String> {
        self.as_str().canonical_upload_id()
    }
}

impl<T: UploadIdCandidate + ?Sized> UploadIdCandidate for &T {
    fn canonical_upload_id(&self) -> Option<String> {
        (**self).canonical_upload_id()
    }
}

/// Returns the canonical (lowercase, hyphenated) form of a stable upload id,
/// or `None` when the string is not a UUID.
pub fn check_upload_id<C: UploadIdCandidate + ?Sized>(candidate: &C) -> Option<String> {
    candidate.canonical_upload_id()
}

/// Same as [`check_upload_id`] for loosely typed input. A malformed string is
/// `Ok(None)`; anything that is not a string at all is a type error.
pub fn check_upload_id_value(value: &Value) -> Result<Option<String>, ValidationError> {
    match value {
        Value::String(s) => Ok(s.canonical_upload_id()),
        other => Err(ValidationError {
            code: "NOT_AN_IDENTIFIER",
            message: format!(
                "Expected a UUID or a string, got a JSON {}",
                json_type_name(other)
            ),
        }),
    }
}

/// Lenient predicate: `false` for anything that is not a UUID string.
pub fn is_uuid_value(value: &Value) -> bool {
    matches!(check_upload_id_value(value), Ok(Some(_)))
}

/// Validates a whole batch of ids. One bad element rejects the batch, so the
/// caller's positional bookkeeping never drifts from what was sent.
pub fn validate_upload_ids<C: UploadIdCandidate>(
    candidates: &[C],
) -> Result<Vec<String>, ValidationError> {
    let mut validated = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates.iter().enumerate() {
        match candidate.canonical_upload_id() {
            Some(canonical) => validated.push(canonical),
            None => {
                return Err(ValidationError {
                    code: "INVALID_IDENTIFIER_BATCH",
                    message: format!(
                        "Element {} of {} is not a valid upload id",
                        index,
                        candidates.len()
                    ),
                });
            }
        }
    }
    Ok(validated)
}

/// Loosely typed counterpart of [`validate_upload_ids`].
pub fn validate_upload_id_values(values: &[Value]) -> Result<Vec<String>, ValidationError> {
    let mut validated = Vec::with_capacity(values.len());
    for (index, value) in values.iter().enumerate() {
        match check_upload_id_value(value)? {
            Some(canonical) => validated.push(canonical),
            None => {
                return Err(ValidationError {
                    code: "INVALID_IDENTIFIER_BATCH",
                    message: format!(
                        "Element {} of {} is not a valid upload id",
                        index,
                        values.len()
                    ),
                });
            }
        }
    }
    Ok(validated)
}

/// Sanity check for opaque access tokens before they end up in a URL path.
pub fn is_token_like(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '~'))
        && token.canonical_upload_id().is_none()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RAW: &str = "a91c3af8-91eb-4b68-96fc-0769a28a95c3";

    #[test]
    fn test_uuid_and_string_share_canonical_form() {
        let uuid = Uuid::parse_str(RAW).unwrap();
        assert_eq!(check_upload_id(&uuid).as_deref(), Some(RAW));
        assert_eq!(check_upload_id(RAW).as_deref(), Some(RAW));
        assert_eq!(
            check_upload_id("A91C3AF8-91EB-4B68-96FC-0769A28A95C3").as_deref(),
            Some(RAW)
        );
        assert_eq!(
            check_upload_id("a91c3af891eb4b6896fc0769a28a95c3").as_deref(),
            Some(RAW)
        );
    }

    #[test]
    fn test_malformed_strings_are_invalid() {
        assert!(check_upload_id("").is_none());
        assert!(check_upload_id("not-a-uuid").is_none());
        assert!(check_upload_id("0:M4Ie5JzJnOBgSnTn1DZtPnvF5I6MxyUU").is_none());
        assert!(check_upload_id(&"a91c3af8-91eb".to_string()).is_none());
        assert!(check_upload_id(" a91c3af8-91eb-4b68-96fc-0769a28a95c3 ").is_none());
        assert!(check_upload_id("a91c3af8-91eb-4b68-96fc-0769a28a95c3\n").is_none());
    }

    #[test]
    fn test_non_string_values_are_type_errors() {
        assert_eq!(
            check_upload_id_value(&json!(RAW)).unwrap().as_deref(),
            Some(RAW)
        );
        assert_eq!(check_upload_id_value(&json!("garbage")).unwrap(), None);

        let err = check_upload_id_value(&json!(1)).unwrap_err();
        assert_eq!(err.code, "NOT_AN_IDENTIFIER");
        assert!(check_upload_id_value(&json!(null)).is_err());
        assert!(check_upload_id_value(&json!([RAW])).is_err());
    }

    #[test]
    fn test_is_uuid_value() {
        assert!(is_uuid_value(&json!(RAW)));
        assert!(!is_uuid_value(&json!("0:M4Ie5JzJnOBgSnTn1DZtPnvF5I6MxyUU")));
        assert!(!is_uuid_value(&json!(1)));
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let good = [RAW, "bbc1ba15-42d2-48e9-9884-7631417bb1e1"];
        assert_eq!(validate_upload_ids(&good).unwrap().len(), 2);

        let mixed = [RAW, "nope"];
        let err = validate_upload_ids(&mixed).unwrap_err();
        assert_eq!(err.code, "INVALID_IDENTIFIER_BATCH");

        let empty: [&str; 0] = [];
        assert!(validate_upload_ids(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_value_batch_propagates_type_errors() {
        assert!(validate_upload_id_values(&[json!(RAW)]).is_ok());
        assert_eq!(
            validate_upload_id_values(&[json!(RAW), json!(42)])
                .unwrap_err()
                .code,
            "NOT_AN_IDENTIFIER"
        );
        assert_eq!(
            validate_upload_id_values(&[json!("x")]).unwrap_err().code,
            "INVALID_IDENTIFIER_BATCH"
        );
    }

    #[test]
    fn test_is_token_like() {
        assert!(is_token_like("0:M4Ie5JzJnOBgSnTn1DZtPnvF5I6MxyUU"));
        assert!(!is_token_like(""));
        assert!(!is_token_like("a/b"));
        assert!(!is_token_like(RAW));
    }
}
