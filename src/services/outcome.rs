//! Maps what came back from the document service (or what went wrong on the
//! way) onto the client's outcome taxonomy.

use crate::error::{DocumentError, RemoteResponse};
use crate::models::Metadata;
use crate::services::document_client::types::{BatchTokens, TokenOutcome};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// `detail` code the service puts in a 500 body when the virus scan failed.
pub const FILE_INFECTED_ERROR_CODE: &str = "FILE_INFECTED";

const BODY_EXCERPT_LEN: usize = 512;

/// Sends a request under its operation deadline. A missed deadline becomes
/// [`DocumentError::Timeout`]; any other transport failure means the service
/// could not be reached.
pub(crate) async fn send(
    operation: &'static str,
    timeout: Duration,
    request: RequestBuilder,
) -> Result<Response, DocumentError> {
    tracing::debug!("➡️  {} (timeout {:?})", operation, timeout);
    request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| transport_error(operation, timeout, e))
}

pub(crate) fn transport_error(
    operation: &'static str,
    timeout: Duration,
    error: reqwest::Error,
) -> DocumentError {
    if error.is_timeout() {
        DocumentError::Timeout { operation, timeout }
    } else {
        DocumentError::Transport {
            operation,
            source: error,
        }
    }
}

/// Reads the whole body. Only a timeout is fatal here: the deadline covers
/// the body as well as the headers.
pub(crate) async fn read_body(
    operation: &'static str,
    timeout: Duration,
    response: Response,
) -> Result<Option<bytes::Bytes>, DocumentError> {
    match response.bytes().await {
        Ok(body) => Ok(Some(body)),
        Err(e) if e.is_timeout() => Err(DocumentError::Timeout { operation, timeout }),
        Err(e) => {
            tracing::warn!("{}: failed to read response body: {}", operation, e);
            Ok(None)
        }
    }
}

pub(crate) async fn remote_response(
    operation: &'static str,
    timeout: Duration,
    response: Response,
) -> Result<RemoteResponse, DocumentError> {
    let status = response.status().as_u16();
    let body = read_body(operation, timeout, response).await?;
    Ok(RemoteResponse {
        status,
        body: body.map(|b| excerpt(&b)).unwrap_or_default(),
    })
}

/// Lookup-style answer: anything but `expected` is absence, and so is a body
/// that does not decode.
pub(crate) async fn lookup_json<T: DeserializeOwned>(
    operation: &'static str,
    timeout: Duration,
    expected: StatusCode,
    response: Response,
) -> Result<Option<T>, DocumentError> {
    let status = response.status();
    if status != expected {
        tracing::warn!("{}: service answered {}, treating as absent", operation, status);
        return Ok(None);
    }
    let Some(body) = read_body(operation, timeout, response).await? else {
        return Ok(None);
    };
    match serde_json::from_slice(&body) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("{}: undecodable body ({}), treating as absent", operation, e);
            Ok(None)
        }
    }
}

/// Mutating-style answer: a non-2xx status is propagated, and so is a body
/// that does not decode.
pub(crate) async fn expect_json<T: DeserializeOwned>(
    operation: &'static str,
    timeout: Duration,
    response: Response,
) -> Result<T, DocumentError> {
    if !response.status().is_success() {
        let response = remote_response(operation, timeout, response).await?;
        tracing::error!("{} failed with {}", operation, response);
        return Err(DocumentError::UnexpectedStatus {
            operation,
            response,
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(operation, timeout, e))?;
    serde_json::from_slice(&body).map_err(|e| DocumentError::InvalidResponse {
        operation,
        reason: e.to_string(),
    })
}

/// Single token issuance: 404 and the infected-file 500 are promoted to
/// named outcomes instead of errors.
pub fn map_token_response(status: StatusCode, body: &[u8]) -> TokenOutcome {
    if status == StatusCode::NOT_FOUND {
        return TokenOutcome::UploadInvalid;
    }

    let json: Option<Value> = serde_json::from_slice(body).ok();
    if status == StatusCode::INTERNAL_SERVER_ERROR
        && json
            .as_ref()
            .and_then(|v| v.get("detail"))
            .and_then(Value::as_str)
            == Some(FILE_INFECTED_ERROR_CODE)
    {
        return TokenOutcome::FileInfected;
    }

    if status.is_success() {
        let token = match &json {
            Some(Value::Object(map)) => map.get("token").and_then(Value::as_str),
            Some(Value::String(token)) => Some(token.as_str()),
            _ => None,
        };
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            return TokenOutcome::Token(token.to_string());
        }
    }

    tracing::warn!(
        "Token issuance answered {} without a usable token: {}",
        status,
        excerpt(body)
    );
    TokenOutcome::NotFound
}

/// Batch token issuance. 201 keeps the entries without an `error`; 206 and
/// 500 hand the raw answer back.
pub fn map_batch_tokens(status: StatusCode, body: &[u8]) -> BatchTokens {
    let json: Option<Value> = serde_json::from_slice(body).ok();
    match (status, json) {
        (StatusCode::CREATED, Some(Value::Object(entries))) => BatchTokens::Issued(
            entries
                .into_iter()
                .filter(|(_, item)| item.get("error").is_none())
                .filter_map(|(uuid, item)| {
                    item.get("token")
                        .and_then(Value::as_str)
                        .map(|token| (uuid, token.to_string()))
                })
                .collect(),
        ),
        (StatusCode::PARTIAL_CONTENT | StatusCode::INTERNAL_SERVER_ERROR, Some(raw)) => {
            BatchTokens::Partial(raw)
        }
        (status, _) => {
            tracing::warn!("Batch token issuance answered {}, no tokens issued", status);
            BatchTokens::Issued(HashMap::new())
        }
    }
}

/// Duplication: original id → new id for the entries that carry an
/// `upload_id`. Keys outside `submitted` (modified uploads the service copied
/// along) never reach the caller.
pub fn map_duplicates(
    status: StatusCode,
    body: &[u8],
    submitted: &[String],
) -> HashMap<String, String> {
    if status != StatusCode::CREATED {
        tracing::warn!("Duplication answered {}, nothing duplicated", status);
        return HashMap::new();
    }
    let Ok(Value::Object(entries)) = serde_json::from_slice::<Value>(body) else {
        return HashMap::new();
    };

    let submitted: HashSet<&str> = submitted.iter().map(String::as_str).collect();
    entries
        .into_iter()
        .filter(|(original, _)| submitted.contains(original.as_str()))
        .filter_map(|(original, item)| {
            item.get("upload_id")
                .and_then(Value::as_str)
                .map(|new_id| (original, new_id.to_string()))
        })
        .collect()
}

/// Batch metadata: only the entries that look like metadata survive.
pub fn map_several_metadata(entries: HashMap<String, Value>) -> HashMap<String, Metadata> {
    entries
        .into_iter()
        .filter(|(_, item)| item.is_object() && item.get("error").is_none())
        .filter_map(|(token, item)| {
            serde_json::from_value::<Metadata>(item)
                .ok()
                .map(|metadata| (token, metadata))
        })
        .collect()
}

fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= BODY_EXCERPT_LEN {
        return text.into_owned();
    }
    let mut end = BODY_EXCERPT_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_token_response_mapping() {
        assert_eq!(
            map_token_response(StatusCode::OK, &body(json!({"token": "abc"}))),
            TokenOutcome::Token("abc".into())
        );
        assert_eq!(
            map_token_response(StatusCode::CREATED, &body(json!("abc"))),
            TokenOutcome::Token("abc".into())
        );
        assert_eq!(
            map_token_response(StatusCode::NOT_FOUND, b""),
            TokenOutcome::UploadInvalid
        );
        assert_eq!(
            map_token_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &body(json!({"detail": FILE_INFECTED_ERROR_CODE}))
            ),
            TokenOutcome::FileInfected
        );
        assert_eq!(
            map_token_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &body(json!({"detail": "something else"}))
            ),
            TokenOutcome::NotFound
        );
        assert_eq!(
            map_token_response(StatusCode::OK, &body(json!({"other": 1}))),
            TokenOutcome::NotFound
        );
    }

    #[test]
    fn test_batch_tokens_filters_errors_on_created() {
        let raw = json!({
            "a": {"token": "tok-a"},
            "b": {"error": "not found"},
            "c": {"token": "tok-c", "error": "expired"}
        });
        let mapped = map_batch_tokens(StatusCode::CREATED, &body(raw));
        let issued = mapped.issued().unwrap();
        assert_eq!(issued.len(), 1);
        assert_eq!(issued["a"], "tok-a");
    }

    #[test]
    fn test_batch_tokens_passes_partial_through() {
        let raw = json!({"a": {"token": "tok-a"}, "b": {"error": "infected"}});
        assert_eq!(
            map_batch_tokens(StatusCode::PARTIAL_CONTENT, &body(raw.clone())),
            BatchTokens::Partial(raw.clone())
        );
        assert_eq!(
            map_batch_tokens(StatusCode::INTERNAL_SERVER_ERROR, &body(raw.clone())),
            BatchTokens::Partial(raw)
        );
        assert_eq!(
            map_batch_tokens(StatusCode::BAD_REQUEST, b"{}"),
            BatchTokens::Issued(HashMap::new())
        );
    }

    #[test]
    fn test_duplicates_keep_only_submitted_ids() {
        let submitted = vec!["orig".to_string(), "failed".to_string()];
        let raw = json!({
            "orig": {"upload_id": "copy"},
            "failed": {"error": "boom"},
            "modified": {"upload_id": "modified-copy"}
        });
        let mapped = map_duplicates(StatusCode::CREATED, &body(raw), &submitted);
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped["orig"], "copy");

        assert!(map_duplicates(StatusCode::OK, b"{}", &submitted).is_empty());
    }

    #[test]
    fn test_several_metadata_drops_error_entries() {
        let entries: HashMap<String, Value> = serde_json::from_value(json!({
            "t1": {"name": "a.pdf", "size": 3, "mimetype": "application/pdf", "url": "u"},
            "t2": {"error": "expired"},
            "t3": null
        }))
        .unwrap();
        let mapped = map_several_metadata(entries);
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped["t1"].name, "a.pdf");
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let long = "é".repeat(400);
        let cut = excerpt(long.as_bytes());
        assert!(cut.ends_with('…'));
        assert!(cut.len() <= BODY_EXCERPT_LEN + '…'.len_utf8());
    }
}
