use super::DocumentClient;
use super::types::{BatchTokens, TokenOutcome, TokenRequest};
use crate::error::DocumentError;
use crate::services::outcome;
use crate::utils::validation::{UploadIdCandidate, check_upload_id, validate_upload_ids};
use serde_json::{Map, Value, json};

impl DocumentClient {
    /// Exchanges a stable upload id for a read or write token.
    ///
    /// A malformed id yields [`TokenOutcome::NotFound`] without contacting the
    /// service. A timeout is always an error, never an outcome.
    pub async fn get_token<C: UploadIdCandidate + ?Sized>(
        &self,
        upload_id: &C,
        request: &TokenRequest,
    ) -> Result<TokenOutcome, DocumentError> {
        const OP: &str = "get_token";
        let timeout = self.config.timeouts.get_token;

        let Some(uuid) = check_upload_id(upload_id) else {
            tracing::debug!("{}: invalid upload id, no request sent", OP);
            return Ok(TokenOutcome::NotFound);
        };

        let url = self.url(&format!("{}-token/{}", request.kind.as_str(), uuid));
        let body = json!({
            "uuid": uuid,
            "wanted_post_process": request.wanted_post_process,
            "custom_ttl": request.custom_ttl,
            "for_modified_upload": request.for_modified_upload,
        });

        let http_request = self.authenticated(self.http.post(url).json(&body));
        let response = outcome::send(OP, timeout, http_request).await?;
        let status = response.status();
        let body = outcome::read_body(OP, timeout, response)
            .await?
            .unwrap_or_default();

        let mapped = outcome::map_token_response(status, &body);
        if mapped == TokenOutcome::FileInfected {
            tracing::warn!("🦠 Token refused for {}: file is infected", uuid);
        }
        Ok(mapped)
    }

    /// Read tokens for several uploads in one request.
    ///
    /// Every id is validated first; one bad id rejects the whole batch before
    /// anything is sent.
    pub async fn get_read_tokens<C: UploadIdCandidate>(
        &self,
        upload_ids: &[C],
        request: &TokenRequest,
    ) -> Result<BatchTokens, DocumentError> {
        const OP: &str = "get_read_tokens";
        let timeout = self.config.timeouts.get_token;

        let uuids = validate_upload_ids(upload_ids)?;

        let mut data = Map::new();
        data.insert("uuids".into(), json!(uuids));
        data.insert(
            "for_modified_upload".into(),
            json!(request.for_modified_upload),
        );
        if let Some(kind) = request.wanted_post_process {
            data.insert("wanted_post_process".into(), json!(kind));
        }
        if let Some(ttl) = request.custom_ttl.filter(|ttl| *ttl > 0) {
            data.insert("custom_ttl".into(), json!(ttl));
        }

        let http_request = self.authenticated(
            self.http
                .post(self.url("read-tokens"))
                .json(&Value::Object(data)),
        );
        let response = outcome::send(OP, timeout, http_request).await?;
        let status = response.status();
        let body = outcome::read_body(OP, timeout, response)
            .await?
            .unwrap_or_default();

        Ok(outcome::map_batch_tokens(status, &body))
    }
}
