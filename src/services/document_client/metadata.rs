use super::{DocumentClient, segment};
use crate::error::DocumentError;
use crate::models::Metadata;
use crate::services::outcome;
use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::collections::HashMap;

impl DocumentClient {
    /// Metadata of the file behind a token; `None` when the token is unknown
    /// or expired.
    pub async fn get_metadata(&self, token: &str) -> Result<Option<Metadata>, DocumentError> {
        const OP: &str = "get_metadata";
        let timeout = self.config.timeouts.get_metadata;

        let request = self
            .http
            .get(self.url(&format!("metadata/{}", segment(token))));
        let response = outcome::send(OP, timeout, request).await?;
        outcome::lookup_json(OP, timeout, StatusCode::OK, response).await
    }

    /// token → metadata for every token the service could resolve.
    pub async fn get_several_metadata(
        &self,
        tokens: &[String],
    ) -> Result<HashMap<String, Metadata>, DocumentError> {
        const OP: &str = "get_several_metadata";
        let timeout = self.config.timeouts.get_metadata;

        if tokens.is_empty() {
            return Ok(HashMap::new());
        }

        let request = self.authenticated(self.http.post(self.url("metadata")).json(tokens));
        let response = outcome::send(OP, timeout, request).await?;
        let entries: Option<HashMap<String, Value>> =
            outcome::lookup_json(OP, timeout, StatusCode::OK, response).await?;

        Ok(entries
            .map(outcome::map_several_metadata)
            .unwrap_or_default())
    }

    /// Replaces metadata fields of a stored file and returns the result.
    pub async fn change_metadata(
        &self,
        token: &str,
        metadata: &Map<String, Value>,
    ) -> Result<Map<String, Value>, DocumentError> {
        const OP: &str = "change_metadata";
        let timeout = self.config.timeouts.change_metadata;

        let request = self.authenticated(
            self.http
                .post(self.url(&format!("change-metadata/{}", segment(token))))
                .json(metadata),
        );
        let response = outcome::send(OP, timeout, request).await?;
        let updated = outcome::expect_json(OP, timeout, response).await?;
        tracing::info!("📝 Remote metadata changed");
        Ok(updated)
    }
}
