use super::DocumentClient;
use crate::services::outcome;
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

impl DocumentClient {
    /// Tells the service these documents are no longer referenced.
    ///
    /// Fire-and-forget: the caller has already decided to delete, so a
    /// failure (timeout, unreachable service, non-204) is logged once and
    /// never returned.
    pub async fn declare_deleted(&self, upload_ids: &[Uuid]) {
        const OP: &str = "declare_deleted";
        let timeout = self.config.timeouts.declare_deleted;

        let files: Vec<String> = upload_ids
            .iter()
            .map(|id| id.hyphenated().to_string())
            .collect();
        let request = self.authenticated(
            self.http
                .post(self.url("declare-files-as-deleted"))
                .json(&json!({ "files": files })),
        );

        let response = match outcome::send(OP, timeout, request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    "An error occurred when calling declare-files-as-deleted: {}",
                    e
                );
                return;
            }
        };

        if response.status() == StatusCode::NO_CONTENT {
            tracing::info!("🗑️  Declared {} file(s) as deleted", files.len());
            return;
        }

        let detail = match outcome::remote_response(OP, timeout, response).await {
            Ok(response) => response.to_string(),
            Err(e) => e.to_string(),
        };
        tracing::error!(
            "An error occurred when calling declare-files-as-deleted: {}",
            detail
        );
    }
}
