use super::{DocumentClient, segment};
use crate::error::DocumentError;
use crate::services::outcome;
use crate::utils::validation::ValidationError;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

#[derive(Deserialize)]
struct UploadRequested {
    token: Option<String>,
}

impl DocumentClient {
    /// Sends raw bytes to the service and returns the write token of the
    /// pending upload. Anything but 201 is an error carrying the response.
    pub async fn save_raw_content(
        &self,
        content: impl Into<Vec<u8>>,
        name: &str,
        mimetype: &str,
    ) -> Result<String, DocumentError> {
        const OP: &str = "save_raw_content";
        let timeout = self.config.timeouts.save_content;

        let part = Part::bytes(content.into())
            .file_name(name.to_string())
            .mime_str(mimetype)
            .map_err(|e| ValidationError {
                code: "INVALID_MIME_TYPE",
                message: format!("MIME type '{}' cannot be sent: {}", mimetype, e),
            })?;
        let form = Form::new().part("file", part);

        let request = self.http.post(self.url("request-upload")).multipart(form);
        let response = outcome::send(OP, timeout, request).await?;

        if response.status() != StatusCode::CREATED {
            let response = outcome::remote_response(OP, timeout, response).await?;
            tracing::error!("❌ Remote save of '{}' refused: {}", name, response);
            return Err(DocumentError::SaveRawContent(response));
        }

        let created: UploadRequested = outcome::expect_json(OP, timeout, response).await?;
        let token = created.token.ok_or_else(|| DocumentError::InvalidResponse {
            operation: OP,
            reason: "missing token".to_string(),
        })?;
        tracing::info!("📤 Saved '{}' remotely ({})", name, mimetype);
        Ok(token)
    }

    /// Raw bytes behind a read token, or `None` when the service has nothing
    /// to give (expired token, unknown file, any non-200).
    pub async fn get_raw_content(&self, token: &str) -> Result<Option<Bytes>, DocumentError> {
        const OP: &str = "get_raw_content";
        let timeout = self.config.timeouts.get_content;

        let request = self.http.get(self.url(&format!("file/{}", segment(token))));
        let response = outcome::send(OP, timeout, request).await?;

        if response.status() != StatusCode::OK {
            tracing::warn!("{}: service answered {}", OP, response.status());
            return Ok(None);
        }
        outcome::read_body(OP, timeout, response).await
    }
}
