use super::types::ConfirmUpload;
use super::{DocumentClient, segment};
use crate::error::DocumentError;
use crate::services::outcome;
use crate::utils::validation::{UploadIdCandidate, check_upload_id, validate_upload_ids};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Deserialize)]
struct Confirmed {
    uuid: Option<String>,
}

impl DocumentClient {
    /// Commits a pending upload and returns its stable id.
    ///
    /// Not idempotent: confirming the same write token twice may create two
    /// documents.
    pub async fn confirm_upload(
        &self,
        write_token: &str,
        options: &ConfirmUpload<'_>,
    ) -> Result<Uuid, DocumentError> {
        const OP: &str = "confirm_upload";
        let timeout = self.config.timeouts.confirm_upload;

        let request = self.authenticated(
            self.http
                .post(self.url(&format!("confirm-upload/{}", segment(write_token))))
                .json(&options.payload()),
        );
        let response = outcome::send(OP, timeout, request).await?;
        let confirmed: Confirmed = outcome::expect_json(OP, timeout, response).await?;

        let uuid = confirmed
            .uuid
            .as_deref()
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or_else(|| DocumentError::InvalidResponse {
                operation: OP,
                reason: format!("expected an upload uuid, got {:?}", confirmed.uuid),
            })?;

        tracing::info!("✅ Upload confirmed as {}", uuid);
        Ok(uuid)
    }

    /// Duplicates documents and returns original id → copy id for the ones
    /// the service managed to copy.
    ///
    /// With `with_modified_upload` the service also copies the modified
    /// version of each document, but those ids are never sent nor returned:
    /// only original ids flow through. `upload_path_by_uuid` picks a
    /// destination per original id; unlisted ids are copied next to the
    /// original.
    pub async fn duplicate<C: UploadIdCandidate>(
        &self,
        upload_ids: &[C],
        with_modified_upload: bool,
        upload_path_by_uuid: Option<&HashMap<String, String>>,
    ) -> Result<HashMap<String, String>, DocumentError> {
        const OP: &str = "duplicate";
        let timeout = self.config.timeouts.duplicate;

        let uuids = validate_upload_ids(upload_ids)?;

        // Path keys follow the canonical form of the ids they refer to.
        let paths = upload_path_by_uuid.map(|paths| {
            paths
                .iter()
                .map(|(id, path)| (check_upload_id(id).unwrap_or_else(|| id.clone()), path))
                .collect::<HashMap<_, _>>()
        });

        let request = self.authenticated(self.http.post(self.url("duplicate")).json(&json!({
            "uuids": uuids,
            "with_modified_upload": with_modified_upload,
            "upload_path_by_uuid": paths,
        })));
        let response = outcome::send(OP, timeout, request).await?;
        let status = response.status();
        let body = outcome::read_body(OP, timeout, response)
            .await?
            .unwrap_or_default();

        let duplicates = outcome::map_duplicates(status, &body, &uuids);
        if duplicates.len() < uuids.len() {
            tracing::warn!(
                "Duplicated {} of {} documents",
                duplicates.len(),
                uuids.len()
            );
        }
        Ok(duplicates)
    }
}
