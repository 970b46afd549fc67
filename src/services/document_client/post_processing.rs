use super::DocumentClient;
use super::types::{PostProcessingLaunch, PostProcessingProgress};
use crate::error::DocumentError;
use crate::models::{PostProcessParams, PostProcessingType};
use crate::services::outcome;
use crate::utils::validation::{
    UploadIdCandidate, ValidationError, check_upload_id, validate_upload_ids,
};
use serde_json::{Value, json};

impl DocumentClient {
    /// Starts post-processing (conversion, merge, ...) of confirmed documents.
    ///
    /// Synchronous runs return the finished result; asynchronous runs return
    /// the acknowledgement and are followed with [`Self::get_progress`].
    pub async fn launch_post_processing<C: UploadIdCandidate>(
        &self,
        upload_ids: &[C],
        async_post_processing: bool,
        post_processing_types: &[PostProcessingType],
        post_process_params: &PostProcessParams,
    ) -> Result<PostProcessingLaunch, DocumentError> {
        const OP: &str = "launch_post_processing";
        let timeout = self.config.timeouts.post_processing;

        let uuids = validate_upload_ids(upload_ids)?;

        let request = self.authenticated(self.http.post(self.url("post-processing")).json(
            &json!({
                "async_post_processing": async_post_processing,
                "post_process_types": post_processing_types,
                "files_uuid": uuids,
                "post_process_params": post_process_params,
            }),
        ));
        let response = outcome::send(OP, timeout, request).await?;

        if async_post_processing {
            if !response.status().is_success() {
                let response = outcome::remote_response(OP, timeout, response).await?;
                return Err(DocumentError::UnexpectedStatus {
                    operation: OP,
                    response,
                });
            }
            tracing::info!(
                "⚙️  Asynchronous post-processing of {} document(s) accepted",
                uuids.len()
            );
            return Ok(PostProcessingLaunch::Pending(response));
        }

        let result: Value = outcome::expect_json(OP, timeout, response).await?;
        Ok(PostProcessingLaunch::Completed(result))
    }

    /// Polls the progress of an asynchronous post-processing. Safe to repeat.
    pub async fn get_progress<C: UploadIdCandidate + ?Sized>(
        &self,
        upload_id: &C,
        wanted_post_process: Option<PostProcessingType>,
    ) -> Result<PostProcessingProgress, DocumentError> {
        const OP: &str = "get_progress";
        let timeout = self.config.timeouts.get_progress;

        let uuid = check_upload_id(upload_id).ok_or_else(|| ValidationError {
            code: "INVALID_IDENTIFIER",
            message: "Progress can only be polled for a valid upload id".to_string(),
        })?;

        let request = self.authenticated(
            self.http
                .post(self.url(&format!("get-progress-async-post-processing/{}", uuid)))
                .json(&json!({
                    "pk": uuid,
                    "wanted_post_process": wanted_post_process,
                })),
        );
        let response = outcome::send(OP, timeout, request).await?;
        let progress: Value = outcome::expect_json(OP, timeout, response).await?;
        Ok(PostProcessingProgress::from_value(progress))
    }
}
