//! Client side of a remote document service.
//!
//! Files live behind an HTTP service; a host application only keeps stable
//! upload ids and trades them for short-lived read/write tokens when it needs
//! the bytes, the metadata or a post-processed version.
//!
//! ```rust,no_run
//! use remote_document_client::{ConfirmUpload, DocumentClient, DocumentServiceConfig, TokenRequest};
//!
//! # async fn example() -> Result<(), remote_document_client::DocumentError> {
//! let client = DocumentClient::new(DocumentServiceConfig::from_env()?)?;
//!
//! let write_token = client.save_raw_content(b"hello".to_vec(), "hello.txt", "text/plain").await?;
//! let upload_id = client.confirm_upload(&write_token, &ConfirmUpload::to_path("notes/")).await?;
//!
//! if let Some(token) = client.get_token(&upload_id, &TokenRequest::read()).await?.into_token() {
//!     let metadata = client.get_metadata(&token).await?;
//!     println!("{:?}", metadata);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Host forms and models hand their raw field values to a
//! [`SerializerRegistry`](services::serializer::SerializerRegistry) built once
//! at startup, which canonicalizes upload id lists and rejects malformed tokens
//! before anything reaches the service:
//!
//! ```rust
//! use remote_document_client::services::serializer::{FieldKind, SerializerRegistry};
//! use serde_json::json;
//!
//! let registry = SerializerRegistry::default();
//! let ids = registry
//!     .serialize(FieldKind::UploadIds, &json!(["A91C3AF8-91EB-4B68-96FC-0769A28A95C3"]))
//!     .unwrap();
//! assert_eq!(ids, json!(["a91c3af8-91eb-4b68-96fc-0769a28a95c3"]));
//! assert!(registry.serialize(FieldKind::Token, &json!("a/b")).is_err());
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{DocumentServiceConfig, Timeouts};
pub use error::{DocumentError, RemoteResponse, Result};
pub use models::{
    ExpirationPolicy, FilterSource, Metadata, PostProcessParams, PostProcessingType, RelatedModel,
};
pub use services::document_client::{
    BatchTokens, ConfirmUpload, DocumentClient, PostProcessingLaunch, PostProcessingProgress,
    TokenKind, TokenOutcome, TokenRequest,
};
pub use utils::filename::{UploadTo, generate_filename};
