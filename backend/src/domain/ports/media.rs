//! Driving port for picture attachments.
//!
//! Files themselves live on a third-party host; this port manages their
//! metadata and tells callers which remote files to release after deletes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::entry::EntryId;
use crate::domain::error::DomainError;
use crate::domain::picture::{Picture, PictureId};
use crate::domain::user::UserId;
use crate::domain::visibility::ViewerIdentity;

/// Attachment metadata returned to viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PictureView {
    pub id: PictureId,
    pub entry_id: EntryId,
    pub url: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&Picture> for PictureView {
    fn from(picture: &Picture) -> Self {
        Self {
            id: picture.id,
            entry_id: picture.entry_id,
            url: picture.url.clone(),
            sort_order: picture.sort_order,
            created_at: picture.created_at,
        }
    }
}

/// Metadata supplied after uploading a file to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPictureMetadata {
    /// The host's identifier for the uploaded file.
    pub file_host_id: String,
    /// Public URL the host serves the file from.
    pub url: String,
    /// Position within the entry's attachments; appended last when absent.
    pub sort_order: Option<i32>,
}

/// Receipt for a deleted attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PictureDeleteReceipt {
    pub id: PictureId,
    /// The host id to release remotely.
    pub file_host_id: String,
}

/// Driving port for attachment operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaPort: Send + Sync {
    /// Record uploaded file metadata against an entry the owner holds.
    async fn attach(
        &self,
        owner: &UserId,
        entry: &EntryId,
        metadata: NewPictureMetadata,
    ) -> Result<PictureView, DomainError>;

    /// Attachments on an entry the viewer may see, in display order.
    async fn entry_pictures(
        &self,
        viewer: &ViewerIdentity,
        entry: &EntryId,
    ) -> Result<Vec<PictureView>, DomainError>;

    /// Delete one attachment the owner holds.
    async fn delete(
        &self,
        owner: &UserId,
        picture: &PictureId,
    ) -> Result<PictureDeleteReceipt, DomainError>;

    /// Reorder an entry's attachments to match `ordered_ids`.
    ///
    /// Every current attachment must appear exactly once.
    async fn reorder(
        &self,
        owner: &UserId,
        entry: &EntryId,
        ordered_ids: Vec<PictureId>,
    ) -> Result<Vec<PictureView>, DomainError>;
}
