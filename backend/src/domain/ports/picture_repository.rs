//! Port abstraction for picture attachment persistence adapters.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::entry::EntryId;
use crate::domain::picture::{Picture, PictureId};
use crate::domain::user::UserId;

/// Persistence errors raised by picture repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PictureRepositoryError {
    /// Repository connection could not be established.
    #[error("picture repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("picture repository query failed: {message}")]
    Query { message: String },
}

impl PictureRepositoryError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Storage port for picture attachments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PictureRepository: Send + Sync {
    /// Persist new attachment metadata.
    async fn insert(&self, picture: &Picture) -> Result<(), PictureRepositoryError>;

    /// Fetch attachment metadata by id.
    async fn find_by_id(&self, id: &PictureId) -> Result<Option<Picture>, PictureRepositoryError>;

    /// Every attachment on `entry`, in display order.
    async fn list_by_entry(&self, entry: &EntryId) -> Result<Vec<Picture>, PictureRepositoryError>;

    /// Every attachment owned by `owner`, in display order.
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Picture>, PictureRepositoryError>;

    /// Delete one attachment; returns `false` when it did not exist.
    async fn delete(&self, id: &PictureId) -> Result<bool, PictureRepositoryError>;

    /// Delete every attachment on `entry`, returning the file host ids of
    /// the removed rows so callers can release the remote files.
    async fn delete_by_entry(
        &self,
        entry: &EntryId,
    ) -> Result<Vec<String>, PictureRepositoryError>;

    /// Persist a new sort order for one attachment.
    async fn set_sort_order(
        &self,
        id: &PictureId,
        sort_order: i32,
    ) -> Result<bool, PictureRepositoryError>;
}

/// In-memory adapter backing tests and database-less deployments.
#[derive(Debug, Default)]
pub struct MemoryPictureRepository {
    rows: RwLock<Vec<Picture>>,
}

impl MemoryPictureRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_poisoned() -> PictureRepositoryError {
        PictureRepositoryError::query("picture store lock poisoned")
    }
}

#[async_trait]
impl PictureRepository for MemoryPictureRepository {
    async fn insert(&self, picture: &Picture) -> Result<(), PictureRepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        rows.push(picture.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &PictureId) -> Result<Option<Picture>, PictureRepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows.iter().find(|row| row.id == *id).cloned())
    }

    async fn list_by_entry(&self, entry: &EntryId) -> Result<Vec<Picture>, PictureRepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        let mut found: Vec<Picture> = rows
            .iter()
            .filter(|row| row.entry_id == *entry)
            .cloned()
            .collect();
        found.sort_by(Picture::display_cmp);
        Ok(found)
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Picture>, PictureRepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        let mut found: Vec<Picture> = rows
            .iter()
            .filter(|row| row.owner_id == *owner)
            .cloned()
            .collect();
        found.sort_by(Picture::display_cmp);
        Ok(found)
    }

    async fn delete(&self, id: &PictureId) -> Result<bool, PictureRepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        let before = rows.len();
        rows.retain(|row| row.id != *id);
        Ok(rows.len() != before)
    }

    async fn delete_by_entry(
        &self,
        entry: &EntryId,
    ) -> Result<Vec<String>, PictureRepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        let mut removed = Vec::new();
        rows.retain(|row| {
            if row.entry_id == *entry {
                removed.push(row.file_host_id.clone());
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    async fn set_sort_order(
        &self,
        id: &PictureId,
        sort_order: i32,
    ) -> Result<bool, PictureRepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        match rows.iter_mut().find(|row| row.id == *id) {
            Some(row) => {
                row.sort_order = sort_order;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
