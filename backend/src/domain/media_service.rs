//! Media domain service.
//!
//! Implements [`MediaPort`] over the picture, entry, and friendship
//! repositories plus the read-path cache. Attachment bytes never pass
//! through here; callers upload to the file host first and register the
//! resulting metadata. Deletes hand the host id back so the caller can
//! release the remote file. Cached entry views embed picture lists, so
//! every attachment mutation invalidates the owning entry's cache keys.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::entry::{DiaryEntry, EntryId};
use crate::domain::error::DomainError;
use crate::domain::picture::{Picture, PictureId};
use crate::domain::ports::{
    CacheKey, CacheNamespace, EntryCache, EntryRepository, EntryRepositoryError,
    FriendshipRepository, FriendshipRepositoryError, MediaPort, NewPictureMetadata,
    PictureDeleteReceipt, PictureRepository, PictureRepositoryError, PictureView,
};
use crate::domain::user::UserId;
use crate::domain::visibility::{can_view_entry, FriendshipSnapshot, ViewerIdentity};

/// Media service implementing the driving port.
#[derive(Clone)]
pub struct MediaService<P, E, F, C> {
    pictures: Arc<P>,
    entries: Arc<E>,
    friendships: Arc<F>,
    cache: Arc<C>,
}

impl<P, E, F, C> MediaService<P, E, F, C> {
    pub fn new(pictures: Arc<P>, entries: Arc<E>, friendships: Arc<F>, cache: Arc<C>) -> Self {
        Self {
            pictures,
            entries,
            friendships,
            cache,
        }
    }
}

fn map_picture_repo_error(error: PictureRepositoryError) -> DomainError {
    match error {
        PictureRepositoryError::Connection { message } => {
            DomainError::service_unavailable(format!("picture repository unavailable: {message}"))
        }
        PictureRepositoryError::Query { message } => {
            DomainError::internal(format!("picture repository error: {message}"))
        }
    }
}

fn map_entry_repo_error(error: EntryRepositoryError) -> DomainError {
    match error {
        EntryRepositoryError::Connection { message } => {
            DomainError::service_unavailable(format!("entry repository unavailable: {message}"))
        }
        EntryRepositoryError::Query { message } => {
            DomainError::internal(format!("entry repository error: {message}"))
        }
    }
}

fn map_friendship_repo_error(error: FriendshipRepositoryError) -> DomainError {
    match error {
        FriendshipRepositoryError::Connection { message } => DomainError::service_unavailable(
            format!("friendship repository unavailable: {message}"),
        ),
        FriendshipRepositoryError::Query { message } => {
            DomainError::internal(format!("friendship repository error: {message}"))
        }
        FriendshipRepositoryError::DuplicateEdge => {
            DomainError::internal("unexpected duplicate friendship edge")
        }
    }
}

impl<P, E, F, C> MediaService<P, E, F, C>
where
    P: PictureRepository,
    E: EntryRepository,
    F: FriendshipRepository,
    C: EntryCache,
{
    async fn owned_entry(&self, owner: &UserId, id: &EntryId) -> Result<DiaryEntry, DomainError> {
        let entry = self
            .entries
            .find_by_id(id)
            .await
            .map_err(map_entry_repo_error)?
            .ok_or_else(|| DomainError::not_found("entry not found"))?;
        if entry.owner_id != *owner {
            return Err(DomainError::not_found("entry not found"));
        }
        Ok(entry)
    }

    async fn ordered_views(&self, entry: &EntryId) -> Result<Vec<PictureView>, DomainError> {
        let rows = self
            .pictures
            .list_by_entry(entry)
            .await
            .map_err(map_picture_repo_error)?;
        Ok(rows.iter().map(PictureView::from).collect())
    }

    /// Drop every cached payload that embeds the entry's picture list.
    async fn invalidate_entry(&self, owner: &UserId, entry: &EntryId) {
        let token = entry.to_string();
        self.cache
            .remove(&CacheKey::new(CacheNamespace::PublicEntry, token.clone()))
            .await;
        self.cache
            .purge_prefix(CacheNamespace::UserEntry, &format!("{token}:"))
            .await;
        self.cache
            .purge_prefix(CacheNamespace::UserEntries, &owner.to_string())
            .await;
        self.cache.purge(CacheNamespace::PublicList).await;
    }
}

#[async_trait]
impl<P, E, F, C> MediaPort for MediaService<P, E, F, C>
where
    P: PictureRepository,
    E: EntryRepository,
    F: FriendshipRepository,
    C: EntryCache,
{
    async fn attach(
        &self,
        owner: &UserId,
        entry: &EntryId,
        metadata: NewPictureMetadata,
    ) -> Result<PictureView, DomainError> {
        if metadata.file_host_id.trim().is_empty() || metadata.url.trim().is_empty() {
            return Err(DomainError::invalid_request(
                "file host id and url are required",
            ));
        }
        self.owned_entry(owner, entry).await?;

        let sort_order = match metadata.sort_order {
            Some(order) => order,
            None => {
                let existing = self
                    .pictures
                    .list_by_entry(entry)
                    .await
                    .map_err(map_picture_repo_error)?;
                existing
                    .iter()
                    .map(|p| p.sort_order)
                    .max()
                    .map_or(0, |max| max.saturating_add(1))
            }
        };
        let picture = Picture {
            id: PictureId::random(),
            owner_id: *owner,
            entry_id: *entry,
            file_host_id: metadata.file_host_id,
            url: metadata.url,
            created_at: Utc::now(),
            sort_order,
        };
        self.pictures
            .insert(&picture)
            .await
            .map_err(map_picture_repo_error)?;
        self.invalidate_entry(owner, entry).await;
        tracing::info!(user_id = %owner, entry_id = %entry, picture_id = %picture.id, "picture attached");
        Ok(PictureView::from(&picture))
    }

    async fn entry_pictures(
        &self,
        viewer: &ViewerIdentity,
        entry: &EntryId,
    ) -> Result<Vec<PictureView>, DomainError> {
        let row = self
            .entries
            .find_by_id(entry)
            .await
            .map_err(map_entry_repo_error)?
            .ok_or_else(|| DomainError::not_found("entry not found"))?;
        let edges = self
            .friendships
            .list_for_user(&row.owner_id)
            .await
            .map_err(map_friendship_repo_error)?;
        let friends = FriendshipSnapshot::for_owner(&row.owner_id, &edges);
        if !can_view_entry(&row.owner_id, row.privacy, viewer, &friends) {
            return Err(DomainError::not_found("entry not found"));
        }
        self.ordered_views(entry).await
    }

    async fn delete(
        &self,
        owner: &UserId,
        picture: &PictureId,
    ) -> Result<PictureDeleteReceipt, DomainError> {
        let row = self
            .pictures
            .find_by_id(picture)
            .await
            .map_err(map_picture_repo_error)?
            .ok_or_else(|| DomainError::not_found("picture not found"))?;
        if row.owner_id != *owner {
            return Err(DomainError::not_found("picture not found"));
        }
        let removed = self
            .pictures
            .delete(picture)
            .await
            .map_err(map_picture_repo_error)?;
        if !removed {
            return Err(DomainError::not_found("picture not found"));
        }
        self.invalidate_entry(&row.owner_id, &row.entry_id).await;
        tracing::info!(user_id = %owner, picture_id = %picture, "picture deleted");
        Ok(PictureDeleteReceipt {
            id: row.id,
            file_host_id: row.file_host_id,
        })
    }

    async fn reorder(
        &self,
        owner: &UserId,
        entry: &EntryId,
        ordered_ids: Vec<PictureId>,
    ) -> Result<Vec<PictureView>, DomainError> {
        self.owned_entry(owner, entry).await?;
        let current = self
            .pictures
            .list_by_entry(entry)
            .await
            .map_err(map_picture_repo_error)?;

        if ordered_ids.len() != current.len()
            || !current.iter().all(|p| ordered_ids.contains(&p.id))
        {
            return Err(DomainError::invalid_request(
                "reorder must list every attachment exactly once",
            ));
        }

        for (position, id) in ordered_ids.iter().enumerate() {
            let order = i32::try_from(position)
                .map_err(|_| DomainError::invalid_request("too many attachments"))?;
            self.pictures
                .set_sort_order(id, order)
                .await
                .map_err(map_picture_repo_error)?;
        }
        self.invalidate_entry(owner, entry).await;
        self.ordered_views(entry).await
    }
}
