//! Diary domain service.
//!
//! Implements [`DiaryPort`] over the entry, user, friendship, and picture
//! repositories plus the read-path cache. Visibility is enforced here, not
//! in handlers; a read the viewer is not allowed resolves as not-found so
//! the response never reveals that a hidden entry exists.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pagination::{Page, PageParams};

use crate::domain::dates::EntryDate;
use crate::domain::entry::{DiaryEntry, EntryId};
use crate::domain::error::DomainError;
use crate::domain::experience::{Experience, ENTRY_SAVE_AWARD};
use crate::domain::ports::{
    CacheKey, CacheNamespace, DeleteReceipt, DiaryPort, EntryCache, EntryChanges, EntryRepository,
    EntryRepositoryError, EntryView, EntryWithPictures, FeedEntry, FeedFilter,
    FriendshipRepository, FriendshipRepositoryError, NewEntry, PictureRepository,
    PictureRepositoryError, PictureView, SaveReceipt, UserRepository, UserRepositoryError,
};
use crate::domain::user::UserId;
use crate::domain::visibility::{can_view_entry, FriendshipSnapshot, ViewerIdentity};

/// Diary service implementing the driving port.
#[derive(Clone)]
pub struct DiaryService<E, U, F, P, C> {
    entries: Arc<E>,
    users: Arc<U>,
    friendships: Arc<F>,
    pictures: Arc<P>,
    cache: Arc<C>,
}

impl<E, U, F, P, C> DiaryService<E, U, F, P, C> {
    pub fn new(
        entries: Arc<E>,
        users: Arc<U>,
        friendships: Arc<F>,
        pictures: Arc<P>,
        cache: Arc<C>,
    ) -> Self {
        Self {
            entries,
            users,
            friendships,
            pictures,
            cache,
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

fn map_user_repo_error(error: UserRepositoryError) -> DomainError {
    match error {
        UserRepositoryError::Connection { message } => {
            DomainError::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            DomainError::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateIdentity => {
            DomainError::internal("unexpected duplicate identity")
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

fn entry_not_found() -> DomainError {
    DomainError::not_found("entry not found")
}

/// Cap `content` to `max` characters, marking the cut with an ellipsis.
fn truncate_content(content: &str, max: usize) -> String {
    if content.chars().count() <= max {
        return content.to_owned();
    }
    let mut cut: String = content.chars().take(max).collect();
    cut.push('…');
    cut
}

fn matches_search(entry: &DiaryEntry, needle: &str) -> bool {
    entry.owner_username.normalized().contains(needle)
        || entry.title.to_lowercase().contains(needle)
        || entry.date.iso().contains(needle)
        || entry.content.to_lowercase().contains(needle)
}

impl<E, U, F, P, C> DiaryService<E, U, F, P, C>
where
    E: EntryRepository,
    U: UserRepository,
    F: FriendshipRepository,
    P: PictureRepository,
    C: EntryCache,
{
    async fn owned_entry(
        &self,
        owner: &UserId,
        id: &EntryId,
    ) -> Result<DiaryEntry, DomainError> {
        let entry = self
            .entries
            .find_by_id(id)
            .await
            .map_err(map_entry_repo_error)?
            .ok_or_else(entry_not_found)?;
        if entry.owner_id != *owner {
            return Err(entry_not_found());
        }
        Ok(entry)
    }

    async fn latest_for_date(
        &self,
        owner: &UserId,
        date: EntryDate,
    ) -> Result<DiaryEntry, DomainError> {
        self.entries
            .find_latest_by_owner_date(owner, date)
            .await
            .map_err(map_entry_repo_error)?
            .ok_or_else(entry_not_found)
    }

    async fn apply_update(
        &self,
        mut entry: DiaryEntry,
        changes: EntryChanges,
    ) -> Result<EntryView, DomainError> {
        if changes.is_empty() {
            return Err(DomainError::invalid_request("no fields to update"));
        }
        if let Some(title) = changes.title {
            entry.title = title;
        }
        if let Some(content) = changes.content {
            entry.content = content;
        }
        if let Some(privacy) = changes.privacy {
            entry.privacy = privacy;
        }
        entry.last_modified = Utc::now();
        let updated = self
            .entries
            .update(&entry)
            .await
            .map_err(map_entry_repo_error)?;
        if !updated {
            return Err(entry_not_found());
        }
        self.invalidate_entry(&entry.owner_id, &entry.id).await;
        Ok(EntryView::from(&entry))
    }

    /// Fill in the viewer's email so the friend-email fallback can match
    /// edges that predate stable user ids.
    async fn enriched_viewer(
        &self,
        viewer: &ViewerIdentity,
    ) -> Result<ViewerIdentity, DomainError> {
        if let Some(id) = &viewer.user_id
            && viewer.email.is_none()
        {
            let email = self
                .users
                .find_by_id(id)
                .await
                .map_err(map_user_repo_error)?
                .map(|user| user.email);
            return Ok(ViewerIdentity::new(Some(*id), email));
        }
        Ok(viewer.clone())
    }

    async fn pictures_for(&self, entry: &EntryId) -> Result<Vec<PictureView>, DomainError> {
        let rows = self
            .pictures
            .list_by_entry(entry)
            .await
            .map_err(map_picture_repo_error)?;
        Ok(rows.iter().map(PictureView::from).collect())
    }

    async fn invalidate_owner_lists(&self, owner: &UserId) {
        self.cache
            .purge_prefix(CacheNamespace::UserEntries, &owner.to_string())
            .await;
        self.cache.purge(CacheNamespace::PublicList).await;
    }

    async fn invalidate_entry(&self, owner: &UserId, entry: &EntryId) {
        let token = entry.to_string();
        self.cache
            .remove(&CacheKey::new(CacheNamespace::PublicEntry, token.clone()))
            .await;
        self.cache
            .purge_prefix(CacheNamespace::UserEntry, &format!("{token}:"))
            .await;
        self.invalidate_owner_lists(owner).await;
    }
}

#[async_trait]
impl<E, U, F, P, C> DiaryPort for DiaryService<E, U, F, P, C>
where
    E: EntryRepository,
    U: UserRepository,
    F: FriendshipRepository,
    P: PictureRepository,
    C: EntryCache,
{
    async fn save_entry(
        &self,
        owner: &UserId,
        entry: NewEntry,
    ) -> Result<SaveReceipt, DomainError> {
        let account = self
            .users
            .find_by_id(owner)
            .await
            .map_err(map_user_repo_error)?
            .ok_or_else(|| DomainError::not_found("account not found"))?;

        let now = Utc::now();
        let row = DiaryEntry {
            id: EntryId::random(),
            owner_id: *owner,
            owner_username: account.username.clone(),
            date: entry.date,
            title: entry.title,
            content: entry.content,
            privacy: entry.privacy,
            created_at: now,
            last_modified: now,
        };
        self.entries
            .insert(&row)
            .await
            .map_err(map_entry_repo_error)?;
        let total = self
            .users
            .grant_experience(owner, ENTRY_SAVE_AWARD)
            .await
            .map_err(map_user_repo_error)?;
        self.invalidate_owner_lists(owner).await;
        tracing::info!(user_id = %owner, entry_id = %row.id, "entry saved");

        Ok(SaveReceipt {
            entry: EntryView::from(&row),
            experience: total,
            level: Experience::new(total).level(),
        })
    }

    async fn update_by_date(
        &self,
        owner: &UserId,
        date: EntryDate,
        changes: EntryChanges,
    ) -> Result<EntryView, DomainError> {
        let entry = self.latest_for_date(owner, date).await?;
        self.apply_update(entry, changes).await
    }

    async fn update_by_id(
        &self,
        owner: &UserId,
        id: &EntryId,
        changes: EntryChanges,
    ) -> Result<EntryView, DomainError> {
        let entry = self.owned_entry(owner, id).await?;
        self.apply_update(entry, changes).await
    }

    async fn delete_by_date(
        &self,
        owner: &UserId,
        date: EntryDate,
    ) -> Result<DeleteReceipt, DomainError> {
        let entry = self.latest_for_date(owner, date).await?;
        self.delete_by_id(owner, &entry.id).await
    }

    async fn delete_by_id(
        &self,
        owner: &UserId,
        id: &EntryId,
    ) -> Result<DeleteReceipt, DomainError> {
        let entry = self.owned_entry(owner, id).await?;
        let file_host_ids = self
            .pictures
            .delete_by_entry(&entry.id)
            .await
            .map_err(map_picture_repo_error)?;
        let deleted = self
            .entries
            .delete(&entry.id)
            .await
            .map_err(map_entry_repo_error)?;
        if !deleted {
            return Err(entry_not_found());
        }
        self.invalidate_entry(owner, &entry.id).await;
        tracing::info!(user_id = %owner, entry_id = %entry.id, "entry deleted");
        Ok(DeleteReceipt {
            id: entry.id,
            file_host_ids,
        })
    }

    async fn toggle_privacy(
        &self,
        owner: &UserId,
        date: EntryDate,
    ) -> Result<EntryView, DomainError> {
        let entry = self.latest_for_date(owner, date).await?;
        let next = entry.privacy.toggled();
        self.apply_update(
            entry,
            EntryChanges {
                privacy: Some(next),
                ..EntryChanges::default()
            },
        )
        .await
    }

    async fn get_entry(
        &self,
        viewer: &ViewerIdentity,
        id: &EntryId,
    ) -> Result<EntryWithPictures, DomainError> {
        let key = CacheKey::entry_view(viewer.user_id.as_ref(), &id.to_string());
        if let Some(cached) = self.cache.get(&key).await
            && let Ok(view) = serde_json::from_value::<EntryWithPictures>(cached)
        {
            return Ok(view);
        }

        let entry = self
            .entries
            .find_by_id(id)
            .await
            .map_err(map_entry_repo_error)?
            .ok_or_else(entry_not_found)?;
        let viewer = self.enriched_viewer(viewer).await?;
        let edges = self
            .friendships
            .list_for_user(&entry.owner_id)
            .await
            .map_err(map_friendship_repo_error)?;
        let friends = FriendshipSnapshot::for_owner(&entry.owner_id, &edges);
        if !can_view_entry(&entry.owner_id, entry.privacy, &viewer, &friends) {
            return Err(entry_not_found());
        }

        let view = EntryWithPictures {
            entry: EntryView::from(&entry),
            pictures: self.pictures_for(&entry.id).await?,
        };
        if let Ok(payload) = serde_json::to_value(&view) {
            self.cache.put(key, payload).await;
        }
        Ok(view)
    }

    async fn entries_for_date(
        &self,
        owner: &UserId,
        date: EntryDate,
    ) -> Result<Vec<EntryView>, DomainError> {
        let key = CacheKey::new(CacheNamespace::UserEntries, format!("{owner}:{}", date.iso()));
        if let Some(cached) = self.cache.get(&key).await
            && let Ok(views) = serde_json::from_value::<Vec<EntryView>>(cached)
        {
            return Ok(views);
        }

        let mut rows = self
            .entries
            .list_by_owner_date(owner, date)
            .await
            .map_err(map_entry_repo_error)?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let views: Vec<EntryView> = rows.iter().map(EntryView::from).collect();
        if let Ok(payload) = serde_json::to_value(&views) {
            self.cache.put(key, payload).await;
        }
        Ok(views)
    }

    async fn list_own(&self, owner: &UserId) -> Result<Vec<EntryView>, DomainError> {
        let key = CacheKey::new(CacheNamespace::UserEntries, format!("{owner}:all"));
        if let Some(cached) = self.cache.get(&key).await
            && let Ok(views) = serde_json::from_value::<Vec<EntryView>>(cached)
        {
            return Ok(views);
        }

        let mut rows = self
            .entries
            .list_by_owner(owner)
            .await
            .map_err(map_entry_repo_error)?;
        rows.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        let views: Vec<EntryView> = rows.iter().map(EntryView::from).collect();
        if let Ok(payload) = serde_json::to_value(&views) {
            self.cache.put(key, payload).await;
        }
        Ok(views)
    }

    async fn feed(
        &self,
        viewer: &ViewerIdentity,
        filter: FeedFilter,
        page: PageParams,
    ) -> Result<Page<FeedEntry>, DomainError> {
        let key = CacheKey::feed_page(&filter.cache_token(viewer.user_id.as_ref(), page));
        if let Some(cached) = self.cache.get(&key).await
            && let Ok(cached_page) = serde_json::from_value::<Page<FeedEntry>>(cached)
        {
            return Ok(cached_page);
        }

        let username_filter = filter.username.as_ref().map(|u| u.to_lowercase());
        let mut candidates = self
            .entries
            .list_feed_candidates(username_filter.as_deref())
            .await
            .map_err(map_entry_repo_error)?;

        let viewer = self.enriched_viewer(viewer).await?;
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());
        candidates.retain(|entry| {
            let iso = entry.date.iso();
            if let Some(date) = &filter.date
                && iso != *date
            {
                return false;
            }
            if let Some(month) = &filter.month
                && entry.date.month_prefix() != *month
            {
                return false;
            }
            if let Some(year) = &filter.year
                && entry.date.year_prefix() != *year
            {
                return false;
            }
            if let Some(needle) = &needle
                && !matches_search(entry, needle)
            {
                return false;
            }
            true
        });

        // Snapshots come from each author's own edges, as in `get_entry`,
        // so edges recorded only by a friend's email still count.
        let mut owner_edges: HashMap<UserId, Vec<crate::domain::friendship::Friendship>> =
            HashMap::new();
        for entry in &candidates {
            if let Entry::Vacant(slot) = owner_edges.entry(entry.owner_id) {
                let edges = self
                    .friendships
                    .list_for_user(&entry.owner_id)
                    .await
                    .map_err(map_friendship_repo_error)?;
                slot.insert(edges);
            }
        }
        candidates.retain(|entry| {
            let edges = owner_edges
                .get(&entry.owner_id)
                .map_or(&[][..], Vec::as_slice);
            let friends = FriendshipSnapshot::for_owner(&entry.owner_id, edges);
            can_view_entry(&entry.owner_id, entry.privacy, &viewer, &friends)
        });
        candidates.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let window = page.paginate(candidates);
        let mut items = Vec::with_capacity(window.items.len());
        for entry in &window.items {
            let edges = owner_edges
                .get(&entry.owner_id)
                .map_or(&[][..], Vec::as_slice);
            let friends = FriendshipSnapshot::for_owner(&entry.owner_id, edges);
            let is_friend = match &viewer.user_id {
                Some(id) if *id != entry.owner_id => {
                    friends.contains_id(id)
                        || viewer
                            .email
                            .as_ref()
                            .is_some_and(|email| friends.contains_email(email))
                }
                _ => false,
            };
            let pictures = self
                .pictures_for(&entry.id)
                .await?
                .into_iter()
                .map(|p| p.url)
                .collect();
            let iso = entry.date.iso();
            items.push(FeedEntry {
                id: entry.id,
                username: entry.owner_username.as_str().to_owned(),
                display_date: crate::domain::dates::to_display_date(&iso),
                date: iso,
                title: entry.title.clone(),
                content: match filter.max_content {
                    Some(max) => truncate_content(&entry.content, max),
                    None => entry.content.clone(),
                },
                privacy: entry.privacy,
                is_friend,
                pictures,
                created_at: entry.created_at,
            });
        }
        let result = Page {
            items,
            total: window.total,
            has_more: window.has_more,
        };
        if let Ok(payload) = serde_json::to_value(&result) {
            self.cache.put(key, payload).await;
        }
        Ok(result)
    }
}
