//! Driving port for diary entry operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageParams};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::dates::{to_display_date, EntryDate};
use crate::domain::entry::{DiaryEntry, EntryId, PrivacyTier};
use crate::domain::error::DomainError;
use crate::domain::user::UserId;
use crate::domain::visibility::ViewerIdentity;

use super::media::PictureView;

/// An entry as returned to its owner or an allowed viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    pub id: EntryId,
    pub username: String,
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    /// The same date as `DD-MM-YYYY`.
    pub display_date: String,
    pub title: String,
    pub content: String,
    pub privacy: PrivacyTier,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl From<&DiaryEntry> for EntryView {
    fn from(entry: &DiaryEntry) -> Self {
        let iso = entry.date.iso();
        Self {
            id: entry.id,
            username: entry.owner_username.as_str().to_owned(),
            display_date: to_display_date(&iso),
            date: iso,
            title: entry.title.clone(),
            content: entry.content.clone(),
            privacy: entry.privacy,
            created_at: entry.created_at,
            last_modified: entry.last_modified,
        }
    }
}

/// An entry together with its attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryWithPictures {
    #[serde(flatten)]
    pub entry: EntryView,
    pub pictures: Vec<PictureView>,
}

/// A public feed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub id: EntryId,
    pub username: String,
    pub date: String,
    pub display_date: String,
    pub title: String,
    /// Entry body, truncated with a trailing ellipsis when the filter caps
    /// content length.
    pub content: String,
    pub privacy: PrivacyTier,
    /// Whether the viewer and the author share an accepted friendship.
    pub is_friend: bool,
    /// Attachment URLs in display order.
    pub pictures: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Receipt for a saved entry, including the experience award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    #[serde(flatten)]
    pub entry: EntryView,
    /// Owner's experience total after the save award.
    pub experience: u64,
    /// Owner's level after the save award.
    pub level: u32,
}

/// Receipt for a deleted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReceipt {
    pub id: EntryId,
    /// File host ids of cascaded attachments, for remote cleanup.
    pub file_host_ids: Vec<String>,
}

/// Fields accepted when creating an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub date: EntryDate,
    pub title: String,
    pub content: String,
    pub privacy: PrivacyTier,
}

/// Fields accepted when updating an entry; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub privacy: Option<PrivacyTier>,
}

impl EntryChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.privacy.is_none()
    }
}

/// Public feed filters; all optional and combinable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilter {
    /// Restrict to one author username.
    pub username: Option<String>,
    /// Exact ISO date.
    pub date: Option<String>,
    /// `YYYY-MM` month prefix.
    pub month: Option<String>,
    /// `YYYY` year prefix.
    pub year: Option<String>,
    /// Case-insensitive needle over username, title, date, and content.
    pub search: Option<String>,
    /// Cap content to this many characters, appending an ellipsis.
    pub max_content: Option<usize>,
}

impl FeedFilter {
    /// Stable token for cache keying.
    pub fn cache_token(&self, viewer: Option<&UserId>, page: PageParams) -> String {
        format!(
            "u={}&d={}&m={}&y={}&q={}&c={}&v={}&l={}&o={}",
            self.username.as_deref().unwrap_or(""),
            self.date.as_deref().unwrap_or(""),
            self.month.as_deref().unwrap_or(""),
            self.year.as_deref().unwrap_or(""),
            self.search.as_deref().unwrap_or(""),
            self.max_content.map_or(String::new(), |c| c.to_string()),
            viewer.map_or(String::new(), ToString::to_string),
            page.limit(),
            page.offset(),
        )
    }
}

/// Driving port for diary operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiaryPort: Send + Sync {
    /// Create an entry and award experience to its owner.
    async fn save_entry(&self, owner: &UserId, entry: NewEntry)
    -> Result<SaveReceipt, DomainError>;

    /// Update the latest entry on `date`.
    async fn update_by_date(
        &self,
        owner: &UserId,
        date: EntryDate,
        changes: EntryChanges,
    ) -> Result<EntryView, DomainError>;

    /// Update one entry by id.
    async fn update_by_id(
        &self,
        owner: &UserId,
        id: &EntryId,
        changes: EntryChanges,
    ) -> Result<EntryView, DomainError>;

    /// Delete the latest entry on `date`, cascading attachments.
    async fn delete_by_date(
        &self,
        owner: &UserId,
        date: EntryDate,
    ) -> Result<DeleteReceipt, DomainError>;

    /// Delete one entry by id, cascading attachments.
    async fn delete_by_id(
        &self,
        owner: &UserId,
        id: &EntryId,
    ) -> Result<DeleteReceipt, DomainError>;

    /// Flip the latest entry on `date` between private and public.
    async fn toggle_privacy(
        &self,
        owner: &UserId,
        date: EntryDate,
    ) -> Result<EntryView, DomainError>;

    /// Fetch one entry with attachments, subject to visibility rules.
    async fn get_entry(
        &self,
        viewer: &ViewerIdentity,
        id: &EntryId,
    ) -> Result<EntryWithPictures, DomainError>;

    /// The owner's own entries on `date`, newest first.
    async fn entries_for_date(
        &self,
        owner: &UserId,
        date: EntryDate,
    ) -> Result<Vec<EntryView>, DomainError>;

    /// Every entry the owner has written, newest date first.
    async fn list_own(&self, owner: &UserId) -> Result<Vec<EntryView>, DomainError>;

    /// Entries visible to `viewer`, filtered and paginated.
    async fn feed(
        &self,
        viewer: &ViewerIdentity,
        filter: FeedFilter,
        page: PageParams,
    ) -> Result<Page<FeedEntry>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_token_is_stable_and_distinguishes_filters() {
        let page = PageParams::from_raw(Some(10), Some(0)).expect("valid page");
        let base = FeedFilter::default();
        let filtered = FeedFilter {
            username: Some("reader_01".into()),
            ..FeedFilter::default()
        };
        assert_eq!(base.cache_token(None, page), base.cache_token(None, page));
        assert_ne!(base.cache_token(None, page), filtered.cache_token(None, page));
    }

    #[test]
    fn cache_token_separates_viewers() {
        let page = PageParams::from_raw(None, None).expect("valid page");
        let filter = FeedFilter::default();
        let viewer = UserId::random();
        assert_ne!(
            filter.cache_token(None, page),
            filter.cache_token(Some(&viewer), page)
        );
    }
}
