//! Port abstraction for diary entry persistence adapters.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::dates::EntryDate;
use crate::domain::entry::{DiaryEntry, EntryId};
use crate::domain::user::UserId;

/// Persistence errors raised by entry repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryRepositoryError {
    /// Repository connection could not be established.
    #[error("entry repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("entry repository query failed: {message}")]
    Query { message: String },
}

impl EntryRepositoryError {
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

/// Storage port for diary entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Persist a new entry.
    async fn insert(&self, entry: &DiaryEntry) -> Result<(), EntryRepositoryError>;

    /// Fetch an entry by id.
    async fn find_by_id(&self, id: &EntryId) -> Result<Option<DiaryEntry>, EntryRepositoryError>;

    /// The most recently created entry for (owner, date), if any.
    ///
    /// By-date updates and deletes act on this entry when several share the
    /// date.
    async fn find_latest_by_owner_date(
        &self,
        owner: &UserId,
        date: EntryDate,
    ) -> Result<Option<DiaryEntry>, EntryRepositoryError>;

    /// Every entry for (owner, date).
    async fn list_by_owner_date(
        &self,
        owner: &UserId,
        date: EntryDate,
    ) -> Result<Vec<DiaryEntry>, EntryRepositoryError>;

    /// Every entry owned by `owner`.
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<DiaryEntry>, EntryRepositoryError>;

    /// Feed candidates, optionally narrowed to one owner username
    /// (normalised). Visibility, search, and pagination happen above this
    /// port.
    async fn list_feed_candidates<'a>(
        &self,
        owner_username: Option<&'a str>,
    ) -> Result<Vec<DiaryEntry>, EntryRepositoryError>;

    /// Overwrite an existing entry; returns `false` when it no longer exists.
    async fn update(&self, entry: &DiaryEntry) -> Result<bool, EntryRepositoryError>;

    /// Delete an entry; returns `false` when it did not exist.
    async fn delete(&self, id: &EntryId) -> Result<bool, EntryRepositoryError>;
}

/// In-memory adapter backing tests and database-less deployments.
#[derive(Debug, Default)]
pub struct MemoryEntryRepository {
    rows: RwLock<Vec<DiaryEntry>>,
}

impl MemoryEntryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_poisoned() -> EntryRepositoryError {
        EntryRepositoryError::query("entry store lock poisoned")
    }
}

#[async_trait]
impl EntryRepository for MemoryEntryRepository {
    async fn insert(&self, entry: &DiaryEntry) -> Result<(), EntryRepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        rows.push(entry.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &EntryId) -> Result<Option<DiaryEntry>, EntryRepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows.iter().find(|row| row.id == *id).cloned())
    }

    async fn find_latest_by_owner_date(
        &self,
        owner: &UserId,
        date: EntryDate,
    ) -> Result<Option<DiaryEntry>, EntryRepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows
            .iter()
            .filter(|row| row.owner_id == *owner && row.date == date)
            .max_by_key(|row| row.created_at)
            .cloned())
    }

    async fn list_by_owner_date(
        &self,
        owner: &UserId,
        date: EntryDate,
    ) -> Result<Vec<DiaryEntry>, EntryRepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows
            .iter()
            .filter(|row| row.owner_id == *owner && row.date == date)
            .cloned()
            .collect())
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<DiaryEntry>, EntryRepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows
            .iter()
            .filter(|row| row.owner_id == *owner)
            .cloned()
            .collect())
    }

    async fn list_feed_candidates<'a>(
        &self,
        owner_username: Option<&'a str>,
    ) -> Result<Vec<DiaryEntry>, EntryRepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows
            .iter()
            .filter(|row| match owner_username {
                Some(needle) => row.owner_username.normalized() == needle,
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn update(&self, entry: &DiaryEntry) -> Result<bool, EntryRepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        match rows.iter_mut().find(|row| row.id == entry.id) {
            Some(row) => {
                *row = entry.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &EntryId) -> Result<bool, EntryRepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        let before = rows.len();
        rows.retain(|row| row.id != *id);
        Ok(rows.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry::PrivacyTier;
    use crate::domain::user::Username;
    use chrono::{Duration, Utc};

    fn entry(owner: UserId, date: &str, created_offset_secs: i64) -> DiaryEntry {
        DiaryEntry {
            id: EntryId::random(),
            owner_id: owner,
            owner_username: Username::parse("reader_01").expect("valid username"),
            date: EntryDate::parse(date).expect("valid date"),
            title: "title".into(),
            content: "content".into(),
            privacy: PrivacyTier::Public,
            created_at: Utc::now() + Duration::seconds(created_offset_secs),
            last_modified: Utc::now(),
        }
    }

    #[tokio::test]
    async fn same_date_entries_coexist() {
        let repo = MemoryEntryRepository::new();
        let owner = UserId::random();
        repo.insert(&entry(owner, "2024-01-01", 0)).await.expect("insert");
        repo.insert(&entry(owner, "2024-01-01", 1)).await.expect("insert");
        let date = EntryDate::parse("2024-01-01").expect("valid date");
        let listed = repo.list_by_owner_date(&owner, date).await.expect("list");
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn latest_by_date_prefers_newest_creation() {
        let repo = MemoryEntryRepository::new();
        let owner = UserId::random();
        let older = entry(owner, "2024-01-01", 0);
        let newer = entry(owner, "2024-01-01", 60);
        repo.insert(&older).await.expect("insert");
        repo.insert(&newer).await.expect("insert");
        let date = EntryDate::parse("2024-01-01").expect("valid date");
        let found = repo
            .find_latest_by_owner_date(&owner, date)
            .await
            .expect("lookup")
            .expect("entry present");
        assert_eq!(found.id, newer.id);
    }

    #[tokio::test]
    async fn delete_reports_absence() {
        let repo = MemoryEntryRepository::new();
        let owner = UserId::random();
        let row = entry(owner, "2024-01-01", 0);
        repo.insert(&row).await.expect("insert");
        assert_eq!(repo.delete(&row.id).await, Ok(true));
        assert_eq!(repo.delete(&row.id).await, Ok(false));
    }
}
