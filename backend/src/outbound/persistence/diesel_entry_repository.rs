//! PostgreSQL-backed `EntryRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{EntryRepository, EntryRepositoryError};
use crate::domain::{DiaryEntry, EntryDate, EntryId, PrivacyTier, UserId, Username};

use super::models::{lower, EntryRow, EntryUpdate, NewEntryRow};
use super::pool::{DbPool, PoolError};
use super::schema::diary_entries;

/// Diesel-backed implementation of the `EntryRepository` port.
#[derive(Clone)]
pub struct DieselEntryRepository {
    pool: DbPool,
}

impl DieselEntryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> EntryRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            EntryRepositoryError::connection(message)
        }
    }
}

fn map_diesel_error(error: DieselError) -> EntryRepositoryError {
    if let DieselError::DatabaseError(kind, info) = &error {
        debug!(?kind, message = info.message(), "diesel operation failed");
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            EntryRepositoryError::connection("database connection error")
        }
        DieselError::NotFound => EntryRepositoryError::query("record not found"),
        _ => EntryRepositoryError::query("database error"),
    }
}

/// Convert a database row to a domain entry.
///
/// Privacy folds through the same normalisation as the API boundary, so
/// legacy values survive. A username that fails current validation marks
/// the row as corrupt.
fn row_to_entry(row: EntryRow) -> Result<DiaryEntry, EntryRepositoryError> {
    let owner_username = Username::parse(&row.owner_username)
        .map_err(|_| EntryRepositoryError::query("stored username fails validation"))?;
    Ok(DiaryEntry {
        id: EntryId::from_uuid(row.id),
        owner_id: UserId::from_uuid(row.owner_id),
        owner_username,
        date: EntryDate::from_naive(row.entry_date),
        title: row.title,
        content: row.content,
        privacy: PrivacyTier::normalize(Some(&row.privacy), None),
        created_at: row.created_at,
        last_modified: row.last_modified,
    })
}

#[async_trait]
impl EntryRepository for DieselEntryRepository {
    async fn insert(&self, entry: &DiaryEntry) -> Result<(), EntryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewEntryRow {
            id: *entry.id.as_uuid(),
            owner_id: *entry.owner_id.as_uuid(),
            owner_username: entry.owner_username.as_str(),
            entry_date: entry.date.as_naive(),
            title: &entry.title,
            privacy: entry.privacy.as_str(),
            content: &entry.content,
            created_at: entry.created_at,
            last_modified: entry.last_modified,
        };

        diesel::insert_into(diary_entries::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &EntryId) -> Result<Option<DiaryEntry>, EntryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<EntryRow> = diary_entries::table
            .find(id.as_uuid())
            .select(EntryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_entry).transpose()
    }

    async fn find_latest_by_owner_date(
        &self,
        owner: &UserId,
        date: EntryDate,
    ) -> Result<Option<DiaryEntry>, EntryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<EntryRow> = diary_entries::table
            .filter(diary_entries::owner_id.eq(owner.as_uuid()))
            .filter(diary_entries::entry_date.eq(date.as_naive()))
            .order(diary_entries::created_at.desc())
            .select(EntryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_entry).transpose()
    }

    async fn list_by_owner_date(
        &self,
        owner: &UserId,
        date: EntryDate,
    ) -> Result<Vec<DiaryEntry>, EntryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<EntryRow> = diary_entries::table
            .filter(diary_entries::owner_id.eq(owner.as_uuid()))
            .filter(diary_entries::entry_date.eq(date.as_naive()))
            .order(diary_entries::created_at.desc())
            .select(EntryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_entry).collect()
    }

    async fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<DiaryEntry>, EntryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<EntryRow> = diary_entries::table
            .filter(diary_entries::owner_id.eq(owner.as_uuid()))
            .order(diary_entries::created_at.desc())
            .select(EntryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_entry).collect()
    }

    async fn list_feed_candidates<'a>(
        &self,
        owner_username: Option<&'a str>,
    ) -> Result<Vec<DiaryEntry>, EntryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = diary_entries::table.into_boxed();
        if let Some(needle) = owner_username {
            query = query.filter(lower(diary_entries::owner_username).eq(needle.to_owned()));
        }

        let rows: Vec<EntryRow> = query
            .order(diary_entries::created_at.desc())
            .select(EntryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_entry).collect()
    }

    async fn update(&self, entry: &DiaryEntry) -> Result<bool, EntryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changes = EntryUpdate {
            title: &entry.title,
            privacy: entry.privacy.as_str(),
            content: &entry.content,
            last_modified: entry.last_modified,
        };

        let updated = diesel::update(diary_entries::table.find(entry.id.as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn delete(&self, id: &EntryId) -> Result<bool, EntryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(diary_entries::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}
