//! Internal Diesel row structs for database operations.
//!
//! Implementation details of the persistence layer; never exposed to the
//! domain. Conversions back to domain types live in the repository files
//! next to the queries that produce the rows.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{diary_entries, friendships, pictures, users};

diesel::define_sql_function! {
    /// PostgreSQL `lower()`, used for case-insensitive lookups.
    fn lower(value: diesel::sql_types::Text) -> diesel::sql_types::Text
}

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub experience: i64,
    pub created_at: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub avatar_url: &'a str,
    pub experience: i64,
    pub created_at: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
}

/// Row struct for reading from the diary_entries table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = diary_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EntryRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_username: String,
    pub entry_date: NaiveDate,
    pub title: String,
    pub privacy: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

/// Insertable struct for creating new diary entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = diary_entries)]
pub(crate) struct NewEntryRow<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_username: &'a str,
    pub entry_date: NaiveDate,
    pub title: &'a str,
    pub privacy: &'a str,
    pub content: &'a str,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

/// Changeset applied when an entry is overwritten.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = diary_entries)]
pub(crate) struct EntryUpdate<'a> {
    pub title: &'a str,
    pub privacy: &'a str,
    pub content: &'a str,
    pub last_modified: DateTime<Utc>,
}

/// Row struct for reading from the friendships table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = friendships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FriendshipRow {
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub status: String,
    pub legacy_peer_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new friendship edges.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = friendships)]
pub(crate) struct NewFriendshipRow<'a> {
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub status: &'a str,
    pub legacy_peer_email: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the pictures table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = pictures)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PictureRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub entry_id: Uuid,
    pub file_host_id: String,
    pub url: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new picture attachments.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pictures)]
pub(crate) struct NewPictureRow<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub entry_id: Uuid,
    pub file_host_id: &'a str,
    pub url: &'a str,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}
