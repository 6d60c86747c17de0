//! PostgreSQL-backed `FriendshipRepository` implementation using Diesel ORM.
//!
//! The migrations install a unique index over the unordered pair
//! `(least(requester_id, recipient_id), greatest(...))`, so inserting a
//! reversed duplicate fails at the database even under concurrent requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use tracing::{debug, warn};

use crate::domain::ports::{FriendshipRepository, FriendshipRepositoryError};
use crate::domain::{Friendship, FriendshipStatus, UserId};

use super::models::{FriendshipRow, NewFriendshipRow};
use super::pool::{DbPool, PoolError};
use super::schema::friendships;

/// Diesel-backed implementation of the `FriendshipRepository` port.
#[derive(Clone)]
pub struct DieselFriendshipRepository {
    pool: DbPool,
}

impl DieselFriendshipRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> FriendshipRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            FriendshipRepositoryError::connection(message)
        }
    }
}

fn map_diesel_error(error: DieselError) -> FriendshipRepositoryError {
    if let DieselError::DatabaseError(kind, info) = &error {
        debug!(?kind, message = info.message(), "diesel operation failed");
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            FriendshipRepositoryError::DuplicateEdge
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            FriendshipRepositoryError::connection("database connection error")
        }
        DieselError::NotFound => FriendshipRepositoryError::query("record not found"),
        _ => FriendshipRepositoryError::query("database error"),
    }
}

fn row_to_friendship(row: FriendshipRow) -> Friendship {
    let status = match row.status.as_str() {
        "accepted" => FriendshipStatus::Accepted,
        "pending" => FriendshipStatus::Pending,
        other => {
            warn!(
                value = other,
                requester = %row.requester_id,
                "unrecognised friendship status, treating as pending"
            );
            FriendshipStatus::Pending
        }
    };
    Friendship {
        requester_id: UserId::from_uuid(row.requester_id),
        recipient_id: UserId::from_uuid(row.recipient_id),
        status,
        legacy_peer_email: row.legacy_peer_email,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

#[async_trait]
impl FriendshipRepository for DieselFriendshipRepository {
    async fn insert(&self, edge: &Friendship) -> Result<(), FriendshipRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = NewFriendshipRow {
            requester_id: *edge.requester_id.as_uuid(),
            recipient_id: *edge.recipient_id.as_uuid(),
            status: edge.status.as_str(),
            legacy_peer_email: edge.legacy_peer_email.as_deref(),
            created_at: edge.created_at,
            updated_at: edge.updated_at,
        };

        diesel::insert_into(friendships::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_edge(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Friendship>, FriendshipRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let forward = friendships::requester_id
            .eq(a.as_uuid())
            .and(friendships::recipient_id.eq(b.as_uuid()));
        let reverse = friendships::requester_id
            .eq(b.as_uuid())
            .and(friendships::recipient_id.eq(a.as_uuid()));

        let row: Option<FriendshipRow> = friendships::table
            .filter(forward.or(reverse))
            .select(FriendshipRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_friendship))
    }

    async fn mark_accepted(
        &self,
        requester: &UserId,
        recipient: &UserId,
        at: DateTime<Utc>,
    ) -> Result<bool, FriendshipRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(
            friendships::table
                .filter(friendships::requester_id.eq(requester.as_uuid()))
                .filter(friendships::recipient_id.eq(recipient.as_uuid()))
                .filter(friendships::status.eq("pending")),
        )
        .set((
            friendships::status.eq("accepted"),
            friendships::updated_at.eq(at),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn delete_pending(
        &self,
        requester: &UserId,
        recipient: &UserId,
    ) -> Result<bool, FriendshipRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(
            friendships::table
                .filter(friendships::requester_id.eq(requester.as_uuid()))
                .filter(friendships::recipient_id.eq(recipient.as_uuid()))
                .filter(friendships::status.eq("pending")),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }

    async fn delete_accepted(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<bool, FriendshipRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let forward = friendships::requester_id
            .eq(a.as_uuid())
            .and(friendships::recipient_id.eq(b.as_uuid()));
        let reverse = friendships::requester_id
            .eq(b.as_uuid())
            .and(friendships::recipient_id.eq(a.as_uuid()));

        let deleted = diesel::delete(
            friendships::table
                .filter(forward.or(reverse))
                .filter(friendships::status.eq("accepted")),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }

    async fn list_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<Friendship>, FriendshipRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<FriendshipRow> = friendships::table
            .filter(
                friendships::requester_id
                    .eq(user.as_uuid())
                    .or(friendships::recipient_id.eq(user.as_uuid())),
            )
            .order(friendships::created_at.desc())
            .select(FriendshipRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_friendship).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn friendship_row(status: &str) -> FriendshipRow {
        FriendshipRow {
            requester_id: uuid::Uuid::new_v4(),
            recipient_id: uuid::Uuid::new_v4(),
            status: status.to_owned(),
            legacy_peer_email: Some("friend@example.com".to_owned()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    #[case("pending", FriendshipStatus::Pending)]
    #[case("accepted", FriendshipStatus::Accepted)]
    #[case("unknown", FriendshipStatus::Pending)]
    fn status_parses_with_pending_fallback(
        #[case] stored: &str,
        #[case] expected: FriendshipStatus,
    ) {
        let edge = row_to_friendship(friendship_row(stored));
        assert_eq!(edge.status, expected);
        assert_eq!(edge.legacy_peer_email.as_deref(), Some("friend@example.com"));
    }

    #[rstest]
    fn unique_violation_maps_to_duplicate_edge() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );
        assert_eq!(map_diesel_error(error), FriendshipRepositoryError::DuplicateEdge);
    }
}
