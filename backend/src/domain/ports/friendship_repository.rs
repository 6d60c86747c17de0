//! Port abstraction for friendship edge persistence adapters.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::friendship::{Friendship, FriendshipStatus};
use crate::domain::user::UserId;

/// Persistence errors raised by friendship repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FriendshipRepositoryError {
    /// Repository connection could not be established.
    #[error("friendship repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("friendship repository query failed: {message}")]
    Query { message: String },
    /// An edge already exists for this unordered pair.
    #[error("friendship edge already exists")]
    DuplicateEdge,
}

impl FriendshipRepositoryError {
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

/// Storage port for the friends graph.
///
/// At most one edge exists per unordered pair; `insert` enforces this.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FriendshipRepository: Send + Sync {
    /// Persist a new edge; fails with [`FriendshipRepositoryError::DuplicateEdge`]
    /// when the pair is already linked in either direction.
    async fn insert(&self, edge: &Friendship) -> Result<(), FriendshipRepositoryError>;

    /// The edge linking `a` and `b` in either direction, if any.
    async fn find_edge(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Friendship>, FriendshipRepositoryError>;

    /// Promote a pending request to accepted; returns `false` when no such
    /// pending edge exists.
    async fn mark_accepted(
        &self,
        requester: &UserId,
        recipient: &UserId,
        at: DateTime<Utc>,
    ) -> Result<bool, FriendshipRepositoryError>;

    /// Remove a pending request; returns `false` when no such edge exists.
    async fn delete_pending(
        &self,
        requester: &UserId,
        recipient: &UserId,
    ) -> Result<bool, FriendshipRepositoryError>;

    /// Remove an accepted edge between `a` and `b` in either direction;
    /// returns `false` when the pair is not linked.
    async fn delete_accepted(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<bool, FriendshipRepositoryError>;

    /// Every edge involving `user`, pending or accepted.
    async fn list_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<Friendship>, FriendshipRepositoryError>;
}

/// In-memory adapter backing tests and database-less deployments.
#[derive(Debug, Default)]
pub struct MemoryFriendshipRepository {
    rows: RwLock<Vec<Friendship>>,
}

impl MemoryFriendshipRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_poisoned() -> FriendshipRepositoryError {
        FriendshipRepositoryError::query("friendship store lock poisoned")
    }
}

#[async_trait]
impl FriendshipRepository for MemoryFriendshipRepository {
    async fn insert(&self, edge: &Friendship) -> Result<(), FriendshipRepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        if rows
            .iter()
            .any(|row| row.links(&edge.requester_id, &edge.recipient_id))
        {
            return Err(FriendshipRepositoryError::DuplicateEdge);
        }
        rows.push(edge.clone());
        Ok(())
    }

    async fn find_edge(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Friendship>, FriendshipRepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows.iter().find(|row| row.links(a, b)).cloned())
    }

    async fn mark_accepted(
        &self,
        requester: &UserId,
        recipient: &UserId,
        at: DateTime<Utc>,
    ) -> Result<bool, FriendshipRepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        match rows.iter_mut().find(|row| {
            row.requester_id == *requester
                && row.recipient_id == *recipient
                && row.status == FriendshipStatus::Pending
        }) {
            Some(row) => {
                row.status = FriendshipStatus::Accepted;
                row.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_pending(
        &self,
        requester: &UserId,
        recipient: &UserId,
    ) -> Result<bool, FriendshipRepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        let before = rows.len();
        rows.retain(|row| {
            !(row.requester_id == *requester
                && row.recipient_id == *recipient
                && row.status == FriendshipStatus::Pending)
        });
        Ok(rows.len() != before)
    }

    async fn delete_accepted(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<bool, FriendshipRepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        let before = rows.len();
        rows.retain(|row| !(row.links(a, b) && row.status == FriendshipStatus::Accepted));
        Ok(rows.len() != before)
    }

    async fn list_for_user(
        &self,
        user: &UserId,
    ) -> Result<Vec<Friendship>, FriendshipRepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows.iter().filter(|row| row.involves(user)).cloned().collect())
    }
}
