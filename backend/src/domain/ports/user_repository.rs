//! Port abstraction for user persistence adapters.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::user::{User, UserId};

/// Persistence errors raised by user repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserRepositoryError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query { message: String },
    /// Email or username already taken (case-insensitive).
    #[error("email or username already exists")]
    DuplicateIdentity,
}

impl UserRepositoryError {
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

/// Storage port for user accounts.
///
/// Lookups by email and username take pre-normalised (lower-cased) keys so
/// adapters stay oblivious to the folding rules.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account; fails with [`UserRepositoryError::DuplicateIdentity`]
    /// when the email or username is already taken.
    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Fetch an account by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch an account by normalised email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch an account by normalised username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserRepositoryError>;

    /// Record account activity for the last-seen timestamp.
    async fn touch_last_seen(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError>;

    /// Replace the stored avatar URL.
    async fn set_avatar(&self, id: &UserId, avatar_url: &str) -> Result<(), UserRepositoryError>;

    /// Add experience points; returns the new total.
    ///
    /// Experience is monotonic, so the delta is always positive.
    async fn grant_experience(&self, id: &UserId, amount: u64)
    -> Result<u64, UserRepositoryError>;

    /// Case-insensitive username substring search, capped at `limit` rows.
    async fn search_by_username(
        &self,
        fragment: &str,
        limit: usize,
    ) -> Result<Vec<User>, UserRepositoryError>;
}

/// In-memory adapter backing tests and database-less deployments.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    rows: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_poisoned() -> UserRepositoryError {
        UserRepositoryError::query("user store lock poisoned")
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        let email = user.email.normalized();
        let username = user.username.normalized();
        let taken = rows
            .values()
            .any(|row| row.email.normalized() == email || row.username.normalized() == username);
        if taken {
            return Err(UserRepositoryError::DuplicateIdentity);
        }
        rows.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows
            .values()
            .find(|row| row.email.normalized() == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserRepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows
            .values()
            .find(|row| row.username.normalized() == username)
            .cloned())
    }

    async fn touch_last_seen(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        if let Some(row) = rows.get_mut(id) {
            row.last_seen = Some(at);
        }
        Ok(())
    }

    async fn set_avatar(&self, id: &UserId, avatar_url: &str) -> Result<(), UserRepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        if let Some(row) = rows.get_mut(id) {
            row.avatar_url = avatar_url.to_owned();
        }
        Ok(())
    }

    async fn grant_experience(
        &self,
        id: &UserId,
        amount: u64,
    ) -> Result<u64, UserRepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        let row = rows
            .get_mut(id)
            .ok_or_else(|| UserRepositoryError::query("user not found for experience grant"))?;
        row.experience = row.experience.granted(amount);
        Ok(row.experience.points())
    }

    async fn search_by_username(
        &self,
        fragment: &str,
        limit: usize,
    ) -> Result<Vec<User>, UserRepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        let needle = fragment.to_lowercase();
        let mut matches: Vec<User> = rows
            .values()
            .filter(|row| row.username.normalized().contains(&needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.username.normalized().cmp(&b.username.normalized()));
        matches.truncate(limit);
        Ok(matches)
    }
}
