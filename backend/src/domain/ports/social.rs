//! Driving port for the friends graph and user discovery.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::error::DomainError;
use crate::domain::user::UserId;

/// An accepted friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FriendView {
    pub username: String,
    pub avatar_url: String,
    pub level: u32,
    /// When the friendship was accepted.
    pub since: DateTime<Utc>,
}

/// A pending request, seen from either side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestView {
    /// The peer on the other side of the request.
    pub username: String,
    pub avatar_url: String,
    pub requested_at: DateTime<Utc>,
}

/// The complete friendship state for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FriendshipsOverview {
    pub friends: Vec<FriendView>,
    /// Requests this user sent that are still pending.
    pub sent: Vec<FriendRequestView>,
    /// Requests awaiting this user's decision.
    pub received: Vec<FriendRequestView>,
}

/// A row in the user search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchResult {
    pub username: String,
    pub avatar_url: String,
    pub level: u32,
    /// Whether the searcher already shares an accepted friendship.
    pub is_friend: bool,
    /// Whether a request between the pair is pending in either direction.
    pub request_pending: bool,
}

/// A public profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub username: String,
    pub avatar_url: String,
    pub level: u32,
    pub experience: u64,
    pub member_since: DateTime<Utc>,
    /// Count of the profile owner's entries the viewer may see.
    pub total_entries: usize,
    /// ISO date of the newest visible entry, if any.
    pub last_entry: Option<String>,
    pub is_friend: bool,
}

/// Driving port for friendship operations.
///
/// Peers are addressed by username; resolution to ids happens inside the
/// service so handlers never leak identifiers the client did not supply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialPort: Send + Sync {
    /// Send a friend request to `username`.
    async fn send_request(&self, user: &UserId, username: &str) -> Result<(), DomainError>;

    /// Accept a pending request from `username`.
    async fn accept_request(&self, user: &UserId, username: &str) -> Result<(), DomainError>;

    /// Decline a pending request from `username`.
    async fn decline_request(&self, user: &UserId, username: &str) -> Result<(), DomainError>;

    /// Withdraw a pending request previously sent to `username`.
    async fn cancel_request(&self, user: &UserId, username: &str) -> Result<(), DomainError>;

    /// Dissolve an accepted friendship with `username`.
    async fn remove_friend(&self, user: &UserId, username: &str) -> Result<(), DomainError>;

    /// Friends plus pending requests in both directions.
    async fn overview(&self, user: &UserId) -> Result<FriendshipsOverview, DomainError>;

    /// Username substring search, excluding the searcher.
    async fn search_users(
        &self,
        user: &UserId,
        query: &str,
    ) -> Result<Vec<UserSearchResult>, DomainError>;

    /// Public profile for `username` as seen by an optional viewer.
    async fn profile<'a>(
        &self,
        viewer: Option<&'a UserId>,
        username: &str,
    ) -> Result<ProfileView, DomainError>;
}
