//! Friendship edges between users.
//!
//! An edge is directional while `pending` (only the recipient may accept or
//! decline) and undirected once `accepted`. At most one edge exists per
//! unordered pair; repositories enforce this on insert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::user::UserId;

/// Lifecycle state of a friendship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    /// Requested but not yet accepted by the recipient.
    Pending,
    /// Both sides count as friends.
    Accepted,
}

impl FriendshipStatus {
    /// Wire form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }
}

/// An edge in the friends graph.
///
/// `legacy_peer_email` carries the friend-email fallback some historical
/// rows stored instead of a recipient id; the visibility rule consults it
/// when an id match fails.
#[derive(Debug, Clone, PartialEq)]
pub struct Friendship {
    pub requester_id: UserId,
    pub recipient_id: UserId,
    pub status: FriendshipStatus,
    pub legacy_peer_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Friendship {
    /// Whether this edge connects `a` and `b` in either direction.
    pub fn links(&self, a: &UserId, b: &UserId) -> bool {
        (self.requester_id == *a && self.recipient_id == *b)
            || (self.requester_id == *b && self.recipient_id == *a)
    }

    /// Whether `user` participates in this edge.
    pub fn involves(&self, user: &UserId) -> bool {
        self.requester_id == *user || self.recipient_id == *user
    }

    /// The other participant, if `user` is one of the two.
    pub fn peer_of(&self, user: &UserId) -> Option<UserId> {
        if self.requester_id == *user {
            Some(self.recipient_id)
        } else if self.recipient_id == *user {
            Some(self.requester_id)
        } else {
            None
        }
    }
}
