//! Entry visibility rule.
//!
//! [`can_view_entry`] is the single authority on whether a viewer may read a
//! diary entry. It is pure and deterministic: callers materialise the
//! owner's accepted friendships into a [`FriendshipSnapshot`] first, so the
//! rule itself touches no storage.

use std::collections::HashSet;

use crate::domain::entry::PrivacyTier;
use crate::domain::friendship::{Friendship, FriendshipStatus};
use crate::domain::user::{Email, UserId};

/// Identity of the caller asking to read an entry.
///
/// Both fields are optional: an anonymous reader carries neither, a session
/// carries at least the id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerIdentity {
    pub user_id: Option<UserId>,
    pub email: Option<Email>,
}

impl ViewerIdentity {
    /// An unauthenticated caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A caller identified by session user id.
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            email: None,
        }
    }

    /// A caller identified by id and email.
    pub fn new(user_id: Option<UserId>, email: Option<Email>) -> Self {
        Self { user_id, email }
    }
}

/// Accepted friendships of one owner, flattened for the visibility check.
///
/// `peer_emails` carries the legacy friend-email fallback: normalised email
/// addresses stored on historical edges in place of a recipient id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FriendshipSnapshot {
    peer_ids: HashSet<UserId>,
    peer_emails: HashSet<String>,
}

impl FriendshipSnapshot {
    /// Snapshot with no accepted friendships.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Flatten the owner's edges; only accepted edges contribute.
    pub fn for_owner(owner_id: &UserId, edges: &[Friendship]) -> Self {
        let mut peer_ids = HashSet::new();
        let mut peer_emails = HashSet::new();
        for edge in edges {
            if edge.status != FriendshipStatus::Accepted {
                continue;
            }
            if let Some(peer) = edge.peer_of(owner_id) {
                peer_ids.insert(peer);
            }
            if edge.requester_id == *owner_id
                && let Some(email) = &edge.legacy_peer_email
            {
                let normalized = email.trim().to_lowercase();
                if !normalized.is_empty() {
                    peer_emails.insert(normalized);
                }
            }
        }
        Self {
            peer_ids,
            peer_emails,
        }
    }

    /// Whether `user` is an accepted friend of the owner.
    pub fn contains_id(&self, user: &UserId) -> bool {
        self.peer_ids.contains(user)
    }

    /// Whether `email` matches a legacy friend-email fallback.
    pub fn contains_email(&self, email: &Email) -> bool {
        self.peer_emails.contains(&email.normalized())
    }
}

/// Decide whether `viewer` may read an entry owned by `owner_id`.
///
/// Rules, evaluated in order:
/// 1. `public` entries are visible to anyone.
/// 2. The owner always sees their own entries.
/// 3. `friend` entries require an accepted friendship, matched by viewer id
///    first, then by the stored friend-email fallback.
/// 4. `private` entries are owner-only.
pub fn can_view_entry(
    owner_id: &UserId,
    privacy: PrivacyTier,
    viewer: &ViewerIdentity,
    friends: &FriendshipSnapshot,
) -> bool {
    if privacy == PrivacyTier::Public {
        return true;
    }
    if viewer.user_id.as_ref() == Some(owner_id) {
        return true;
    }
    if privacy == PrivacyTier::Friend {
        if let Some(id) = &viewer.user_id
            && friends.contains_id(id)
        {
            return true;
        }
        if let Some(email) = &viewer.email
            && friends.contains_email(email)
        {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn accepted(requester: UserId, recipient: UserId) -> Friendship {
        Friendship {
            requester_id: requester,
            recipient_id: recipient,
            status: FriendshipStatus::Accepted,
            legacy_peer_email: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn pending(requester: UserId, recipient: UserId) -> Friendship {
        Friendship {
            status: FriendshipStatus::Pending,
            ..accepted(requester, recipient)
        }
    }

    #[rstest]
    #[case(PrivacyTier::Public, true)]
    #[case(PrivacyTier::Friend, false)]
    #[case(PrivacyTier::Private, false)]
    fn anonymous_viewer_sees_public_only(#[case] privacy: PrivacyTier, #[case] expected: bool) {
        let owner = UserId::random();
        let viewer = ViewerIdentity::anonymous();
        assert_eq!(
            can_view_entry(&owner, privacy, &viewer, &FriendshipSnapshot::empty()),
            expected
        );
    }

    #[rstest]
    #[case(PrivacyTier::Public)]
    #[case(PrivacyTier::Friend)]
    #[case(PrivacyTier::Private)]
    fn owner_always_sees_own_entries(#[case] privacy: PrivacyTier) {
        let owner = UserId::random();
        let viewer = ViewerIdentity::for_user(owner);
        assert!(can_view_entry(
            &owner,
            privacy,
            &viewer,
            &FriendshipSnapshot::empty()
        ));
    }

    #[test]
    fn accepted_friend_sees_friend_tier() {
        let owner = UserId::random();
        let friend = UserId::random();
        let snapshot = FriendshipSnapshot::for_owner(&owner, &[accepted(friend, owner)]);
        let viewer = ViewerIdentity::for_user(friend);
        assert!(can_view_entry(
            &owner,
            PrivacyTier::Friend,
            &viewer,
            &snapshot
        ));
        assert!(!can_view_entry(
            &owner,
            PrivacyTier::Private,
            &viewer,
            &snapshot
        ));
    }

    #[test]
    fn pending_edge_grants_nothing() {
        let owner = UserId::random();
        let requester = UserId::random();
        let snapshot = FriendshipSnapshot::for_owner(&owner, &[pending(requester, owner)]);
        let viewer = ViewerIdentity::for_user(requester);
        assert!(!can_view_entry(
            &owner,
            PrivacyTier::Friend,
            &viewer,
            &snapshot
        ));
    }

    #[test]
    fn email_fallback_applies_when_id_fails() {
        let owner = UserId::random();
        let mut edge = accepted(owner, UserId::random());
        edge.legacy_peer_email = Some("Friend@Example.com".into());
        let snapshot = FriendshipSnapshot::for_owner(&owner, &[edge]);

        let email = Email::parse("friend@example.com").expect("valid email");
        let viewer = ViewerIdentity::new(Some(UserId::random()), Some(email));
        assert!(can_view_entry(
            &owner,
            PrivacyTier::Friend,
            &viewer,
            &snapshot
        ));
    }

    #[test]
    fn stranger_with_unrelated_email_is_rejected() {
        let owner = UserId::random();
        let snapshot = FriendshipSnapshot::for_owner(&owner, &[]);
        let email = Email::parse("stranger@example.com").expect("valid email");
        let viewer = ViewerIdentity::new(Some(UserId::random()), Some(email));
        assert!(!can_view_entry(
            &owner,
            PrivacyTier::Friend,
            &viewer,
            &snapshot
        ));
    }
}
