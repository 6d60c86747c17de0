//! Social domain service.
//!
//! Implements [`SocialPort`] over the user, friendship, and entry
//! repositories. Peers are addressed by username; all graph invariants
//! (single edge per pair, directional pending state) are enforced here.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::error::DomainError;
use crate::domain::friendship::{Friendship, FriendshipStatus};
use crate::domain::ports::{
    EntryRepository, EntryRepositoryError, FriendRequestView, FriendView, FriendshipRepository,
    FriendshipRepositoryError, FriendshipsOverview, ProfileView, SocialPort, UserRepository,
    UserRepositoryError, UserSearchResult,
};
use crate::domain::user::{User, UserId};
use crate::domain::visibility::{can_view_entry, FriendshipSnapshot, ViewerIdentity};

/// Shortest accepted user search query.
pub const SEARCH_MIN_LEN: usize = 2;
/// Most rows a user search returns.
pub const SEARCH_MAX_RESULTS: usize = 10;

/// Social service implementing the driving port.
#[derive(Clone)]
pub struct SocialService<U, F, E> {
    users: Arc<U>,
    friendships: Arc<F>,
    entries: Arc<E>,
}

impl<U, F, E> SocialService<U, F, E> {
    pub fn new(users: Arc<U>, friendships: Arc<F>, entries: Arc<E>) -> Self {
        Self {
            users,
            friendships,
            entries,
        }
    }
}

fn map_user_repo_error(error: UserRepositoryError) -> DomainError {
    match error {
        UserRepositoryError::Connection { message } => {
            DomainError::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            DomainError::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateIdentity => {
            DomainError::internal("unexpected duplicate identity")
        }
    }
}

fn map_friendship_repo_error(error: FriendshipRepositoryError) -> DomainError {
    match error {
        FriendshipRepositoryError::Connection { message } => DomainError::service_unavailable(
            format!("friendship repository unavailable: {message}"),
        ),
        FriendshipRepositoryError::Query { message } => {
            DomainError::internal(format!("friendship repository error: {message}"))
        }
        FriendshipRepositoryError::DuplicateEdge => {
            DomainError::conflict("friend request already exists")
        }
    }
}

fn map_entry_repo_error(error: EntryRepositoryError) -> DomainError {
    match error {
        EntryRepositoryError::Connection { message } => {
            DomainError::service_unavailable(format!("entry repository unavailable: {message}"))
        }
        EntryRepositoryError::Query { message } => {
            DomainError::internal(format!("entry repository error: {message}"))
        }
    }
}

fn user_not_found() -> DomainError {
    DomainError::not_found("user not found")
}

impl<U, F, E> SocialService<U, F, E>
where
    U: UserRepository,
    F: FriendshipRepository,
    E: EntryRepository,
{
    async fn resolve_peer(&self, user: &UserId, username: &str) -> Result<User, DomainError> {
        let peer = self
            .users
            .find_by_username(&username.to_lowercase())
            .await
            .map_err(map_user_repo_error)?
            .ok_or_else(user_not_found)?;
        if peer.id == *user {
            return Err(DomainError::invalid_request(
                "cannot perform friendship actions on yourself",
            ));
        }
        Ok(peer)
    }

    async fn peer_user(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        self.users.find_by_id(id).await.map_err(map_user_repo_error)
    }
}

#[async_trait]
impl<U, F, E> SocialPort for SocialService<U, F, E>
where
    U: UserRepository,
    F: FriendshipRepository,
    E: EntryRepository,
{
    async fn send_request(&self, user: &UserId, username: &str) -> Result<(), DomainError> {
        let peer = self.resolve_peer(user, username).await?;
        let existing = self
            .friendships
            .find_edge(user, &peer.id)
            .await
            .map_err(map_friendship_repo_error)?;
        if let Some(edge) = existing {
            return Err(match edge.status {
                FriendshipStatus::Accepted => DomainError::conflict("already friends"),
                FriendshipStatus::Pending => {
                    DomainError::conflict("friend request already pending")
                }
            });
        }

        let now = Utc::now();
        self.friendships
            .insert(&Friendship {
                requester_id: *user,
                recipient_id: peer.id,
                status: FriendshipStatus::Pending,
                legacy_peer_email: Some(peer.email.normalized()),
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(map_friendship_repo_error)?;
        tracing::info!(user_id = %user, peer_id = %peer.id, "friend request sent");
        Ok(())
    }

    async fn accept_request(&self, user: &UserId, username: &str) -> Result<(), DomainError> {
        let requester = self.resolve_peer(user, username).await?;
        let accepted = self
            .friendships
            .mark_accepted(&requester.id, user, Utc::now())
            .await
            .map_err(map_friendship_repo_error)?;
        if !accepted {
            return Err(DomainError::not_found("friend request not found"));
        }
        Ok(())
    }

    async fn decline_request(&self, user: &UserId, username: &str) -> Result<(), DomainError> {
        let requester = self.resolve_peer(user, username).await?;
        let removed = self
            .friendships
            .delete_pending(&requester.id, user)
            .await
            .map_err(map_friendship_repo_error)?;
        if !removed {
            return Err(DomainError::not_found("friend request not found"));
        }
        Ok(())
    }

    async fn cancel_request(&self, user: &UserId, username: &str) -> Result<(), DomainError> {
        let recipient = self.resolve_peer(user, username).await?;
        let removed = self
            .friendships
            .delete_pending(user, &recipient.id)
            .await
            .map_err(map_friendship_repo_error)?;
        if !removed {
            return Err(DomainError::not_found("friend request not found"));
        }
        Ok(())
    }

    async fn remove_friend(&self, user: &UserId, username: &str) -> Result<(), DomainError> {
        let peer = self.resolve_peer(user, username).await?;
        let removed = self
            .friendships
            .delete_accepted(user, &peer.id)
            .await
            .map_err(map_friendship_repo_error)?;
        if !removed {
            return Err(DomainError::not_found("friendship not found"));
        }
        Ok(())
    }

    async fn overview(&self, user: &UserId) -> Result<FriendshipsOverview, DomainError> {
        let edges = self
            .friendships
            .list_for_user(user)
            .await
            .map_err(map_friendship_repo_error)?;

        let mut friends = Vec::new();
        let mut sent = Vec::new();
        let mut received = Vec::new();
        for edge in edges {
            let Some(peer_id) = edge.peer_of(user) else {
                continue;
            };
            // Peers deleted since the edge was written are skipped silently.
            let Some(peer) = self.peer_user(&peer_id).await? else {
                continue;
            };
            match edge.status {
                FriendshipStatus::Accepted => friends.push(FriendView {
                    username: peer.username.as_str().to_owned(),
                    avatar_url: peer.avatar_url,
                    level: peer.experience.level(),
                    since: edge.updated_at,
                }),
                FriendshipStatus::Pending if edge.requester_id == *user => {
                    sent.push(FriendRequestView {
                        username: peer.username.as_str().to_owned(),
                        avatar_url: peer.avatar_url,
                        requested_at: edge.created_at,
                    });
                }
                FriendshipStatus::Pending => received.push(FriendRequestView {
                    username: peer.username.as_str().to_owned(),
                    avatar_url: peer.avatar_url,
                    requested_at: edge.created_at,
                }),
            }
        }
        friends.sort_by(|a, b| a.username.cmp(&b.username));
        sent.sort_by(|a, b| a.username.cmp(&b.username));
        received.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(FriendshipsOverview {
            friends,
            sent,
            received,
        })
    }

    async fn search_users(
        &self,
        user: &UserId,
        query: &str,
    ) -> Result<Vec<UserSearchResult>, DomainError> {
        let needle = query.trim();
        if needle.chars().count() < SEARCH_MIN_LEN {
            return Err(DomainError::invalid_request(format!(
                "search requires at least {SEARCH_MIN_LEN} characters"
            )));
        }

        // One extra row absorbs the searcher being excluded below.
        let rows = self
            .users
            .search_by_username(needle, SEARCH_MAX_RESULTS + 1)
            .await
            .map_err(map_user_repo_error)?;
        let edges = self
            .friendships
            .list_for_user(user)
            .await
            .map_err(map_friendship_repo_error)?;

        let mut results = Vec::new();
        for row in rows {
            if row.id == *user {
                continue;
            }
            let edge = edges.iter().find(|edge| edge.involves(&row.id));
            results.push(UserSearchResult {
                username: row.username.as_str().to_owned(),
                avatar_url: row.avatar_url,
                level: row.experience.level(),
                is_friend: edge.is_some_and(|e| e.status == FriendshipStatus::Accepted),
                request_pending: edge.is_some_and(|e| e.status == FriendshipStatus::Pending),
            });
            if results.len() == SEARCH_MAX_RESULTS {
                break;
            }
        }
        Ok(results)
    }

    async fn profile<'a>(
        &self,
        viewer: Option<&'a UserId>,
        username: &str,
    ) -> Result<ProfileView, DomainError> {
        let target = self
            .users
            .find_by_username(&username.to_lowercase())
            .await
            .map_err(map_user_repo_error)?
            .ok_or_else(user_not_found)?;

        let viewer_identity = match viewer {
            Some(id) => {
                let email = self.peer_user(id).await?.map(|u| u.email);
                ViewerIdentity::new(Some(*id), email)
            }
            None => ViewerIdentity::anonymous(),
        };
        let edges = match viewer {
            Some(id) => self
                .friendships
                .list_for_user(id)
                .await
                .map_err(map_friendship_repo_error)?,
            None => Vec::new(),
        };
        let friends = FriendshipSnapshot::for_owner(&target.id, &edges);

        let entries = self
            .entries
            .list_by_owner(&target.id)
            .await
            .map_err(map_entry_repo_error)?;
        let mut visible: Vec<_> = entries
            .into_iter()
            .filter(|entry| {
                can_view_entry(&target.id, entry.privacy, &viewer_identity, &friends)
            })
            .collect();
        visible.sort_by(|a, b| b.date.cmp(&a.date));
        let last_entry = visible.first().map(|entry| entry.date.iso());

        Ok(ProfileView {
            username: target.username.as_str().to_owned(),
            avatar_url: target.avatar_url,
            level: target.experience.level(),
            experience: target.experience.points(),
            member_since: target.created_at,
            total_entries: visible.len(),
            last_entry,
            is_friend: viewer.is_some_and(|id| friends.contains_id(id) && *id != target.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dates::EntryDate;
    use crate::domain::entry::{DiaryEntry, EntryId, PrivacyTier};
    use crate::domain::error::ErrorCode;
    use crate::domain::experience::Experience;
    use crate::domain::ports::{
        MemoryEntryRepository, MemoryFriendshipRepository, MemoryUserRepository,
    };
    use crate::domain::user::{Email, Username};

    type TestService =
        SocialService<MemoryUserRepository, MemoryFriendshipRepository, MemoryEntryRepository>;

    struct Fixture {
        service: TestService,
        users: Arc<MemoryUserRepository>,
        entries: Arc<MemoryEntryRepository>,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(MemoryUserRepository::new());
        let friendships = Arc::new(MemoryFriendshipRepository::new());
        let entries = Arc::new(MemoryEntryRepository::new());
        let service = SocialService::new(
            Arc::clone(&users),
            Arc::clone(&friendships),
            Arc::clone(&entries),
        );
        Fixture {
            service,
            users,
            entries,
        }
    }

    async fn seed_user(fixture: &Fixture, username: &str) -> UserId {
        let user = User {
            id: UserId::random(),
            email: Email::parse(&format!("{username}@example.com")).expect("valid email"),
            username: Username::parse(username).expect("valid username"),
            password_hash: "hash".into(),
            created_at: Utc::now(),
            last_seen: None,
            avatar_url: String::new(),
            experience: Experience::default(),
        };
        fixture.users.insert(&user).await.expect("seed user");
        user.id
    }

    async fn seed_entry(fixture: &Fixture, owner: UserId, username: &str, privacy: PrivacyTier) {
        fixture
            .entries
            .insert(&DiaryEntry {
                id: EntryId::random(),
                owner_id: owner,
                owner_username: Username::parse(username).expect("valid username"),
                date: EntryDate::parse("2024-03-01").expect("valid date"),
                title: "t".into(),
                content: "c".into(),
                privacy,
                created_at: Utc::now(),
                last_modified: Utc::now(),
            })
            .await
            .expect("seed entry");
    }

    #[tokio::test]
    async fn request_accept_lifecycle() {
        let fixture = fixture();
        let alice = seed_user(&fixture, "alice_01").await;
        let bob = seed_user(&fixture, "bobby_01").await;

        fixture
            .service
            .send_request(&alice, "bobby_01")
            .await
            .expect("send");
        let bob_view = fixture.service.overview(&bob).await.expect("overview");
        assert_eq!(bob_view.received.len(), 1);
        assert_eq!(bob_view.received[0].username, "alice_01");

        fixture
            .service
            .accept_request(&bob, "alice_01")
            .await
            .expect("accept");
        let alice_view = fixture.service.overview(&alice).await.expect("overview");
        assert_eq!(alice_view.friends.len(), 1);
        assert_eq!(alice_view.friends[0].username, "bobby_01");
        assert!(alice_view.sent.is_empty());
    }

    #[tokio::test]
    async fn self_request_is_rejected() {
        let fixture = fixture();
        let alice = seed_user(&fixture, "alice_01").await;
        let err = fixture
            .service
            .send_request(&alice, "alice_01")
            .await
            .expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn duplicate_request_conflicts() {
        let fixture = fixture();
        let alice = seed_user(&fixture, "alice_01").await;
        let bob = seed_user(&fixture, "bobby_01").await;
        fixture
            .service
            .send_request(&alice, "bobby_01")
            .await
            .expect("send");

        let repeat = fixture.service.send_request(&alice, "bobby_01").await;
        assert_eq!(repeat.expect_err("conflict").code(), ErrorCode::Conflict);
        // The reverse direction also hits the existing edge.
        let reverse = fixture.service.send_request(&bob, "alice_01").await;
        assert_eq!(reverse.expect_err("conflict").code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn decline_removes_the_request() {
        let fixture = fixture();
        let alice = seed_user(&fixture, "alice_01").await;
        let bob = seed_user(&fixture, "bobby_01").await;
        fixture
            .service
            .send_request(&alice, "bobby_01")
            .await
            .expect("send");
        fixture
            .service
            .decline_request(&bob, "alice_01")
            .await
            .expect("decline");

        let err = fixture
            .service
            .accept_request(&bob, "alice_01")
            .await
            .expect_err("gone");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn remove_friend_requires_accepted_edge() {
        let fixture = fixture();
        let alice = seed_user(&fixture, "alice_01").await;
        seed_user(&fixture, "bobby_01").await;
        let err = fixture
            .service
            .remove_friend(&alice, "bobby_01")
            .await
            .expect_err("nothing to remove");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn search_excludes_self_and_flags_state() {
        let fixture = fixture();
        let alice = seed_user(&fixture, "match_alice").await;
        seed_user(&fixture, "match_bob").await;
        fixture
            .service
            .send_request(&alice, "match_bob")
            .await
            .expect("send");

        let results = fixture
            .service
            .search_users(&alice, "match")
            .await
            .expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].username, "match_bob");
        assert!(results[0].request_pending);
        assert!(!results[0].is_friend);
    }

    #[tokio::test]
    async fn short_search_is_rejected() {
        let fixture = fixture();
        let alice = seed_user(&fixture, "alice_01").await;
        let err = fixture
            .service
            .search_users(&alice, " a ")
            .await
            .expect_err("too short");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn profile_counts_only_visible_entries() {
        let fixture = fixture();
        let owner = seed_user(&fixture, "owner_01").await;
        let viewer = seed_user(&fixture, "viewer_01").await;
        seed_entry(&fixture, owner, "owner_01", PrivacyTier::Public).await;
        seed_entry(&fixture, owner, "owner_01", PrivacyTier::Private).await;

        let profile = fixture
            .service
            .profile(Some(&viewer), "owner_01")
            .await
            .expect("profile");
        assert_eq!(profile.total_entries, 1);
        assert_eq!(profile.last_entry.as_deref(), Some("2024-03-01"));
        assert!(!profile.is_friend);
    }
}
