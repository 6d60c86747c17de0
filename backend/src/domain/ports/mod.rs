//! Domain ports for the hexagonal boundary.
//!
//! Driven ports (repositories, cache, token verifier) are implemented by
//! outbound adapters; driving ports (identity, diary, social, media) are
//! implemented by domain services and consumed by the HTTP layer.

mod diary;
mod entry_cache;
mod entry_repository;
mod friendship_repository;
mod identity;
mod media;
mod picture_repository;
mod social;
mod token_verifier;
mod user_repository;

#[cfg(test)]
pub use diary::MockDiaryPort;
pub use diary::{
    DeleteReceipt, DiaryPort, EntryChanges, EntryView, EntryWithPictures, FeedEntry, FeedFilter,
    NewEntry, SaveReceipt,
};
#[cfg(test)]
pub use entry_cache::MockEntryCache;
pub use entry_cache::{
    CacheKey, CacheNamespace, EntryCache, NoOpEntryCache, digest_token, PUBLIC_CACHE_TTL,
    USER_CACHE_TTL,
};
#[cfg(test)]
pub use entry_repository::MockEntryRepository;
pub use entry_repository::{EntryRepository, EntryRepositoryError, MemoryEntryRepository};
#[cfg(test)]
pub use friendship_repository::MockFriendshipRepository;
pub use friendship_repository::{
    FriendshipRepository, FriendshipRepositoryError, MemoryFriendshipRepository,
};
#[cfg(test)]
pub use identity::MockIdentityPort;
pub use identity::{AccountView, GoogleLoginOutcome, IdentityPort};
#[cfg(test)]
pub use media::MockMediaPort;
pub use media::{MediaPort, NewPictureMetadata, PictureDeleteReceipt, PictureView};
#[cfg(test)]
pub use picture_repository::MockPictureRepository;
pub use picture_repository::{MemoryPictureRepository, PictureRepository, PictureRepositoryError};
#[cfg(test)]
pub use social::MockSocialPort;
pub use social::{
    FriendRequestView, FriendView, FriendshipsOverview, ProfileView, SocialPort, UserSearchResult,
};
#[cfg(test)]
pub use token_verifier::MockGoogleTokenVerifier;
pub use token_verifier::{GoogleClaims, GoogleTokenVerifier, TokenVerificationError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{MemoryUserRepository, UserRepository, UserRepositoryError};
