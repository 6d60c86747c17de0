//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::Key;

use crate::domain::ports::{
    MemoryEntryRepository, MemoryFriendshipRepository, MemoryPictureRepository,
    MemoryUserRepository, MockGoogleTokenVerifier, NoOpEntryCache,
};
use crate::domain::{DiaryService, IdentityService, MediaService, SocialService};
use crate::inbound::http::state::HttpState;

/// Build a session middleware configured for tests.
///
/// Generates a fresh signing key per invocation and disables the `Secure`
/// flag so plain-HTTP test requests keep their cookie.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Build an [`HttpState`] backed by in-memory adapters.
///
/// The token verifier is a mock with no expectations; tests that exercise
/// Google sign-in should build their own state around a configured mock.
pub fn memory_state() -> HttpState {
    memory_state_with_verifier(MockGoogleTokenVerifier::new())
}

/// Build an in-memory [`HttpState`] around a configured token verifier.
pub fn memory_state_with_verifier(verifier: MockGoogleTokenVerifier) -> HttpState {
    let users = Arc::new(MemoryUserRepository::new());
    let entries = Arc::new(MemoryEntryRepository::new());
    let friendships = Arc::new(MemoryFriendshipRepository::new());
    let pictures = Arc::new(MemoryPictureRepository::new());
    let cache = Arc::new(NoOpEntryCache);

    let identity = IdentityService::new(Arc::clone(&users), Arc::new(verifier));
    let diary = DiaryService::new(
        Arc::clone(&entries),
        Arc::clone(&users),
        Arc::clone(&friendships),
        Arc::clone(&pictures),
        Arc::clone(&cache),
    );
    let social = SocialService::new(
        Arc::clone(&users),
        Arc::clone(&friendships),
        Arc::clone(&entries),
    );
    let media = MediaService::new(pictures, entries, friendships, cache);

    HttpState::new(
        Arc::new(identity),
        Arc::new(diary),
        Arc::new(social),
        Arc::new(media),
    )
}
