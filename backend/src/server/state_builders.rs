//! Builders assembling the HTTP state from configured adapters.

use std::sync::Arc;

use actix_web::web;
use tracing::warn;

use crate::domain::ports::{
    MemoryEntryRepository, MemoryFriendshipRepository, MemoryPictureRepository,
    MemoryUserRepository,
};
use crate::domain::{DiaryService, IdentityService, MediaService, SocialService};
use crate::inbound::http::state::HttpState;
use crate::outbound::cache::TtlEntryCache;
use crate::outbound::oauth::HttpGoogleTokenVerifier;
use crate::outbound::persistence::{
    DieselEntryRepository, DieselFriendshipRepository, DieselPictureRepository,
    DieselUserRepository,
};

use super::ServerConfig;

/// Build the shared HTTP state.
///
/// Diesel repositories are selected when a pool is configured; otherwise
/// every port runs on its in-memory adapter.
pub(super) fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let verifier = Arc::new(
        HttpGoogleTokenVerifier::new(config.google_client_id.clone())
            .map_err(|err| std::io::Error::other(format!("google verifier failed: {err}")))?,
    );
    let cache = Arc::new(TtlEntryCache::new());

    let state = match &config.db_pool {
        Some(pool) => {
            let users = Arc::new(DieselUserRepository::new(pool.clone()));
            let entries = Arc::new(DieselEntryRepository::new(pool.clone()));
            let friendships = Arc::new(DieselFriendshipRepository::new(pool.clone()));
            let pictures = Arc::new(DieselPictureRepository::new(pool.clone()));

            HttpState::new(
                Arc::new(IdentityService::new(Arc::clone(&users), verifier)),
                Arc::new(DiaryService::new(
                    Arc::clone(&entries),
                    Arc::clone(&users),
                    Arc::clone(&friendships),
                    Arc::clone(&pictures),
                    Arc::clone(&cache),
                )),
                Arc::new(SocialService::new(
                    Arc::clone(&users),
                    Arc::clone(&friendships),
                    Arc::clone(&entries),
                )),
                Arc::new(MediaService::new(pictures, entries, friendships, cache)),
            )
        }
        None => {
            warn!("no database configured, state is in-memory and volatile");
            let users = Arc::new(MemoryUserRepository::new());
            let entries = Arc::new(MemoryEntryRepository::new());
            let friendships = Arc::new(MemoryFriendshipRepository::new());
            let pictures = Arc::new(MemoryPictureRepository::new());

            HttpState::new(
                Arc::new(IdentityService::new(Arc::clone(&users), verifier)),
                Arc::new(DiaryService::new(
                    Arc::clone(&entries),
                    Arc::clone(&users),
                    Arc::clone(&friendships),
                    Arc::clone(&pictures),
                    Arc::clone(&cache),
                )),
                Arc::new(SocialService::new(
                    Arc::clone(&users),
                    Arc::clone(&friendships),
                    Arc::clone(&entries),
                )),
                Arc::new(MediaService::new(pictures, entries, friendships, cache)),
            )
        }
    };

    Ok(web::Data::new(state))
}
