//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend on
//! domain ports only and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{DiaryPort, IdentityPort, MediaPort, SocialPort};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub identity: Arc<dyn IdentityPort>,
    pub diary: Arc<dyn DiaryPort>,
    pub social: Arc<dyn SocialPort>,
    pub media: Arc<dyn MediaPort>,
}

impl HttpState {
    pub fn new(
        identity: Arc<dyn IdentityPort>,
        diary: Arc<dyn DiaryPort>,
        social: Arc<dyn SocialPort>,
        media: Arc<dyn MediaPort>,
    ) -> Self {
        Self {
            identity,
            diary,
            social,
            media,
        }
    }
}
