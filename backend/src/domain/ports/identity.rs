//! Driving port for account registration, login, and session identity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::credentials::{LoginCredentials, RegistrationDetails};
use crate::domain::error::DomainError;
use crate::domain::user::{User, UserId};

/// Account data returned to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub avatar_url: String,
    pub experience: u64,
    pub level: u32,
    pub created_at: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl From<&User> for AccountView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_owned(),
            username: user.username.as_str().to_owned(),
            avatar_url: user.avatar_url.clone(),
            experience: user.experience.points(),
            level: user.experience.level(),
            created_at: user.created_at,
            last_seen: user.last_seen,
        }
    }
}

/// Outcome of a Google sign-in attempt.
///
/// A verified token whose email has no account yet cannot be logged in; the
/// caller must collect a username and complete registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoogleLoginOutcome {
    /// The email matched an existing account.
    LoggedIn(AccountView),
    /// The email is new; account setup is required.
    RequireSetup { email: String },
}

/// Driving port for identity operations.
///
/// Session cookie management stays in the HTTP layer; this port works in
/// terms of authenticated user ids.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityPort: Send + Sync {
    /// Create a local account and return its view.
    async fn register(&self, details: RegistrationDetails) -> Result<AccountView, DomainError>;

    /// Authenticate with an email or username plus password.
    async fn login(&self, credentials: LoginCredentials) -> Result<AccountView, DomainError>;

    /// Authenticate with a Google ID token.
    async fn google_login(&self, id_token: &str) -> Result<GoogleLoginOutcome, DomainError>;

    /// Complete Google account setup with a chosen username.
    async fn google_register(
        &self,
        id_token: &str,
        username: &str,
    ) -> Result<AccountView, DomainError>;

    /// Fetch the signed-in account.
    async fn account(&self, user: &UserId) -> Result<AccountView, DomainError>;

    /// Record activity and return the refreshed account.
    async fn ping(&self, user: &UserId) -> Result<AccountView, DomainError>;
}
