//! Identity domain service.
//!
//! Implements [`IdentityPort`] over the user repository and the Google
//! token verifier. Login accepts an email or a username; accounts
//! provisioned through Google carry a sentinel instead of a password hash
//! and can only sign in with a token.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::credentials::{LoginCredentials, RegistrationDetails};
use crate::domain::error::DomainError;
use crate::domain::experience::Experience;
use crate::domain::password::{hash_password, verify_password};
use crate::domain::ports::{
    AccountView, GoogleLoginOutcome, GoogleTokenVerifier, IdentityPort, TokenVerificationError,
    UserRepository, UserRepositoryError,
};
use crate::domain::user::{Email, User, UserId, Username, OAUTH_SENTINEL};

/// Identity service implementing the driving port.
#[derive(Clone)]
pub struct IdentityService<U, V> {
    users: Arc<U>,
    verifier: Arc<V>,
}

impl<U, V> IdentityService<U, V> {
    pub fn new(users: Arc<U>, verifier: Arc<V>) -> Self {
        Self { users, verifier }
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
            DomainError::conflict("email or username already exists")
        }
    }
}

fn map_token_error(error: TokenVerificationError) -> DomainError {
    match error {
        TokenVerificationError::Rejected { .. } => {
            DomainError::unauthorized("google token was rejected")
        }
        TokenVerificationError::AudienceMismatch => {
            DomainError::unauthorized("google token was issued for another application")
        }
        TokenVerificationError::Unavailable { message } => {
            DomainError::upstream(format!("google token verification unavailable: {message}"))
        }
    }
}

fn invalid_credentials() -> DomainError {
    DomainError::unauthorized("invalid credentials")
}

impl<U, V> IdentityService<U, V>
where
    U: UserRepository,
    V: GoogleTokenVerifier,
{
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, DomainError> {
        let key = identifier.to_lowercase();
        let found = if identifier.contains('@') {
            self.users.find_by_email(&key).await
        } else {
            self.users.find_by_username(&key).await
        };
        found.map_err(map_user_repo_error)
    }

    async fn touch(&self, id: &UserId) -> Result<(), DomainError> {
        self.users
            .touch_last_seen(id, Utc::now())
            .await
            .map_err(map_user_repo_error)
    }

    async fn verified_claims(
        &self,
        id_token: &str,
    ) -> Result<crate::domain::ports::GoogleClaims, DomainError> {
        self.verifier
            .verify(id_token)
            .await
            .map_err(map_token_error)
    }
}

#[async_trait]
impl<U, V> IdentityPort for IdentityService<U, V>
where
    U: UserRepository,
    V: GoogleTokenVerifier,
{
    async fn register(&self, details: RegistrationDetails) -> Result<AccountView, DomainError> {
        let hash = hash_password(details.password())
            .map_err(|err| DomainError::internal(err.to_string()))?;
        let user = User {
            id: UserId::random(),
            email: details.email().clone(),
            username: details.username().clone(),
            password_hash: hash,
            created_at: Utc::now(),
            last_seen: Some(Utc::now()),
            avatar_url: String::new(),
            experience: Experience::default(),
        };
        self.users
            .insert(&user)
            .await
            .map_err(map_user_repo_error)?;
        tracing::info!(user_id = %user.id, "account registered");
        Ok(AccountView::from(&user))
    }

    async fn login(&self, credentials: LoginCredentials) -> Result<AccountView, DomainError> {
        let Some(user) = self.find_by_identifier(credentials.identifier()).await? else {
            return Err(invalid_credentials());
        };
        if user.is_oauth() {
            return Err(DomainError::unauthorized(
                "this account signs in with Google",
            ));
        }
        if !verify_password(credentials.password(), &user.password_hash) {
            return Err(invalid_credentials());
        }
        self.touch(&user.id).await?;
        Ok(AccountView::from(&user))
    }

    async fn google_login(&self, id_token: &str) -> Result<GoogleLoginOutcome, DomainError> {
        let claims = self.verified_claims(id_token).await?;
        let email_key = claims.email.to_lowercase();
        let Some(user) = self
            .users
            .find_by_email(&email_key)
            .await
            .map_err(map_user_repo_error)?
        else {
            return Ok(GoogleLoginOutcome::RequireSetup {
                email: claims.email,
            });
        };

        // Keep the avatar in step with the Google profile picture.
        let mut view = AccountView::from(&user);
        if let Some(picture) = claims.picture
            && picture != user.avatar_url
        {
            self.users
                .set_avatar(&user.id, &picture)
                .await
                .map_err(map_user_repo_error)?;
            view.avatar_url = picture;
        }
        self.touch(&user.id).await?;
        Ok(GoogleLoginOutcome::LoggedIn(view))
    }

    async fn google_register(
        &self,
        id_token: &str,
        username: &str,
    ) -> Result<AccountView, DomainError> {
        let claims = self.verified_claims(id_token).await?;
        let email = Email::parse(&claims.email)
            .map_err(|err| DomainError::invalid_request(err.to_string()))?;
        let username = Username::parse(username)
            .map_err(|err| DomainError::invalid_request(err.to_string()))?;
        let user = User {
            id: UserId::random(),
            email,
            username,
            password_hash: OAUTH_SENTINEL.to_owned(),
            created_at: Utc::now(),
            last_seen: Some(Utc::now()),
            avatar_url: claims.picture.unwrap_or_default(),
            experience: Experience::default(),
        };
        self.users
            .insert(&user)
            .await
            .map_err(map_user_repo_error)?;
        tracing::info!(user_id = %user.id, "google account registered");
        Ok(AccountView::from(&user))
    }

    async fn account(&self, user: &UserId) -> Result<AccountView, DomainError> {
        let found = self
            .users
            .find_by_id(user)
            .await
            .map_err(map_user_repo_error)?
            .ok_or_else(|| DomainError::not_found("account not found"))?;
        Ok(AccountView::from(&found))
    }

    async fn ping(&self, user: &UserId) -> Result<AccountView, DomainError> {
        self.touch(user).await?;
        self.account(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::ports::{GoogleClaims, MemoryUserRepository, MockGoogleTokenVerifier};

    fn service_with_verifier(
        verifier: MockGoogleTokenVerifier,
    ) -> IdentityService<MemoryUserRepository, MockGoogleTokenVerifier> {
        IdentityService::new(Arc::new(MemoryUserRepository::new()), Arc::new(verifier))
    }

    fn service() -> IdentityService<MemoryUserRepository, MockGoogleTokenVerifier> {
        service_with_verifier(MockGoogleTokenVerifier::new())
    }

    fn registration() -> RegistrationDetails {
        RegistrationDetails::try_from_parts("reader@example.com", "reader_01", "hunter2")
            .expect("valid registration")
    }

    fn claims(email: &str) -> GoogleClaims {
        GoogleClaims {
            email: email.to_owned(),
            picture: Some("https://lh3.example.com/p.jpg".to_owned()),
            audience: None,
        }
    }

    #[tokio::test]
    async fn register_then_login_with_email_or_username() {
        let service = service();
        service.register(registration()).await.expect("register");

        for identifier in ["reader@example.com", "reader_01", "READER_01"] {
            let creds =
                LoginCredentials::try_from_parts(identifier, "hunter2").expect("valid login");
            let view = service.login(creds).await.expect("login succeeds");
            assert_eq!(view.username, "reader_01");
        }
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let service = service();
        service.register(registration()).await.expect("register");
        let creds = LoginCredentials::try_from_parts("reader_01", "wrong").expect("valid login");
        let err = service.login(creds).await.expect_err("login fails");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let service = service();
        service.register(registration()).await.expect("register");
        let err = service
            .register(registration())
            .await
            .expect_err("duplicate rejected");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn google_login_with_unknown_email_requires_setup() {
        let mut verifier = MockGoogleTokenVerifier::new();
        verifier
            .expect_verify()
            .returning(|_| Ok(claims("new@example.com")));
        let service = service_with_verifier(verifier);

        let outcome = service.google_login("token").await.expect("verified");
        assert_eq!(
            outcome,
            GoogleLoginOutcome::RequireSetup {
                email: "new@example.com".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn google_register_then_login_syncs_avatar() {
        let mut verifier = MockGoogleTokenVerifier::new();
        verifier
            .expect_verify()
            .returning(|_| Ok(claims("reader@example.com")));
        let service = service_with_verifier(verifier);

        service
            .google_register("token", "reader_01")
            .await
            .expect("setup");
        let outcome = service.google_login("token").await.expect("login");
        let GoogleLoginOutcome::LoggedIn(view) = outcome else {
            panic!("expected a signed-in outcome");
        };
        assert_eq!(view.avatar_url, "https://lh3.example.com/p.jpg");
    }

    #[tokio::test]
    async fn oauth_account_rejects_password_login() {
        let mut verifier = MockGoogleTokenVerifier::new();
        verifier
            .expect_verify()
            .returning(|_| Ok(claims("reader@example.com")));
        let service = service_with_verifier(verifier);
        service
            .google_register("token", "reader_01")
            .await
            .expect("setup");

        let creds =
            LoginCredentials::try_from_parts("reader_01", "GOOGLE_OAUTH_USER").expect("valid");
        let err = service.login(creds).await.expect_err("login fails");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn rejected_token_is_unauthorized() {
        let mut verifier = MockGoogleTokenVerifier::new();
        verifier
            .expect_verify()
            .returning(|_| Err(TokenVerificationError::rejected("expired")));
        let service = service_with_verifier(verifier);
        let err = service.google_login("token").await.expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn ping_refreshes_last_seen() {
        let service = service();
        let registered = service.register(registration()).await.expect("register");
        let view = service.ping(&registered.id).await.expect("ping");
        assert!(view.last_seen.is_some());
    }
}
