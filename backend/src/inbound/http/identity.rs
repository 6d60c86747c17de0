//! Authentication and account API handlers.
//!
//! ```text
//! POST /api/v1/auth/register {"email":"a@b.com","username":"reader_01","password":"hunter2"}
//! POST /api/v1/auth/login    {"identifier":"reader_01","password":"hunter2"}
//! POST /api/v1/auth/google   {"idToken":"..."}
//! ```

use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::ports::{AccountView, GoogleLoginOutcome};
use crate::domain::{
    CredentialValidationError, DomainError, LoginCredentials, RegistrationDetails,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Registration request body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Login request body; `identifier` accepts an email or a username.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

/// Google sign-in request body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

/// Google account setup request body.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GoogleRegisterRequest {
    pub id_token: String,
    pub username: String,
}

/// Response for a Google sign-in attempt.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum GoogleLoginResponse {
    /// The token matched an existing account and a session was started.
    #[serde(rename_all = "camelCase")]
    LoggedIn { account: AccountView },
    /// The email is new; the client must collect a username and call the
    /// setup endpoint.
    #[serde(rename_all = "camelCase")]
    RequireSetup { email: String },
}

fn map_credential_error(err: CredentialValidationError) -> DomainError {
    let details = match &err {
        CredentialValidationError::MissingField => json!({ "code": "missing_field" }),
        CredentialValidationError::PasswordTooShort => {
            json!({ "field": "password", "code": "password_too_short" })
        }
        CredentialValidationError::Identity(_) => json!({ "code": "invalid_identity" }),
    };
    DomainError::invalid_request(err.to_string()).with_details(details)
}

/// Create a local account and start a session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountView),
        (status = 400, description = "Invalid request", body = DomainError),
        (status = 409, description = "Email or username taken", body = DomainError)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let details =
        RegistrationDetails::try_from_parts(&payload.email, &payload.username, &payload.password)
            .map_err(map_credential_error)?;
    let account = state.identity.register(details).await?;
    session.persist_user(&account.id)?;
    Ok(HttpResponse::Created().json(account))
}

/// Authenticate with a password and start a session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = AccountView),
        (status = 400, description = "Invalid request", body = DomainError),
        (status = 401, description = "Invalid credentials", body = DomainError)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&payload.identifier, &payload.password)
        .map_err(map_credential_error)?;
    let account = state.identity.login(credentials).await?;
    session.persist_user(&account.id)?;
    Ok(HttpResponse::Ok().json(account))
}

/// Sign in with a Google ID token.
///
/// Unknown emails are not an error: the response asks the client to finish
/// account setup instead.
#[utoipa::path(
    post,
    path = "/api/v1/auth/google",
    request_body = GoogleLoginRequest,
    responses(
        (status = 200, description = "Signed in or setup required", body = GoogleLoginResponse),
        (status = 401, description = "Token rejected", body = DomainError),
        (status = 502, description = "Verification endpoint unavailable", body = DomainError)
    ),
    tags = ["auth"],
    operation_id = "googleLogin",
    security([])
)]
#[post("/auth/google")]
pub async fn google_login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<GoogleLoginRequest>,
) -> ApiResult<web::Json<GoogleLoginResponse>> {
    let outcome = state.identity.google_login(&payload.id_token).await?;
    Ok(web::Json(match outcome {
        GoogleLoginOutcome::LoggedIn(account) => {
            session.persist_user(&account.id)?;
            GoogleLoginResponse::LoggedIn { account }
        }
        GoogleLoginOutcome::RequireSetup { email } => GoogleLoginResponse::RequireSetup { email },
    }))
}

/// Finish Google account setup with a chosen username.
#[utoipa::path(
    post,
    path = "/api/v1/auth/google/register",
    request_body = GoogleRegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountView),
        (status = 400, description = "Invalid request", body = DomainError),
        (status = 401, description = "Token rejected", body = DomainError),
        (status = 409, description = "Email or username taken", body = DomainError)
    ),
    tags = ["auth"],
    operation_id = "googleRegister",
    security([])
)]
#[post("/auth/google/register")]
pub async fn google_register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<GoogleRegisterRequest>,
) -> ApiResult<HttpResponse> {
    let account = state
        .identity
        .google_register(&payload.id_token, &payload.username)
        .await?;
    session.persist_user(&account.id)?;
    Ok(HttpResponse::Created().json(account))
}

/// End the current session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 204, description = "Session ended")),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Fetch the signed-in account.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Account", body = AccountView),
        (status = 401, description = "Login required", body = DomainError)
    ),
    tags = ["auth"],
    operation_id = "account"
)]
#[get("/auth/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AccountView>> {
    let user = session.require_user_id()?;
    Ok(web::Json(state.identity.account(&user).await?))
}

/// Record activity and return the refreshed account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/ping",
    responses(
        (status = 200, description = "Account", body = AccountView),
        (status = 401, description = "Login required", body = DomainError)
    ),
    tags = ["auth"],
    operation_id = "ping"
)]
#[post("/auth/ping")]
pub async fn ping(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AccountView>> {
    let user = session.require_user_id()?;
    Ok(web::Json(state.identity.ping(&user).await?))
}
