//! Friends graph and user discovery API handlers.
//!
//! ```text
//! POST   /api/v1/friends/requests {"username":"bobby_01"}
//! POST   /api/v1/friends/requests/bobby_01/accept
//! DELETE /api/v1/friends/bobby_01
//! GET    /api/v1/users/search?q=bob
//! ```

use actix_web::{delete, get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{FriendshipsOverview, ProfileView, UserSearchResult};
use crate::domain::DomainError;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Request body naming the peer of a friend request.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub username: String,
}

/// Query parameters for user search.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Username fragment, at least two characters.
    pub q: String,
}

/// Friends plus pending requests in both directions.
#[utoipa::path(
    get,
    path = "/api/v1/friends",
    responses(
        (status = 200, description = "Friendship overview", body = FriendshipsOverview),
        (status = 401, description = "Login required", body = DomainError)
    ),
    tags = ["social"],
    operation_id = "friendsOverview"
)]
#[get("/friends")]
pub async fn overview(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<FriendshipsOverview>> {
    let user = session.require_user_id()?;
    Ok(web::Json(state.social.overview(&user).await?))
}

/// Send a friend request.
#[utoipa::path(
    post,
    path = "/api/v1/friends/requests",
    request_body = FriendRequestBody,
    responses(
        (status = 204, description = "Request sent"),
        (status = 400, description = "Invalid request", body = DomainError),
        (status = 401, description = "Login required", body = DomainError),
        (status = 404, description = "No such user", body = DomainError),
        (status = 409, description = "Edge already exists", body = DomainError)
    ),
    tags = ["social"],
    operation_id = "sendFriendRequest"
)]
#[post("/friends/requests")]
pub async fn send_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<FriendRequestBody>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    state.social.send_request(&user, &payload.username).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Accept a pending request from `username`.
#[utoipa::path(
    post,
    path = "/api/v1/friends/requests/{username}/accept",
    params(("username" = String, Path, description = "Requesting user")),
    responses(
        (status = 204, description = "Request accepted"),
        (status = 401, description = "Login required", body = DomainError),
        (status = 404, description = "No pending request", body = DomainError)
    ),
    tags = ["social"],
    operation_id = "acceptFriendRequest"
)]
#[post("/friends/requests/{username}/accept")]
pub async fn accept_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    state.social.accept_request(&user, &path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Decline a pending request from `username`.
#[utoipa::path(
    post,
    path = "/api/v1/friends/requests/{username}/decline",
    params(("username" = String, Path, description = "Requesting user")),
    responses(
        (status = 204, description = "Request declined"),
        (status = 401, description = "Login required", body = DomainError),
        (status = 404, description = "No pending request", body = DomainError)
    ),
    tags = ["social"],
    operation_id = "declineFriendRequest"
)]
#[post("/friends/requests/{username}/decline")]
pub async fn decline_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    state.social.decline_request(&user, &path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Withdraw a request previously sent to `username`.
#[utoipa::path(
    delete,
    path = "/api/v1/friends/requests/{username}",
    params(("username" = String, Path, description = "Requested user")),
    responses(
        (status = 204, description = "Request withdrawn"),
        (status = 401, description = "Login required", body = DomainError),
        (status = 404, description = "No pending request", body = DomainError)
    ),
    tags = ["social"],
    operation_id = "cancelFriendRequest"
)]
#[delete("/friends/requests/{username}")]
pub async fn cancel_request(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    state.social.cancel_request(&user, &path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Dissolve an accepted friendship.
#[utoipa::path(
    delete,
    path = "/api/v1/friends/{username}",
    params(("username" = String, Path, description = "Friend to remove")),
    responses(
        (status = 204, description = "Friendship removed"),
        (status = 401, description = "Login required", body = DomainError),
        (status = 404, description = "Not friends", body = DomainError)
    ),
    tags = ["social"],
    operation_id = "removeFriend"
)]
#[delete("/friends/{username}")]
pub async fn remove_friend(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    state.social.remove_friend(&user, &path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Username substring search.
#[utoipa::path(
    get,
    path = "/api/v1/users/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching users", body = [UserSearchResult]),
        (status = 400, description = "Query too short", body = DomainError),
        (status = 401, description = "Login required", body = DomainError)
    ),
    tags = ["social"],
    operation_id = "searchUsers"
)]
#[get("/users/search")]
pub async fn search_users(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<SearchQuery>,
) -> ApiResult<web::Json<Vec<UserSearchResult>>> {
    let user = session.require_user_id()?;
    Ok(web::Json(state.social.search_users(&user, &query.q).await?))
}

/// Public profile for a username.
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}/profile",
    params(("username" = String, Path, description = "Profile owner")),
    responses(
        (status = 200, description = "Profile", body = ProfileView),
        (status = 404, description = "No such user", body = DomainError)
    ),
    tags = ["social"],
    operation_id = "userProfile",
    security([])
)]
#[get("/users/{username}/profile")]
pub async fn profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ProfileView>> {
    let viewer = session.user_id()?;
    Ok(web::Json(
        state.social.profile(viewer.as_ref(), &path).await?,
    ))
}
