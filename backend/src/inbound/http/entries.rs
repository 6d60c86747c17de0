//! Diary entry API handlers.
//!
//! ```text
//! POST /api/v1/entries {"date":"2024-03-01","title":"...","content":"..."}
//! GET  /api/v1/entries/date/2024-03-01
//! GET  /api/v1/feed?month=2024-03&search=hiking&limit=20
//! ```
//!
//! By-date routes operate on the latest entry sharing that date; by-id
//! routes address one entry exactly. Literal `date` segments are
//! registered before the `{id}` matcher.

use actix_web::{delete, get, post, put, web, HttpResponse};
use pagination::{Page, PageParams};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{
    DeleteReceipt, EntryChanges, EntryView, EntryWithPictures, FeedEntry, FeedFilter, NewEntry,
    SaveReceipt,
};
use crate::domain::{DomainError, EntryDate, EntryId, PrivacyTier};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Request body for creating an entry.
///
/// `privacy` takes a tier name; the legacy boolean `isPrivate` is still
/// honoured when `privacy` is absent.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveEntryRequest {
    pub date: String,
    pub title: String,
    pub content: String,
    pub privacy: Option<String>,
    pub is_private: Option<bool>,
}

/// Request body for updating an entry; absent fields keep their value.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub privacy: Option<String>,
    pub is_private: Option<bool>,
}

impl UpdateEntryRequest {
    fn into_changes(self) -> EntryChanges {
        let privacy = if self.privacy.is_some() || self.is_private.is_some() {
            Some(PrivacyTier::normalize(
                self.privacy.as_deref(),
                self.is_private,
            ))
        } else {
            None
        };
        EntryChanges {
            title: self.title,
            content: self.content,
            privacy,
        }
    }
}

/// Query parameters for the public feed.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub username: Option<String>,
    pub date: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
    pub search: Option<String>,
    pub max_content: Option<usize>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Paginated feed response.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub items: Vec<FeedEntry>,
    pub total: usize,
    pub has_more: bool,
}

impl From<Page<FeedEntry>> for FeedPage {
    fn from(page: Page<FeedEntry>) -> Self {
        Self {
            items: page.items,
            total: page.total,
            has_more: page.has_more,
        }
    }
}

fn parse_date(raw: &str) -> Result<EntryDate, DomainError> {
    EntryDate::parse(raw).map_err(|err| DomainError::invalid_request(err.to_string()))
}

fn parse_entry_id(raw: &str) -> Result<EntryId, DomainError> {
    EntryId::parse(raw).ok_or_else(|| DomainError::invalid_request("invalid entry id"))
}

/// Create a diary entry.
#[utoipa::path(
    post,
    path = "/api/v1/entries",
    request_body = SaveEntryRequest,
    responses(
        (status = 201, description = "Entry saved with experience award", body = SaveReceipt),
        (status = 400, description = "Invalid request", body = DomainError),
        (status = 401, description = "Login required", body = DomainError)
    ),
    tags = ["entries"],
    operation_id = "saveEntry"
)]
#[post("/entries")]
pub async fn save_entry(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SaveEntryRequest>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    let payload = payload.into_inner();
    if payload.title.trim().is_empty() || payload.content.trim().is_empty() {
        return Err(DomainError::invalid_request(
            "date, title, and content are required",
        ));
    }
    let entry = NewEntry {
        date: parse_date(&payload.date)?,
        title: payload.title,
        content: payload.content,
        privacy: PrivacyTier::normalize(payload.privacy.as_deref(), payload.is_private),
    };
    let receipt = state.diary.save_entry(&user, entry).await?;
    Ok(HttpResponse::Created().json(receipt))
}

/// List every entry the signed-in user has written.
#[utoipa::path(
    get,
    path = "/api/v1/entries",
    responses(
        (status = 200, description = "Entries, newest first", body = [EntryView]),
        (status = 401, description = "Login required", body = DomainError)
    ),
    tags = ["entries"],
    operation_id = "listEntries"
)]
#[get("/entries")]
pub async fn list_entries(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<EntryView>>> {
    let user = session.require_user_id()?;
    Ok(web::Json(state.diary.list_own(&user).await?))
}

/// The signed-in user's entries on one date.
#[utoipa::path(
    get,
    path = "/api/v1/entries/date/{date}",
    params(("date" = String, Path, description = "ISO date, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Entries for the date", body = [EntryView]),
        (status = 400, description = "Invalid date", body = DomainError),
        (status = 401, description = "Login required", body = DomainError)
    ),
    tags = ["entries"],
    operation_id = "entriesForDate"
)]
#[get("/entries/date/{date}")]
pub async fn entries_for_date(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<EntryView>>> {
    let user = session.require_user_id()?;
    let date = parse_date(&path)?;
    Ok(web::Json(state.diary.entries_for_date(&user, date).await?))
}

/// Update the latest entry on a date.
#[utoipa::path(
    put,
    path = "/api/v1/entries/date/{date}",
    params(("date" = String, Path, description = "ISO date, YYYY-MM-DD")),
    request_body = UpdateEntryRequest,
    responses(
        (status = 200, description = "Updated entry", body = EntryView),
        (status = 400, description = "Invalid request", body = DomainError),
        (status = 401, description = "Login required", body = DomainError),
        (status = 404, description = "No entry on that date", body = DomainError)
    ),
    tags = ["entries"],
    operation_id = "updateEntryByDate"
)]
#[put("/entries/date/{date}")]
pub async fn update_entry_by_date(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateEntryRequest>,
) -> ApiResult<web::Json<EntryView>> {
    let user = session.require_user_id()?;
    let date = parse_date(&path)?;
    let changes = payload.into_inner().into_changes();
    Ok(web::Json(
        state.diary.update_by_date(&user, date, changes).await?,
    ))
}

/// Delete the latest entry on a date.
#[utoipa::path(
    delete,
    path = "/api/v1/entries/date/{date}",
    params(("date" = String, Path, description = "ISO date, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Delete receipt", body = DeleteReceipt),
        (status = 401, description = "Login required", body = DomainError),
        (status = 404, description = "No entry on that date", body = DomainError)
    ),
    tags = ["entries"],
    operation_id = "deleteEntryByDate"
)]
#[delete("/entries/date/{date}")]
pub async fn delete_entry_by_date(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeleteReceipt>> {
    let user = session.require_user_id()?;
    let date = parse_date(&path)?;
    Ok(web::Json(state.diary.delete_by_date(&user, date).await?))
}

/// Flip the latest entry on a date between private and public.
#[utoipa::path(
    post,
    path = "/api/v1/entries/date/{date}/toggle",
    params(("date" = String, Path, description = "ISO date, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Updated entry", body = EntryView),
        (status = 401, description = "Login required", body = DomainError),
        (status = 404, description = "No entry on that date", body = DomainError)
    ),
    tags = ["entries"],
    operation_id = "togglePrivacy"
)]
#[post("/entries/date/{date}/toggle")]
pub async fn toggle_privacy(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<EntryView>> {
    let user = session.require_user_id()?;
    let date = parse_date(&path)?;
    Ok(web::Json(state.diary.toggle_privacy(&user, date).await?))
}

/// Fetch one entry with its attachments.
///
/// Entries the viewer may not see resolve as not-found.
#[utoipa::path(
    get,
    path = "/api/v1/entries/{id}",
    params(("id" = String, Path, description = "Entry id")),
    responses(
        (status = 200, description = "Entry with attachments", body = EntryWithPictures),
        (status = 404, description = "Not found or not visible", body = DomainError)
    ),
    tags = ["entries"],
    operation_id = "getEntry",
    security([])
)]
#[get("/entries/{id}")]
pub async fn get_entry(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<EntryWithPictures>> {
    let viewer = session.viewer()?;
    let id = parse_entry_id(&path)?;
    Ok(web::Json(state.diary.get_entry(&viewer, &id).await?))
}

/// Update one entry by id.
#[utoipa::path(
    put,
    path = "/api/v1/entries/{id}",
    params(("id" = String, Path, description = "Entry id")),
    request_body = UpdateEntryRequest,
    responses(
        (status = 200, description = "Updated entry", body = EntryView),
        (status = 400, description = "Invalid request", body = DomainError),
        (status = 401, description = "Login required", body = DomainError),
        (status = 404, description = "Not found", body = DomainError)
    ),
    tags = ["entries"],
    operation_id = "updateEntry"
)]
#[put("/entries/{id}")]
pub async fn update_entry(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateEntryRequest>,
) -> ApiResult<web::Json<EntryView>> {
    let user = session.require_user_id()?;
    let id = parse_entry_id(&path)?;
    let changes = payload.into_inner().into_changes();
    Ok(web::Json(
        state.diary.update_by_id(&user, &id, changes).await?,
    ))
}

/// Delete one entry by id.
#[utoipa::path(
    delete,
    path = "/api/v1/entries/{id}",
    params(("id" = String, Path, description = "Entry id")),
    responses(
        (status = 200, description = "Delete receipt", body = DeleteReceipt),
        (status = 401, description = "Login required", body = DomainError),
        (status = 404, description = "Not found", body = DomainError)
    ),
    tags = ["entries"],
    operation_id = "deleteEntry"
)]
#[delete("/entries/{id}")]
pub async fn delete_entry(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeleteReceipt>> {
    let user = session.require_user_id()?;
    let id = parse_entry_id(&path)?;
    Ok(web::Json(state.diary.delete_by_id(&user, &id).await?))
}

/// Browse entries visible to the viewer.
#[utoipa::path(
    get,
    path = "/api/v1/feed",
    params(FeedQuery),
    responses(
        (status = 200, description = "Feed page", body = FeedPage),
        (status = 400, description = "Invalid pagination", body = DomainError)
    ),
    tags = ["entries"],
    operation_id = "feed",
    security([])
)]
#[get("/feed")]
pub async fn feed(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<FeedQuery>,
) -> ApiResult<web::Json<FeedPage>> {
    let viewer = session.viewer()?;
    let query = query.into_inner();
    let page = PageParams::from_raw(query.limit, query.offset)
        .map_err(|err| DomainError::invalid_request(err.to_string()))?;
    let filter = FeedFilter {
        username: query.username,
        date: query.date,
        month: query.month,
        year: query.year,
        search: query.search,
        max_content: query.max_content,
    };
    let result = state.diary.feed(&viewer, filter, page).await?;
    Ok(web::Json(result.into()))
}
