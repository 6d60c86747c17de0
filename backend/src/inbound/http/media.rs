//! Picture attachment API handlers.
//!
//! Files are uploaded to the third-party host by the client; these
//! endpoints register and manage the resulting metadata.
//!
//! ```text
//! POST   /api/v1/entries/{id}/pictures {"fileHostId":"abc","url":"https://..."}
//! DELETE /api/v1/pictures/{id}
//! ```

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{NewPictureMetadata, PictureDeleteReceipt, PictureView};
use crate::domain::{DomainError, EntryId, PictureId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::ApiResult;

/// Request body registering an uploaded file against an entry.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachPictureRequest {
    pub file_host_id: String,
    pub url: String,
    pub sort_order: Option<i32>,
}

/// Request body replacing an entry's attachment order.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub picture_ids: Vec<String>,
}

fn parse_entry_id(raw: &str) -> Result<EntryId, DomainError> {
    EntryId::parse(raw).ok_or_else(|| DomainError::invalid_request("invalid entry id"))
}

fn parse_picture_id(raw: &str) -> Result<PictureId, DomainError> {
    PictureId::parse(raw).ok_or_else(|| DomainError::invalid_request("invalid picture id"))
}

/// Attach uploaded file metadata to an entry.
#[utoipa::path(
    post,
    path = "/api/v1/entries/{id}/pictures",
    params(("id" = String, Path, description = "Entry id")),
    request_body = AttachPictureRequest,
    responses(
        (status = 201, description = "Attachment registered", body = PictureView),
        (status = 400, description = "Invalid request", body = DomainError),
        (status = 401, description = "Login required", body = DomainError),
        (status = 404, description = "Entry not found", body = DomainError)
    ),
    tags = ["pictures"],
    operation_id = "attachPicture"
)]
#[post("/entries/{id}/pictures")]
pub async fn attach_picture(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<AttachPictureRequest>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    let entry = parse_entry_id(&path)?;
    let payload = payload.into_inner();
    let view = state
        .media
        .attach(
            &user,
            &entry,
            NewPictureMetadata {
                file_host_id: payload.file_host_id,
                url: payload.url,
                sort_order: payload.sort_order,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(view))
}

/// List an entry's attachments in display order.
#[utoipa::path(
    get,
    path = "/api/v1/entries/{id}/pictures",
    params(("id" = String, Path, description = "Entry id")),
    responses(
        (status = 200, description = "Attachments", body = [PictureView]),
        (status = 404, description = "Not found or not visible", body = DomainError)
    ),
    tags = ["pictures"],
    operation_id = "entryPictures",
    security([])
)]
#[get("/entries/{id}/pictures")]
pub async fn entry_pictures(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<PictureView>>> {
    let viewer = session.viewer()?;
    let entry = parse_entry_id(&path)?;
    Ok(web::Json(state.media.entry_pictures(&viewer, &entry).await?))
}

/// Replace an entry's attachment order.
#[utoipa::path(
    put,
    path = "/api/v1/entries/{id}/pictures/order",
    params(("id" = String, Path, description = "Entry id")),
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Attachments in new order", body = [PictureView]),
        (status = 400, description = "Invalid request", body = DomainError),
        (status = 401, description = "Login required", body = DomainError),
        (status = 404, description = "Entry not found", body = DomainError)
    ),
    tags = ["pictures"],
    operation_id = "reorderPictures"
)]
#[put("/entries/{id}/pictures/order")]
pub async fn reorder_pictures(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ReorderRequest>,
) -> ApiResult<web::Json<Vec<PictureView>>> {
    let user = session.require_user_id()?;
    let entry = parse_entry_id(&path)?;
    let ordered: Result<Vec<PictureId>, DomainError> = payload
        .picture_ids
        .iter()
        .map(|raw| parse_picture_id(raw))
        .collect();
    Ok(web::Json(
        state.media.reorder(&user, &entry, ordered?).await?,
    ))
}

/// Delete one attachment, returning the host id to release remotely.
#[utoipa::path(
    delete,
    path = "/api/v1/pictures/{id}",
    params(("id" = String, Path, description = "Picture id")),
    responses(
        (status = 200, description = "Delete receipt", body = PictureDeleteReceipt),
        (status = 401, description = "Login required", body = DomainError),
        (status = 404, description = "Not found", body = DomainError)
    ),
    tags = ["pictures"],
    operation_id = "deletePicture"
)]
#[delete("/pictures/{id}")]
pub async fn delete_picture(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<PictureDeleteReceipt>> {
    let user = session.require_user_id()?;
    let id = parse_picture_id(&path)?;
    Ok(web::Json(state.media.delete(&user, &id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::test_utils::{memory_state, test_session_middleware};
    use crate::inbound::http::{entries, identity};
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    fn app_with_state(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(state))
            .wrap(test_session_middleware())
            .service(
                web::scope("/api/v1")
                    .service(identity::register)
                    .service(entries::save_entry)
                    .service(attach_picture)
                    .service(entry_pictures)
                    .service(reorder_pictures)
                    .service(delete_picture),
            )
    }

    async fn register_user(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        username: &str,
    ) -> Cookie<'static> {
        let response = test::call_service(
            app,
            test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(json!({
                    "email": format!("{username}@example.com"),
                    "username": username,
                    "password": "hunter2"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("session cookie")
            .into_owned()
    }

    async fn create_entry(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        cookie: &Cookie<'static>,
    ) -> String {
        let response = test::call_service(
            app,
            test::TestRequest::post()
                .uri("/api/v1/entries")
                .cookie(cookie.clone())
                .set_json(json!({
                    "date": "2024-03-01",
                    "title": "t",
                    "content": "c"
                }))
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(response).await;
        body["id"].as_str().expect("entry id").to_owned()
    }

    #[actix_web::test]
    async fn attach_list_and_delete() {
        let app = test::init_service(app_with_state(memory_state())).await;
        let cookie = register_user(&app, "reader_01").await;
        let entry = create_entry(&app, &cookie).await;

        let attached = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/entries/{entry}/pictures"))
                .cookie(cookie.clone())
                .set_json(json!({
                    "fileHostId": "host-1",
                    "url": "https://files.example.com/1"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(attached.status(), StatusCode::CREATED);
        let picture: Value = test::read_body_json(attached).await;

        let listed = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/entries/{entry}/pictures"))
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(listed).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));

        let deleted = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!(
                    "/api/v1/pictures/{}",
                    picture["id"].as_str().expect("picture id")
                ))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(deleted.status(), StatusCode::OK);
        let receipt: Value = test::read_body_json(deleted).await;
        assert_eq!(receipt["fileHostId"], "host-1");
    }

    #[actix_web::test]
    async fn reorder_round_trip() {
        let app = test::init_service(app_with_state(memory_state())).await;
        let cookie = register_user(&app, "reader_01").await;
        let entry = create_entry(&app, &cookie).await;

        let mut ids = Vec::new();
        for host in ["a", "b"] {
            let response = test::call_service(
                &app,
                test::TestRequest::post()
                    .uri(&format!("/api/v1/entries/{entry}/pictures"))
                    .cookie(cookie.clone())
                    .set_json(json!({
                        "fileHostId": host,
                        "url": format!("https://files.example.com/{host}")
                    }))
                    .to_request(),
            )
            .await;
            let body: Value = test::read_body_json(response).await;
            ids.push(body["id"].as_str().expect("picture id").to_owned());
        }

        let reordered = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&format!("/api/v1/entries/{entry}/pictures/order"))
                .cookie(cookie)
                .set_json(json!({ "pictureIds": [ids[1], ids[0]] }))
                .to_request(),
        )
        .await;
        assert_eq!(reordered.status(), StatusCode::OK);
        let body: Value = test::read_body_json(reordered).await;
        assert_eq!(body[0]["id"], ids[1].as_str());
    }

    #[actix_web::test]
    async fn foreign_attachment_is_not_found() {
        let app = test::init_service(app_with_state(memory_state())).await;
        let owner = register_user(&app, "owner_01").await;
        let intruder = register_user(&app, "other_01").await;
        let entry = create_entry(&app, &owner).await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/entries/{entry}/pictures"))
                .cookie(intruder)
                .set_json(json!({
                    "fileHostId": "host-1",
                    "url": "https://files.example.com/1"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
