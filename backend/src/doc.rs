//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct generating the OpenAPI specification for
//! the REST API: every endpoint from the inbound layer, the domain view
//! schemas they exchange, and the session cookie security scheme.
//!
//! The generated specification feeds Swagger UI (debug builds) and is
//! exported via `cargo run --bin openapi-dump` for external tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{
    AccountView, DeleteReceipt, EntryView, EntryWithPictures, FeedEntry, FriendRequestView,
    FriendView, FriendshipsOverview, PictureDeleteReceipt, PictureView, ProfileView, SaveReceipt,
    UserSearchResult,
};
use crate::domain::{
    DomainError, EntryDate, EntryId, ErrorCode, Experience, PictureId, PrivacyTier, UserId,
    Username,
};
use crate::inbound::http::entries::{FeedPage, SaveEntryRequest, UpdateEntryRequest};
use crate::inbound::http::identity::{
    GoogleLoginRequest, GoogleLoginResponse, GoogleRegisterRequest, LoginRequest, RegisterRequest,
};
use crate::inbound::http::media::{AttachPictureRequest, ReorderRequest};
use crate::inbound::http::social::FriendRequestBody;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Diary backend API",
        description = "HTTP interface for session-authenticated diary entries, \
                       friendships, pictures, and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::identity::register,
        crate::inbound::http::identity::login,
        crate::inbound::http::identity::google_login,
        crate::inbound::http::identity::google_register,
        crate::inbound::http::identity::logout,
        crate::inbound::http::identity::current_user,
        crate::inbound::http::identity::ping,
        crate::inbound::http::entries::save_entry,
        crate::inbound::http::entries::list_entries,
        crate::inbound::http::entries::entries_for_date,
        crate::inbound::http::entries::update_entry_by_date,
        crate::inbound::http::entries::delete_entry_by_date,
        crate::inbound::http::entries::toggle_privacy,
        crate::inbound::http::entries::get_entry,
        crate::inbound::http::entries::update_entry,
        crate::inbound::http::entries::delete_entry,
        crate::inbound::http::entries::feed,
        crate::inbound::http::social::overview,
        crate::inbound::http::social::send_request,
        crate::inbound::http::social::accept_request,
        crate::inbound::http::social::decline_request,
        crate::inbound::http::social::cancel_request,
        crate::inbound::http::social::remove_friend,
        crate::inbound::http::social::search_users,
        crate::inbound::http::social::profile,
        crate::inbound::http::media::attach_picture,
        crate::inbound::http::media::entry_pictures,
        crate::inbound::http::media::reorder_pictures,
        crate::inbound::http::media::delete_picture,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        DomainError,
        ErrorCode,
        UserId,
        Username,
        EntryId,
        EntryDate,
        PictureId,
        PrivacyTier,
        Experience,
        AccountView,
        EntryView,
        EntryWithPictures,
        FeedEntry,
        FeedPage,
        SaveReceipt,
        DeleteReceipt,
        PictureView,
        PictureDeleteReceipt,
        FriendView,
        FriendRequestView,
        FriendshipsOverview,
        UserSearchResult,
        ProfileView,
        RegisterRequest,
        LoginRequest,
        GoogleLoginRequest,
        GoogleRegisterRequest,
        GoogleLoginResponse,
        SaveEntryRequest,
        UpdateEntryRequest,
        AttachPictureRequest,
        ReorderRequest,
        FriendRequestBody,
    )),
    tags(
        (name = "auth", description = "Registration, login, and session state"),
        (name = "entries", description = "Diary entries and the friends feed"),
        (name = "social", description = "Friend requests and user discovery"),
        (name = "pictures", description = "Picture attachments on entries"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::openapi::schema::Schema;
    use utoipa::openapi::RefOr;
    use utoipa::OpenApi;

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn openapi_error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("DomainError").expect("DomainError schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
    }

    #[test]
    fn openapi_registers_every_api_path() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/auth/register",
            "/api/v1/entries",
            "/api/v1/entries/date/{date}",
            "/api/v1/friends",
            "/api/v1/feed",
            "/health/ready",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "document should describe {path}"
            );
        }
    }

    #[test]
    fn openapi_declares_session_cookie_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.as_ref().expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}
