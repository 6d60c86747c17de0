//! End-to-end API flows over in-memory adapters.
//!
//! Exercises the full handler surface the way a browser client would:
//! register, write entries, build a friendship, browse the feed, and
//! manage attachments, all through session cookies.

use std::sync::Arc;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Cookie, Key};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};

use backend::domain::ports::{
    GoogleClaims, GoogleTokenVerifier, MemoryEntryRepository, MemoryFriendshipRepository,
    MemoryPictureRepository, MemoryUserRepository, NoOpEntryCache, TokenVerificationError,
};
use backend::domain::{DiaryService, IdentityService, MediaService, SocialService};
use backend::inbound::http::state::HttpState;
use backend::inbound::http::{entries, identity, media, social};

const KNOWN_TOKEN: &str = "token-for-traveller";
const KNOWN_EMAIL: &str = "traveller@example.com";

/// Verifier accepting one fixed token, standing in for Google.
struct StaticTokenVerifier;

#[async_trait]
impl GoogleTokenVerifier for StaticTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleClaims, TokenVerificationError> {
        if id_token == KNOWN_TOKEN {
            Ok(GoogleClaims {
                email: KNOWN_EMAIL.to_owned(),
                picture: Some("https://lh3.example.com/p.jpg".to_owned()),
                audience: None,
            })
        } else {
            Err(TokenVerificationError::rejected("unknown token"))
        }
    }
}

fn state() -> HttpState {
    let users = Arc::new(MemoryUserRepository::new());
    let entries = Arc::new(MemoryEntryRepository::new());
    let friendships = Arc::new(MemoryFriendshipRepository::new());
    let pictures = Arc::new(MemoryPictureRepository::new());
    let cache = Arc::new(NoOpEntryCache);

    HttpState::new(
        Arc::new(IdentityService::new(
            Arc::clone(&users),
            Arc::new(StaticTokenVerifier),
        )),
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

fn app() -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build();

    App::new().app_data(web::Data::new(state())).service(
        web::scope("/api/v1")
            .wrap(session)
            .service(identity::register)
            .service(identity::login)
            .service(identity::google_login)
            .service(identity::google_register)
            .service(identity::logout)
            .service(identity::current_user)
            .service(identity::ping)
            .service(entries::save_entry)
            .service(entries::list_entries)
            .service(entries::entries_for_date)
            .service(entries::update_entry_by_date)
            .service(entries::delete_entry_by_date)
            .service(entries::toggle_privacy)
            .service(entries::feed)
            .service(media::attach_picture)
            .service(media::entry_pictures)
            .service(media::reorder_pictures)
            .service(media::delete_picture)
            .service(entries::get_entry)
            .service(entries::update_entry)
            .service(entries::delete_entry)
            .service(social::overview)
            .service(social::send_request)
            .service(social::accept_request)
            .service(social::decline_request)
            .service(social::cancel_request)
            .service(social::remove_friend)
            .service(social::search_users)
            .service(social::profile),
    )
}

fn session_cookie(response: &actix_web::dev::ServiceResponse) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|c| c.name() == "session")
        .expect("session cookie")
        .into_owned()
}

async fn register(
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
    session_cookie(&response)
}

async fn save_entry(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    cookie: &Cookie<'static>,
    body: Value,
) -> Value {
    let response = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/entries")
            .cookie(cookie.clone())
            .set_json(body)
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    test::read_body_json(response).await
}

async fn befriend(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    requester: &Cookie<'static>,
    recipient: &Cookie<'static>,
    requester_name: &str,
    recipient_name: &str,
) {
    let sent = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/friends/requests")
            .cookie(requester.clone())
            .set_json(json!({ "username": recipient_name }))
            .to_request(),
    )
    .await;
    assert_eq!(sent.status(), StatusCode::NO_CONTENT);

    let accepted = test::call_service(
        app,
        test::TestRequest::post()
            .uri(&format!(
                "/api/v1/friends/requests/{requester_name}/accept"
            ))
            .cookie(recipient.clone())
            .to_request(),
    )
    .await;
    assert_eq!(accepted.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn friendship_gates_feed_visibility() {
    let app = test::init_service(app()).await;
    let alice = register(&app, "alice_01").await;
    let bob = register(&app, "bobby_01").await;

    for (title, privacy) in [
        ("open", "public"),
        ("for friends", "friend"),
        ("diary only", "private"),
    ] {
        save_entry(
            &app,
            &alice,
            json!({
                "date": "2024-03-01",
                "title": title,
                "content": "text",
                "privacy": privacy
            }),
        )
        .await;
    }

    // Anonymous readers see the public tier only.
    let anon = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/feed").to_request(),
    )
    .await;
    let body: Value = test::read_body_json(anon).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["title"], "open");

    // Before the friendship, bob is an ordinary reader.
    let before = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/feed")
            .cookie(bob.clone())
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(before).await;
    assert_eq!(body["total"], 1);

    befriend(&app, &bob, &alice, "bobby_01", "alice_01").await;

    let after = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/feed")
            .cookie(bob.clone())
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(after).await;
    assert_eq!(body["total"], 2);
    assert!(body["items"]
        .as_array()
        .expect("items")
        .iter()
        .all(|item| item["isFriend"] == true));
    assert!(body["items"]
        .as_array()
        .expect("items")
        .iter()
        .all(|item| item["title"] != "diary only"));
}

#[actix_web::test]
async fn friend_entry_resolves_by_id_for_friends_only() {
    let app = test::init_service(app()).await;
    let alice = register(&app, "alice_01").await;
    let bob = register(&app, "bobby_01").await;

    let saved = save_entry(
        &app,
        &alice,
        json!({
            "date": "2024-03-02",
            "title": "for friends",
            "content": "text",
            "privacy": "friend"
        }),
    )
    .await;
    let id = saved["id"].as_str().expect("entry id").to_owned();

    // Not visible anonymously, and invisible entries read as absent.
    let anon = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/entries/{id}"))
            .to_request(),
    )
    .await;
    assert_eq!(anon.status(), StatusCode::NOT_FOUND);

    befriend(&app, &bob, &alice, "bobby_01", "alice_01").await;

    let visible = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/entries/{id}"))
            .cookie(bob)
            .to_request(),
    )
    .await;
    assert_eq!(visible.status(), StatusCode::OK);
    let body: Value = test::read_body_json(visible).await;
    assert_eq!(body["username"], "alice_01");
    assert_eq!(body["pictures"], json!([]));
}

#[actix_web::test]
async fn saving_entries_accrues_experience() {
    let app = test::init_service(app()).await;
    let cookie = register(&app, "alice_01").await;

    let first = save_entry(
        &app,
        &cookie,
        json!({ "date": "2024-03-01", "title": "a", "content": "x" }),
    )
    .await;
    assert_eq!(first["experience"], 10);

    let second = save_entry(
        &app,
        &cookie,
        json!({ "date": "2024-03-02", "title": "b", "content": "y" }),
    )
    .await;
    assert_eq!(second["experience"], 20);

    let me = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/auth/me")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(me).await;
    assert_eq!(body["experience"], 20);
}

#[actix_web::test]
async fn google_sign_in_requires_setup_then_logs_in() {
    let app = test::init_service(app()).await;

    // First contact: the email is unknown, so the client must pick a name.
    let first = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/google")
            .set_json(json!({ "idToken": KNOWN_TOKEN }))
            .to_request(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);
    let body: Value = test::read_body_json(first).await;
    assert_eq!(body["status"], "requireSetup");
    assert_eq!(body["email"], KNOWN_EMAIL);

    let created = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/google/register")
            .set_json(json!({ "idToken": KNOWN_TOKEN, "username": "traveller_01" }))
            .to_request(),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let again = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/google")
            .set_json(json!({ "idToken": KNOWN_TOKEN }))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(again).await;
    assert_eq!(body["status"], "loggedIn");
    assert_eq!(body["account"]["username"], "traveller_01");

    let bad = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/google")
            .set_json(json!({ "idToken": "forged" }))
            .to_request(),
    )
    .await;
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn attachments_follow_their_entry() {
    let app = test::init_service(app()).await;
    let cookie = register(&app, "alice_01").await;
    let saved = save_entry(
        &app,
        &cookie,
        json!({ "date": "2024-03-01", "title": "t", "content": "c" }),
    )
    .await;
    let entry_id = saved["id"].as_str().expect("entry id").to_owned();

    let mut picture_ids = Vec::new();
    for (host_id, url) in [
        ("host-a", "https://files.example.com/a.jpg"),
        ("host-b", "https://files.example.com/b.jpg"),
    ] {
        let attached = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/entries/{entry_id}/pictures"))
                .cookie(cookie.clone())
                .set_json(json!({ "fileHostId": host_id, "url": url }))
                .to_request(),
        )
        .await;
        assert_eq!(attached.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(attached).await;
        picture_ids.push(body["id"].as_str().expect("picture id").to_owned());
    }

    // Reverse the display order.
    picture_ids.reverse();
    let reordered = test::call_service(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/v1/entries/{entry_id}/pictures/order"))
            .cookie(cookie.clone())
            .set_json(json!({ "pictureIds": picture_ids }))
            .to_request(),
    )
    .await;
    assert_eq!(reordered.status(), StatusCode::OK);

    let listed = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/entries/{entry_id}/pictures"))
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(listed).await;
    let urls: Vec<&str> = body
        .as_array()
        .expect("pictures")
        .iter()
        .map(|p| p["url"].as_str().expect("url"))
        .collect();
    assert_eq!(
        urls,
        [
            "https://files.example.com/b.jpg",
            "https://files.example.com/a.jpg"
        ]
    );

    // Deleting the entry reports the host ids needing remote cleanup.
    let deleted = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/entries/{entry_id}"))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::OK);
    let body: Value = test::read_body_json(deleted).await;
    let mut hosts: Vec<&str> = body["fileHostIds"]
        .as_array()
        .expect("file host ids")
        .iter()
        .map(|v| v.as_str().expect("host id"))
        .collect();
    hosts.sort_unstable();
    assert_eq!(hosts, ["host-a", "host-b"]);
}

#[actix_web::test]
async fn search_and_profile_reflect_friendship_state() {
    let app = test::init_service(app()).await;
    let alice = register(&app, "alice_01").await;
    let bob = register(&app, "bobby_01").await;

    save_entry(
        &app,
        &alice,
        json!({ "date": "2024-03-01", "title": "t", "content": "c" }),
    )
    .await;

    let results = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/users/search?q=alice")
            .cookie(bob.clone())
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(results).await;
    assert_eq!(body[0]["username"], "alice_01");
    assert_eq!(body[0]["isFriend"], false);
    assert_eq!(body[0]["requestPending"], false);

    befriend(&app, &bob, &alice, "bobby_01", "alice_01").await;

    let overview = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/friends")
            .cookie(bob.clone())
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(overview).await;
    assert_eq!(body["friends"][0]["username"], "alice_01");
    assert_eq!(body["sent"], json!([]));
    assert_eq!(body["received"], json!([]));

    let profile = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/users/alice_01/profile")
            .cookie(bob)
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(profile).await;
    assert_eq!(body["isFriend"], true);
    assert_eq!(body["totalEntries"], 1);
    assert_eq!(body["lastEntry"], "2024-03-01");
}

#[actix_web::test]
async fn declined_and_withdrawn_requests_leave_no_edge() {
    let app = test::init_service(app()).await;
    let alice = register(&app, "alice_01").await;
    let bob = register(&app, "bobby_01").await;

    // Declined by the recipient.
    let sent = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/friends/requests")
            .cookie(bob.clone())
            .set_json(json!({ "username": "alice_01" }))
            .to_request(),
    )
    .await;
    assert_eq!(sent.status(), StatusCode::NO_CONTENT);
    let declined = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/friends/requests/bobby_01/decline")
            .cookie(alice.clone())
            .to_request(),
    )
    .await;
    assert_eq!(declined.status(), StatusCode::NO_CONTENT);

    // Withdrawn by the sender.
    let resent = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/friends/requests")
            .cookie(bob.clone())
            .set_json(json!({ "username": "alice_01" }))
            .to_request(),
    )
    .await;
    assert_eq!(resent.status(), StatusCode::NO_CONTENT);
    let withdrawn = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/v1/friends/requests/alice_01")
            .cookie(bob.clone())
            .to_request(),
    )
    .await;
    assert_eq!(withdrawn.status(), StatusCode::NO_CONTENT);

    let overview = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/friends")
            .cookie(alice)
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(overview).await;
    assert_eq!(body["friends"], json!([]));
    assert_eq!(body["received"], json!([]));
}
