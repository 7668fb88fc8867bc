//! End-to-end HTTP coverage of the auth lifecycle over the in-memory
//! user store: register, login, guarded routes, refresh rotation,
//! logout, and the admin surface.

use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use rocket::routes;
use rocket::serde::json::json;
use serde_json::Value;

use wayfarer_api::auth::responses::Role;
use wayfarer_api::routes;
use wayfarer_api::test_support::{TestRocketBuilder, memory_auth_state};
use wayfarer_api::users::{NewUser, UserStore};

async fn auth_client() -> (Client, wayfarer_api::auth::AuthState) {
    let (state, _users) = memory_auth_state();
    let client = TestRocketBuilder::new()
        .manage_auth_state(state.clone())
        .mount_api_routes(routes![
            wayfarer_api::auth::routes::register,
            wayfarer_api::auth::routes::login,
            wayfarer_api::auth::routes::refresh,
            wayfarer_api::auth::routes::logout,
            routes::users::me,
            routes::users::change_password,
            routes::admin::session_overview,
            routes::admin::revoke_user_sessions,
            routes::admin::update_roles,
        ])
        .async_client()
        .await;
    (client, state)
}

async fn register(client: &Client, username: &str, email: &str, password: &str) -> (Status, Value) {
    let response = client
        .post("/api/v1/auth/register")
        .header(ContentType::JSON)
        .body(json!({"username": username, "email": email, "password": password}).to_string())
        .dispatch()
        .await;
    let status = response.status();
    let body: Value = response.into_json().await.expect("JSON body");
    (status, body)
}

async fn login(client: &Client, username: &str, password: &str) -> (Status, Value) {
    let response = client
        .post("/api/v1/auth/login")
        .header(ContentType::JSON)
        .body(json!({"username": username, "password": password}).to_string())
        .dispatch()
        .await;
    let status = response.status();
    let body: Value = response.into_json().await.expect("JSON body");
    (status, body)
}

#[tokio::test]
async fn register_login_and_protected_route_flow() {
    let (client, _state) = auth_client().await;

    let (status, body) = register(&client, "bob", "bob@x.com", "Secret#123").await;
    assert_eq!(status, Status::Ok);
    assert!(body["id"].as_i64().expect("id present") > 0);
    assert_eq!(body["username"], "bob");
    assert_eq!(body["email"], "bob@x.com");
    assert!(body.get("passwordHash").is_none());

    // same username again conflicts, with the uniform error body
    let (status, body) = register(&client, "bob", "other@x.com", "Secret#123").await;
    assert_eq!(status, Status::Conflict);
    assert!(body["timestamp"].is_string());
    assert!(body["message"].is_string());
    assert_eq!(body["path"], "/api/v1/auth/register");

    let (status, tokens) = login(&client, "bob", "Secret#123").await;
    assert_eq!(status, Status::Ok);
    let access = tokens["accessToken"].as_str().expect("access token");
    let refresh = tokens["refreshToken"].as_str().expect("refresh token");
    assert!(access.starts_with("Bearer "));
    assert!(!refresh.is_empty());

    let response = client
        .get("/api/v1/users/me")
        .header(Header::new("Authorization", access.to_string()))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let me: Value = response.into_json().await.expect("profile");
    assert_eq!(me["username"], "bob");
    assert_eq!(me["roles"], json!(["ROLE_USER"]));

    let response = client.get("/api/v1/users/me").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[tokio::test]
async fn invalid_registrations_are_rejected() {
    let (client, _state) = auth_client().await;

    let (status, _) = register(&client, "ab", "short@x.com", "Secret#123").await;
    assert_eq!(status, Status::BadRequest);

    let (status, _) = register(&client, "carol", "not-an-email", "Secret#123").await;
    assert_eq!(status, Status::BadRequest);

    let (status, _) = register(&client, "carol", "carol@x.com", "weakpass").await;
    assert_eq!(status, Status::BadRequest);
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_identical() {
    let (client, _state) = auth_client().await;
    register(&client, "bob", "bob@x.com", "Secret#123").await;

    let (wrong_status, wrong_body) = login(&client, "bob", "WrongPass1").await;
    let (unknown_status, unknown_body) = login(&client, "mallory", "Secret#123").await;

    assert_eq!(wrong_status, Status::Unauthorized);
    assert_eq!(unknown_status, Status::Unauthorized);
    assert_eq!(wrong_body["message"], unknown_body["message"]);
}

#[tokio::test]
async fn refresh_rotates_via_header_and_query_param() {
    let (client, _state) = auth_client().await;
    register(&client, "bob", "bob@x.com", "Secret#123").await;
    let (_, tokens) = login(&client, "bob", "Secret#123").await;
    let first_refresh = tokens["refreshToken"].as_str().expect("refresh").to_string();

    // header carrier
    let response = client
        .post("/api/v1/auth/refresh")
        .header(Header::new("Refresh-Token", first_refresh.clone()))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let rotated: Value = response.into_json().await.expect("token pair");
    let second_refresh = rotated["refreshToken"].as_str().expect("rotated").to_string();
    assert_ne!(second_refresh, first_refresh);

    // the consumed token is single-use
    let response = client
        .post("/api/v1/auth/refresh")
        .header(Header::new("Refresh-Token", first_refresh))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);

    // query-parameter carrier
    let response = client
        .post(format!("/api/v1/auth/refresh?refreshToken={second_refresh}"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    // no carrier at all
    let response = client.post("/api/v1/auth/refresh").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[tokio::test]
async fn logout_always_succeeds_and_revokes() {
    let (client, state) = auth_client().await;
    register(&client, "bob", "bob@x.com", "Secret#123").await;
    let (_, tokens) = login(&client, "bob", "Secret#123").await;
    let refresh = tokens["refreshToken"].as_str().expect("refresh").to_string();

    // no token supplied: still 200, nothing changes
    let sessions_before = state.service.registry().len();
    let response = client.post("/api/v1/auth/logout").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(state.service.registry().len(), sessions_before);

    let response = client
        .post("/api/v1/auth/logout")
        .header(Header::new("Refresh-Token", refresh.clone()))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert!(!state.service.registry().contains(&refresh));

    // revoked token can no longer refresh
    let response = client
        .post("/api/v1/auth/refresh")
        .header(Header::new("Refresh-Token", refresh))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[tokio::test]
async fn admin_routes_enforce_the_admin_role() {
    let (client, state) = auth_client().await;
    register(&client, "bob", "bob@x.com", "Secret#123").await;
    let (_, bob_tokens) = login(&client, "bob", "Secret#123").await;
    let bob_access = bob_tokens["accessToken"].as_str().expect("access").to_string();

    // seed an admin account directly in the store
    let digest = {
        let passwords = wayfarer_api::auth::PasswordService::new().expect("password service");
        passwords.hash_password("Adm1nPass!").expect("digest")
    };
    state
        .service
        .users()
        .save(NewUser {
            username: "root".into(),
            email: "root@x.com".into(),
            password_hash: digest,
            roles: vec![Role::User, Role::Admin],
        })
        .await
        .expect("seed admin");
    let (_, admin_tokens) = login(&client, "root", "Adm1nPass!").await;
    let admin_access = admin_tokens["accessToken"].as_str().expect("access").to_string();

    // non-admin is forbidden
    let response = client
        .get("/api/v1/admin/sessions")
        .header(Header::new("Authorization", bob_access))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    // admin sees the live session count (bob's + root's refresh tokens)
    let response = client
        .get("/api/v1/admin/sessions")
        .header(Header::new("Authorization", admin_access.clone()))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let overview: Value = response.into_json().await.expect("overview");
    assert_eq!(overview["activeSessions"], 2);

    // revoking bob's sessions removes exactly his entry
    let response = client
        .delete("/api/v1/admin/sessions/bob")
        .header(Header::new("Authorization", admin_access.clone()))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let revoked: Value = response.into_json().await.expect("revoked");
    assert_eq!(revoked["revoked"], 1);

    // role update round-trips through the wire format
    let response = client
        .put("/api/v1/admin/users/bob/roles")
        .header(ContentType::JSON)
        .header(Header::new("Authorization", admin_access.clone()))
        .body(json!({"roles": ["ROLE_USER", "ROLE_MODERATOR"]}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let profile: Value = response.into_json().await.expect("profile");
    assert_eq!(profile["roles"], json!(["ROLE_USER", "ROLE_MODERATOR"]));

    // unknown target user is a 404
    let response = client
        .put("/api/v1/admin/users/nobody/roles")
        .header(ContentType::JSON)
        .header(Header::new("Authorization", admin_access))
        .body(json!({"roles": ["ROLE_USER"]}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let (client, state) = auth_client().await;
    register(&client, "bob", "bob@x.com", "Secret#123").await;
    let (_, tokens) = login(&client, "bob", "Secret#123").await;
    let access = tokens["accessToken"].as_str().expect("access").to_string();
    let refresh = tokens["refreshToken"].as_str().expect("refresh").to_string();

    let response = client
        .put("/api/v1/users/me/password")
        .header(ContentType::JSON)
        .header(Header::new("Authorization", access.clone()))
        .body(json!({"currentPassword": "WrongPass1", "newPassword": "N3wSecret!"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);

    let response = client
        .put("/api/v1/users/me/password")
        .header(ContentType::JSON)
        .header(Header::new("Authorization", access))
        .body(json!({"currentPassword": "Secret#123", "newPassword": "N3wSecret!"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    // every session died with the old password
    assert!(!state.service.registry().contains(&refresh));
    let (status, _) = login(&client, "bob", "N3wSecret!").await;
    assert_eq!(status, Status::Ok);
}
