//! Tests for users API handlers.

use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test as actix_test};
use chrono::{TimeDelta, Utc};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::Value;

use super::*;
use crate::domain::password::hash_password;
use crate::domain::ports::{MockSessionTokenRepository, MockUserRepository};
use crate::domain::{AuthService, AuthSession, Role, UserId, UserRecord};
use crate::inbound::http::error::{json_config, query_config};
use crate::outbound::memory::{InMemorySessionTokenRepository, InMemoryUserRepository};

fn user(role: Role) -> User {
    User {
        id: UserId::new(1),
        username: "admin".to_owned(),
        role,
        created_at: Utc::now(),
    }
}

fn live_session(user_id: UserId) -> AuthSession {
    let now = Utc::now();
    AuthSession {
        token_digest: SessionToken::parse("t").expect("token").digest(),
        user_id,
        created_at: now,
        expires_at: now + TimeDelta::hours(1),
    }
}

macro_rules! users_app {
    ($users:expr, $tokens:expr) => {
        actix_test::init_service(
            App::new()
                .app_data(web::Data::new(UsersState::new(AuthService::new(
                    Arc::new($users),
                    Arc::new($tokens),
                    Arc::new(DefaultClock),
                    TimeDelta::hours(24),
                ))))
                .app_data(json_config())
                .app_data(query_config())
                .configure(configure),
        )
        .await
    };
}

#[rstest]
#[case(r#"{"username":"   ","password":"admin"}"#, "username")]
#[case(r#"{"username":"admin"}"#, "password")]
#[actix_web::test]
async fn login_requires_both_fields(#[case] body: &str, #[case] field: &str) {
    let app = users_app!(MockUserRepository::new(), MockSessionTokenRepository::new());

    let request = actix_test::TestRequest::post()
        .uri("/api/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(body.to_owned())
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["code"], "invalid_request");
    assert_eq!(value["message"], "Username and password are required");
    assert_eq!(value["details"]["field"], field);
}

#[actix_web::test]
async fn login_issues_a_token() {
    let hash = hash_password("admin").expect("hash");
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_username()
        .withf(|username| username == "admin")
        .returning(move |_| {
            Ok(Some(UserRecord {
                user: user(Role::admin()),
                password_hash: hash.clone(),
            }))
        });
    let mut tokens = MockSessionTokenRepository::new();
    tokens.expect_insert().times(1).returning(|_| Ok(()));
    let app = users_app!(users, tokens);

    let request = actix_test::TestRequest::post()
        .uri("/api/login")
        .set_json(LoginRequest {
            username: "admin".to_owned(),
            password: "admin".to_owned(),
        })
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["success"], true);
    assert_eq!(value["user"]["role"], "admin");
    assert_eq!(value["token"].as_str().map(str::len), Some(64));
}

#[actix_web::test]
async fn wrong_password_is_unauthorised() {
    let hash = hash_password("admin").expect("hash");
    let mut users = MockUserRepository::new();
    users.expect_find_by_username().returning(move |_| {
        Ok(Some(UserRecord {
            user: user(Role::admin()),
            password_hash: hash.clone(),
        }))
    });
    let mut tokens = MockSessionTokenRepository::new();
    tokens.expect_insert().never();
    let app = users_app!(users, tokens);

    let request = actix_test::TestRequest::post()
        .uri("/api/login")
        .set_json(LoginRequest {
            username: "admin".to_owned(),
            password: "nope".to_owned(),
        })
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["message"], "Invalid username or password");
}

#[actix_web::test]
async fn verify_needs_a_token() {
    let app = users_app!(MockUserRepository::new(), MockSessionTokenRepository::new());

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post().uri("/api/verify").to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn verify_resolves_body_token() {
    let mut tokens = MockSessionTokenRepository::new();
    tokens
        .expect_find()
        .returning(|_| Ok(Some(live_session(UserId::new(1)))));
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(|_| Ok(Some(user(Role::admin()))));
    let app = users_app!(users, tokens);

    let request = actix_test::TestRequest::post()
        .uri("/api/verify")
        .set_json(TokenRequest {
            token: Some("t".to_owned()),
        })
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["valid"], true);
    assert_eq!(value["user"]["username"], "admin");
}

#[actix_web::test]
async fn verify_rejects_unknown_token() {
    let mut tokens = MockSessionTokenRepository::new();
    tokens.expect_find().returning(|_| Ok(None));
    let app = users_app!(MockUserRepository::new(), tokens);

    let request = actix_test::TestRequest::post()
        .uri("/api/verify")
        .insert_header((header::AUTHORIZATION, "Bearer unknown"))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn logout_is_idempotent() {
    let mut tokens = MockSessionTokenRepository::new();
    tokens.expect_delete().times(1).returning(|_| Ok(false));
    let app = users_app!(MockUserRepository::new(), tokens);

    let request = actix_test::TestRequest::post()
        .uri("/api/logout")
        .set_json(TokenRequest {
            token: Some("gone".to_owned()),
        })
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["message"], "Logged out successfully");
}

#[actix_web::test]
async fn listing_users_without_token_is_unauthorised() {
    let app = users_app!(MockUserRepository::new(), MockSessionTokenRepository::new());

    let response =
        actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/users").to_request()).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn listing_users_requires_admin() {
    let mut tokens = MockSessionTokenRepository::new();
    tokens
        .expect_find()
        .returning(|_| Ok(Some(live_session(UserId::new(2)))));
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(|_| Ok(Some(user(Role::from_stored("user")))));
    users.expect_list().never();
    let app = users_app!(users, tokens);

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/users?token=t").to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admins_can_list_users() {
    let mut tokens = MockSessionTokenRepository::new();
    tokens
        .expect_find()
        .returning(|_| Ok(Some(live_session(UserId::new(1)))));
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(|_| Ok(Some(user(Role::admin()))));
    users
        .expect_list()
        .returning(|| Ok(vec![user(Role::admin())]));
    let app = users_app!(users, tokens);

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/users")
            .insert_header((header::AUTHORIZATION, "Bearer t"))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["users"].as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn logged_out_tokens_stop_verifying() {
    let auth = AuthService::new(
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(InMemorySessionTokenRepository::new()),
        Arc::new(DefaultClock),
        TimeDelta::hours(24),
    );
    auth.bootstrap_admin("admin").await.expect("bootstrap");
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(UsersState::new(auth)))
            .app_data(json_config())
            .app_data(query_config())
            .configure(configure),
    )
    .await;
    let post = |uri: &str, body: Value| {
        actix_test::TestRequest::post()
            .uri(uri)
            .set_json(body)
            .to_request()
    };

    let login_res = actix_test::call_service(
        &app,
        post("/api/login", serde_json::json!({"username": "admin", "password": "admin"})),
    )
    .await;
    assert_eq!(login_res.status(), StatusCode::OK);
    let issued: Value = actix_test::read_body_json(login_res).await;
    let token = issued["token"].as_str().expect("token").to_owned();

    let verified =
        actix_test::call_service(&app, post("/api/verify", serde_json::json!({"token": token})))
            .await;
    assert_eq!(verified.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(verified).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["role"], "admin");

    let logout_res =
        actix_test::call_service(&app, post("/api/logout", serde_json::json!({"token": token})))
            .await;
    assert_eq!(logout_res.status(), StatusCode::OK);

    let rejected =
        actix_test::call_service(&app, post("/api/verify", serde_json::json!({"token": token})))
            .await;
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
    let body: Value = actix_test::read_body_json(rejected).await;
    assert_eq!(body["code"], "unauthorized");
}
