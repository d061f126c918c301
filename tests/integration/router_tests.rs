//! In-process router tests
//!
//! The pool and Redis client are created lazily, so requests refused before
//! any storage access run without backing services.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use library_catalog::{
    api::create_router,
    config::AppConfig,
    error::LOGIN_PATH,
    models::user::{User, UserClaims},
    repository::Repository,
    services::{sessions::SessionService, Services},
    AppState,
};

fn test_app() -> Router {
    let config = AppConfig::default();
    let pool = PgPoolOptions::new()
        .min_connections(0)
        .connect_lazy(&config.database.url)
        .expect("Failed to create lazy pool");
    let redis = SessionService::open_client(&config.redis.url).expect("Invalid Redis URL");

    let services = Services::new(
        Repository::new(pool),
        config.auth.clone(),
        config.catalog.clone(),
        config.session.clone(),
        redis,
    );

    create_router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

fn token(is_staff: bool) -> String {
    let user = User {
        id: 7,
        username: "alice".to_string(),
        password_hash: String::new(),
        email: None,
        is_staff,
        date_joined: Utc::now(),
    };
    UserClaims::for_user(&user, 1)
        .create_token(&AppConfig::default().auth.jwt_secret)
        .expect("Failed to create token")
}

fn request(method: &str, uri: &str, bearer: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = test_app()
        .oneshot(request("GET", "/api/v1/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_my_books_redirects_to_login() {
    let response = test_app()
        .oneshot(request("GET", "/api/v1/books/my", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], LOGIN_PATH);
}

#[tokio::test]
async fn test_invalid_token_redirects_to_login() {
    let response = test_app()
        .oneshot(request("GET", "/api/v1/auth/me", Some("not-a-jwt"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], LOGIN_PATH);
}

#[tokio::test]
async fn test_reserve_requires_login() {
    let response = test_app()
        .oneshot(request("POST", "/api/v1/book/reserve?book_id=1", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_reserve_without_book_id() {
    let token = token(false);
    let response = test_app()
        .oneshot(request("POST", "/api/v1/book/reserve", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["fields"]["book_id"].is_array());
}

#[tokio::test]
async fn test_reservation_form_rejects_garbage_book_id() {
    let response = test_app()
        .oneshot(request("GET", "/api/v1/book/reserve?book_id=abc", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["fields"]["book_id"][0], "Select a valid book");
}

#[tokio::test]
async fn test_blank_review_is_rejected() {
    let token = token(false);
    let response = test_app()
        .oneshot(request(
            "POST",
            "/api/v1/book/1",
            Some(&token),
            Some(json!({ "content": "   " })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "BadValue");
    assert!(body["fields"]["content"].is_array());
}

#[tokio::test]
async fn test_review_requires_login() {
    let response = test_app()
        .oneshot(request(
            "POST",
            "/api/v1/book/1",
            None,
            Some(json!({ "content": "Loved it" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_admin_requires_staff() {
    let token = token(false);
    let response = test_app()
        .oneshot(request("GET", "/api/v1/admin/genres", Some(&token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"], "NotAuthorized");
}

#[tokio::test]
async fn test_admin_validates_before_storage() {
    let token = token(true);
    let response = test_app()
        .oneshot(request(
            "POST",
            "/api/v1/admin/books",
            Some(&token),
            Some(json!({
                "title": "Emma",
                "summary": "Matchmaking in Highbury",
                "author_id": 1,
                "genre_ids": []
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["fields"]["genre_ids"][0], "Choose genre(s) for this book");
}

#[tokio::test]
async fn test_register_validation() {
    let response = test_app()
        .oneshot(request(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({ "username": "al", "password": "short" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["fields"]["username"].is_array());
    assert!(body["fields"]["password"].is_array());
}

#[tokio::test]
async fn test_login_page_explains_redirect() {
    let response = test_app()
        .oneshot(request("GET", LOGIN_PATH, None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["login_url"], LOGIN_PATH);
}

#[tokio::test]
async fn test_review_with_unknown_shape_is_a_form_error() {
    let token = token(false);
    let response = test_app()
        .oneshot(request(
            "POST",
            "/api/v1/book/1",
            Some(&token),
            Some(json!({ "text": "hi" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "BadValue");
    assert_eq!(body["fields"]["content"][0], "This field is required");
}

#[tokio::test]
async fn test_patch_with_unknown_status_is_a_form_error() {
    let token = token(true);
    let response = test_app()
        .oneshot(request(
            "PATCH",
            "/api/v1/admin/bookinstances/3f2a9c1e-8b7d-4c6a-9e5f-1a2b3c4d5e6f",
            Some(&token),
            Some(json!({ "status": "lost" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["fields"]["status"].is_array());
}

#[tokio::test]
async fn test_malformed_json_is_a_body_error() {
    let token = token(false);
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/book/1")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"content\": "))
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["fields"]["body"].is_array());
}
