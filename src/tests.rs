// Handler tests for the account API
// The seed account is registered through the service; everything else goes over HTTP

use super::*;
use axum::body::Bytes;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};

use crate::testutil::{register_request, sample_file, state_with, test_state, StubUploader};

// ============================================================================
// Test Helpers
// ============================================================================

async fn create_test_app() -> TestServer {
    let state = test_state();
    state
        .auth_service
        .register(
            register_request("ada", "ada@x.com", "s3cret!"),
            Some(sample_file("ada.png")),
            None,
        )
        .await
        .expect("Failed to seed account");

    TestServer::new(create_router(state)).unwrap()
}

async fn login(server: &TestServer) -> Value {
    let response = server
        .post("/api/v1/users/login")
        .json(&json!({ "username": "ada", "password": "s3cret!" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<Value>()
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

fn token_of(body: &Value, key: &str) -> String {
    body[key].as_str().unwrap().to_string()
}

fn image_part(file_name: &str) -> Part {
    Part::bytes(sample_file(file_name).bytes)
        .file_name(file_name)
        .mime_type("image/png")
}

/// Registration text fields for grace, without any file part
fn grace_form() -> MultipartForm {
    MultipartForm::new()
        .add_text("fullName", "Grace Hopper")
        .add_text("username", "grace")
        .add_text("email", "grace@x.com")
        .add_text("password", "cobol")
}

// ============================================================================
// Register (multipart)
// ============================================================================

#[tokio::test]
async fn test_register_multipart_with_avatar_and_cover() {
    let server = create_test_app().await;

    let response = server
        .post("/api/v1/users/register")
        .multipart(
            grace_form()
                .add_part("avatar", image_part("grace.png"))
                .add_part("coverImage", image_part("navy.png")),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["username"], "grace");
    assert_eq!(body["full_name"], "Grace Hopper");
    assert_eq!(body["avatar_url"], "https://media.test/grace.png");
    assert_eq!(body["cover_image_url"], "https://media.test/navy.png");
    assert!(body.get("password_hash").is_none());
    assert!(body.get("refresh_token").is_none());

    let response = server
        .post("/api/v1/users/login")
        .json(&json!({ "username": "grace", "password": "cobol" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_multipart_accepts_snake_case_fields() {
    let server = create_test_app().await;

    let form = MultipartForm::new()
        .add_text("full_name", "Grace Hopper")
        .add_text("username", "grace")
        .add_text("email", "grace@x.com")
        .add_text("password", "cobol")
        .add_part("avatar", image_part("grace.png"))
        .add_part("cover_image", image_part("navy.png"));

    let response = server.post("/api/v1/users/register").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["full_name"], "Grace Hopper");
    assert_eq!(body["cover_image_url"], "https://media.test/navy.png");
}

#[tokio::test]
async fn test_register_multipart_without_avatar() {
    let server = create_test_app().await;

    let response = server
        .post("/api/v1/users/register")
        .multipart(grace_form())
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_register_multipart_rejected_cover_fails() {
    let server =
        TestServer::new(create_router(state_with(StubUploader::default().failing_on("navy.png"))))
            .unwrap();

    let response = server
        .post("/api/v1/users/register")
        .multipart(
            grace_form()
                .add_part("avatar", image_part("grace.png"))
                .add_part("coverImage", image_part("navy.png")),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["error_code"], "UPLOAD_FAILURE");

    let response = server
        .post("/api/v1/users/login")
        .json(&json!({ "username": "grace", "password": "cobol" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_truncated_multipart_is_validation_error() {
    let server = create_test_app().await;

    let response = server
        .post("/api/v1/users/register")
        .content_type("multipart/form-data; boundary=XBOUNDARY")
        .bytes(Bytes::from_static(
            b"--XBOUNDARY\r\nContent-Disposition: form-data; name=\"username\"\r\n\r\ngra",
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error_code"], "VALIDATION_ERROR");
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_sets_session_cookies() {
    let server = create_test_app().await;

    let response = server
        .post("/api/v1/users/login")
        .json(&json!({ "email": "ada@x.com", "password": "s3cret!" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);

    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));
    assert!(cookies.iter().all(|c| c.contains("HttpOnly")));

    let body = response.json::<Value>();
    assert_eq!(body["user"]["username"], "ada");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("refresh_token").is_none());
}

#[tokio::test]
async fn test_login_wrong_password_and_unknown_user() {
    let server = create_test_app().await;

    let response = server
        .post("/api/v1/users/login")
        .json(&json!({ "username": "ada", "password": "wrong" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error_code"], "UNAUTHORIZED");

    let response = server
        .post("/api/v1/users/login")
        .json(&json!({ "username": "nobody", "password": "s3cret!" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .post("/api/v1/users/login")
        .json(&json!({ "password": "s3cret!" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn test_refresh_via_header_then_reuse_fails() {
    let server = create_test_app().await;
    let session = login(&server).await;
    let refresh_token = token_of(&session, "refresh_token");

    let response = server
        .post("/api/v1/users/refresh-token")
        .add_header(
            HeaderName::from_static("x-refresh-token"),
            HeaderValue::from_str(&refresh_token).unwrap(),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let rotated = response.json::<Value>();
    assert_ne!(token_of(&rotated, "refresh_token"), refresh_token);

    let response = server
        .post("/api/v1/users/refresh-token")
        .add_header(
            HeaderName::from_static("x-refresh-token"),
            HeaderValue::from_str(&refresh_token).unwrap(),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_via_body_and_cookie() {
    let server = create_test_app().await;
    let session = login(&server).await;

    let response = server
        .post("/api/v1/users/refresh-token")
        .json(&json!({ "refreshToken": token_of(&session, "refresh_token") }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let rotated = response.json::<Value>();

    let cookie = format!("refreshToken={}", token_of(&rotated, "refresh_token"));
    let response = server
        .post("/api/v1/users/refresh-token")
        .add_header(header::COOKIE, HeaderValue::from_str(&cookie).unwrap())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_without_token_unauthorized() {
    let server = create_test_app().await;

    let response = server.post("/api/v1/users/refresh-token").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Protected routes
// ============================================================================

#[tokio::test]
async fn test_current_user_requires_access_token() {
    let server = create_test_app().await;

    let response = server.get("/api/v1/users/current-user").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let session = login(&server).await;
    let response = server
        .get("/api/v1/users/current-user")
        .add_header(header::AUTHORIZATION, bearer(&token_of(&session, "access_token")))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["email"], "ada@x.com");
}

#[tokio::test]
async fn test_logout_clears_cookies_and_revokes_refresh() {
    let server = create_test_app().await;
    let session = login(&server).await;

    let response = server
        .post("/api/v1/users/logout")
        .add_header(header::AUTHORIZATION, bearer(&token_of(&session, "access_token")))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["message"], "Logout successful");

    let cleared: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cleared.len(), 2);
    assert!(cleared.iter().all(|c| c.contains("Max-Age=0")));

    let response = server
        .post("/api/v1/users/refresh-token")
        .json(&json!({ "refresh_token": token_of(&session, "refresh_token") }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password_over_http() {
    let server = create_test_app().await;
    let session = login(&server).await;
    let access = bearer(&token_of(&session, "access_token"));

    let response = server
        .post("/api/v1/users/change-password")
        .add_header(header::AUTHORIZATION, access.clone())
        .json(&json!({ "oldPassword": "wrong", "newPassword": "p2" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = server
        .post("/api/v1/users/change-password")
        .add_header(header::AUTHORIZATION, access)
        .json(&json!({ "oldPassword": "s3cret!", "newPassword": "p2" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .post("/api/v1/users/login")
        .json(&json!({ "username": "ada", "password": "p2" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_account_over_http() {
    let server = create_test_app().await;
    let session = login(&server).await;
    let access = bearer(&token_of(&session, "access_token"));

    let response = server
        .patch("/api/v1/users/update-account")
        .add_header(header::AUTHORIZATION, access.clone())
        .json(&json!({ "fullName": "Ada King" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["full_name"], "Ada King");

    let response = server
        .patch("/api/v1/users/update-account")
        .add_header(header::AUTHORIZATION, access)
        .json(&json!({}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_update_avatar_over_http() {
    let server = create_test_app().await;
    let session = login(&server).await;
    let access = bearer(&token_of(&session, "access_token"));

    let response = server
        .patch("/api/v1/users/avatar")
        .add_header(header::AUTHORIZATION, access.clone())
        .multipart(MultipartForm::new().add_part("avatar", image_part("fresh.png")))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>()["avatar_url"],
        "https://media.test/fresh.png"
    );

    // a cover part is not an avatar
    let response = server
        .patch("/api/v1/users/avatar")
        .add_header(header::AUTHORIZATION, access)
        .multipart(MultipartForm::new().add_part("coverImage", image_part("wide.png")))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error_code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_update_cover_image_over_http() {
    let server = create_test_app().await;
    let session = login(&server).await;
    let access = bearer(&token_of(&session, "access_token"));

    let response = server
        .patch("/api/v1/users/cover-image")
        .add_header(header::AUTHORIZATION, access.clone())
        .multipart(MultipartForm::new().add_part("coverImage", image_part("wide.png")))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["cover_image_url"], "https://media.test/wide.png");
    assert_eq!(body["avatar_url"], "https://media.test/ada.png");

    let response = server
        .patch("/api/v1/users/cover-image")
        .add_header(header::AUTHORIZATION, access)
        .multipart(MultipartForm::new().add_text("note", "no file"))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .patch("/api/v1/users/cover-image")
        .multipart(MultipartForm::new().add_part("coverImage", image_part("wide.png")))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let server = create_test_app().await;

    let response = server.get("/api-docs/openapi.json").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let doc = response.json::<Value>();
    assert!(doc["paths"].get("/api/v1/users/refresh-token").is_some());
}
