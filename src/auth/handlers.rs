// HTTP handlers for account endpoints

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::AppendHeaders,
    Json,
};
use tracing::debug;

use crate::auth::{
    cookies::presented_refresh_token,
    error::AuthError,
    media::MediaFile,
    middleware::AuthenticatedUser,
    models::{
        AccountResponse, AuthResponse, ChangePasswordRequest, LoginRequest, MediaKind,
        MessageResponse, RefreshRequest, RegisterRequest, UpdateAccountRequest,
    },
    token::TokenPair,
};
use crate::AppState;

type CookieHeaders = AppendHeaders<[(header::HeaderName, String); 2]>;

fn set_cookies(values: [String; 2]) -> CookieHeaders {
    let [first, second] = values;
    AppendHeaders([(header::SET_COOKIE, first), (header::SET_COOKIE, second)])
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AuthError {
    AuthError::ValidationError(format!("malformed multipart body: {}", e))
}

/// Pull one file part out of a multipart field
async fn read_file(field: axum::extract::multipart::Field<'_>) -> Result<MediaFile, AuthError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(multipart_error)?;

    Ok(MediaFile {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    })
}

/// Registration form: text fields plus `avatar` and optional `coverImage` files
async fn read_register_form(
    mut multipart: Multipart,
) -> Result<(RegisterRequest, Option<MediaFile>, Option<MediaFile>), AuthError> {
    let mut request = RegisterRequest::default();
    let mut avatar = None;
    let mut cover_image = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "avatar" => avatar = Some(read_file(field).await?),
            "coverImage" | "cover_image" => cover_image = Some(read_file(field).await?),
            "fullName" | "full_name" => request.full_name = field.text().await.map_err(multipart_error)?,
            "username" => request.username = field.text().await.map_err(multipart_error)?,
            "email" => request.email = field.text().await.map_err(multipart_error)?,
            "password" => request.password = field.text().await.map_err(multipart_error)?,
            other => debug!("Ignoring unexpected form field: {}", other),
        }
    }

    Ok((request, avatar, cover_image))
}

/// Single-file form for avatar and cover updates
async fn read_media_form(
    mut multipart: Multipart,
    kind: MediaKind,
) -> Result<Option<MediaFile>, AuthError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(kind.form_field()) {
            return Ok(Some(read_file(field).await?));
        }
    }
    Ok(None)
}

/// Register a new account
/// POST /api/v1/users/register
#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ErrorResponse),
        (status = 409, description = "Username or email taken", body = crate::error::ErrorResponse),
        (status = 500, description = "Media upload failed", body = crate::error::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn register_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AccountResponse>), AuthError> {
    let (request, avatar, cover_image) = read_register_form(multipart).await?;
    let account = state
        .auth_service
        .register(request, avatar, cover_image)
        .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// Log in with username or email
/// POST /api/v1/users/login
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Wrong password", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown account", body = crate::error::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieHeaders, Json<AuthResponse>), AuthError> {
    let identifier = request.identifier().unwrap_or_default();
    let response = state
        .auth_service
        .login(identifier, &request.password)
        .await?;

    let cookies = state.cookies.session_cookies(&TokenPair {
        access_token: response.access_token.clone(),
        refresh_token: response.refresh_token.clone(),
    });

    Ok((set_cookies(cookies), Json(response)))
}

/// End the current session
/// POST /api/v1/users/logout
#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Missing or invalid access token", body = crate::error::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn logout_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<(CookieHeaders, Json<MessageResponse>), AuthError> {
    state.auth_service.logout(user.account_id).await?;

    Ok((
        set_cookies(state.cookies.cleared_cookies()),
        Json(MessageResponse::new("Logout successful")),
    ))
}

/// Rotate the refresh token
/// POST /api/v1/users/refresh-token
#[utoipa::path(
    post,
    path = "/api/v1/users/refresh-token",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Missing, invalid or rotated refresh token", body = crate::error::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn refresh_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> Result<(CookieHeaders, Json<TokenPair>), AuthError> {
    let body_token = body.and_then(|Json(request)| request.refresh_token);
    let presented = presented_refresh_token(&headers, body_token.as_deref());

    let tokens = state
        .auth_service
        .refresh_tokens(presented.as_deref())
        .await?;

    Ok((set_cookies(state.cookies.session_cookies(&tokens)), Json(tokens)))
}

/// Change the password of the current account
/// POST /api/v1/users/change-password
#[utoipa::path(
    post,
    path = "/api/v1/users/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Old password rejected", body = crate::error::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn change_password_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    state
        .auth_service
        .change_password(user.account_id, request)
        .await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// Get the current account
/// GET /api/v1/users/current-user
#[utoipa::path(
    get,
    path = "/api/v1/users/current-user",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Missing or invalid access token", body = crate::error::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn current_user_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<AccountResponse>, AuthError> {
    let account = state
        .auth_service
        .get_current_account(user.account_id)
        .await?;
    Ok(Json(account))
}

/// Update display name, username or email
/// PATCH /api/v1/users/update-account
#[utoipa::path(
    patch,
    path = "/api/v1/users/update-account",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = AccountResponse),
        (status = 409, description = "Username or email taken", body = crate::error::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_account_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, AuthError> {
    let account = state
        .auth_service
        .update_account_details(user.account_id, request)
        .await?;
    Ok(Json(account))
}

/// Replace the avatar
/// PATCH /api/v1/users/avatar
#[utoipa::path(
    patch,
    path = "/api/v1/users/avatar",
    responses(
        (status = 200, description = "Avatar updated", body = AccountResponse),
        (status = 400, description = "No avatar file sent", body = crate::error::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_avatar_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> Result<Json<AccountResponse>, AuthError> {
    let file = read_media_form(multipart, MediaKind::Avatar).await?;
    let account = state
        .auth_service
        .update_media(user.account_id, MediaKind::Avatar, file)
        .await?;
    Ok(Json(account))
}

/// Replace the cover image
/// PATCH /api/v1/users/cover-image
#[utoipa::path(
    patch,
    path = "/api/v1/users/cover-image",
    responses(
        (status = 200, description = "Cover image updated", body = AccountResponse),
        (status = 400, description = "No cover image file sent", body = crate::error::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_cover_image_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> Result<Json<AccountResponse>, AuthError> {
    let file = read_media_form(multipart, MediaKind::CoverImage).await?;
    let account = state
        .auth_service
        .update_media(user.account_id, MediaKind::CoverImage, file)
        .await?;
    Ok(Json(account))
}
