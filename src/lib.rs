//! Account service: registration, credential checks, JWT session rotation and
//! profile media, served over axum.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod validation;

#[cfg(test)]
mod testutil;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth::{
    handlers::{
        change_password_handler, current_user_handler, login_handler, logout_handler,
        refresh_handler, register_handler, update_account_handler, update_avatar_handler,
        update_cover_image_handler,
    },
    AuthService, CookieSettings,
};

/// Largest request body accepted, sized for image uploads
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        auth::handlers::logout_handler,
        auth::handlers::refresh_handler,
        auth::handlers::change_password_handler,
        auth::handlers::current_user_handler,
        auth::handlers::update_account_handler,
        auth::handlers::update_avatar_handler,
        auth::handlers::update_cover_image_handler,
    ),
    components(schemas(
        auth::models::AccountResponse,
        auth::models::AuthResponse,
        auth::models::LoginRequest,
        auth::models::RefreshRequest,
        auth::models::ChangePasswordRequest,
        auth::models::UpdateAccountRequest,
        auth::models::MessageResponse,
        auth::token::TokenPair,
        error::ErrorResponse,
    )),
    tags(
        (name = "users", description = "Registration, login and session endpoints")
    ),
    info(
        title = "Account API",
        version = "1.0.0",
        description = "User accounts with rotating JWT sessions"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub cookies: CookieSettings,
}

impl AppState {
    pub fn new(auth_service: AuthService, cookies: CookieSettings) -> Self {
        Self {
            auth_service: Arc::new(auth_service),
            cookies,
        }
    }
}

/// Account routes, relative to `/api/v1/users`
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/refresh-token", post(refresh_handler))
        .route("/change-password", post(change_password_handler))
        .route("/current-user", get(current_user_handler))
        .route("/update-account", patch(update_account_handler))
        .route("/avatar", patch(update_avatar_handler))
        .route("/cover-image", patch(update_cover_image_handler))
}

/// Creates and configures the application router
pub fn create_router(state: AppState) -> Router {
    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1/users", user_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests;
