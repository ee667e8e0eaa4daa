use std::sync::Arc;

use account_api::{
    auth::{AuthService, CloudinaryUploader, CookieSettings, PgAccountRepository, TokenService},
    config::AppConfig,
    create_router, db, AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Account API - Starting...");

    let config = AppConfig::from_env().expect("Invalid configuration");

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let auth_service = AuthService::new(
        Arc::new(PgAccountRepository::new(db_pool)),
        Arc::new(CloudinaryUploader::new(config.media.clone())),
        TokenService::new(&config.tokens),
    );
    let state = AppState::new(
        auth_service,
        CookieSettings::new(config.cookie_secure, &config.tokens),
    );

    let app = create_router(state);

    let addr = config.server.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Account API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}
