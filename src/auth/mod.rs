// Account module
// Registration, credential checks, JWT session rotation and profile media

pub mod cookies;
pub mod error;
pub mod handlers;
pub mod media;
pub mod memory;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use cookies::CookieSettings;
pub use error::AuthError;
pub use handlers::{
    change_password_handler, current_user_handler, login_handler, logout_handler,
    refresh_handler, register_handler, update_account_handler, update_avatar_handler,
    update_cover_image_handler,
};
pub use media::{CloudinaryUploader, MediaFile, MediaUploader, UploadError, UploadedMedia};
pub use memory::InMemoryAccountRepository;
pub use middleware::AuthenticatedUser;
pub use models::{AccountResponse, AuthResponse, LoginRequest, MediaKind, RegisterRequest};
pub use repository::{AccountRepository, PgAccountRepository, StoreError};
pub use service::AuthService;
pub use token::{TokenKind, TokenPair, TokenService};
