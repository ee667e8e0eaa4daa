// Account data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::validation::validate_not_blank;

/// Account database model
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    /// The single refresh token currently honoured for this account
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public projection of an account (excludes password_hash and refresh_token)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub id: Uuid,
    #[schema(example = "Ada Lovelace")]
    pub full_name: String,
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "ada@x.com")]
    pub email: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            full_name: account.full_name,
            username: account.username,
            email: account.email,
            avatar_url: account.avatar_url,
            cover_image_url: account.cover_image_url,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Fields required to insert a new account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
}

/// Which profile image an upload replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Avatar,
    CoverImage,
}

impl MediaKind {
    /// Multipart field name carrying the file
    pub fn form_field(&self) -> &'static str {
        match self {
            MediaKind::Avatar => "avatar",
            MediaKind::CoverImage => "coverImage",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Avatar => write!(f, "avatar"),
            MediaKind::CoverImage => write!(f, "cover image"),
        }
    }
}

/// A single write against an account record.
///
/// Writes are last-write-wins at the storage layer.
#[derive(Debug, Clone)]
pub enum AccountUpdate {
    /// Store a new refresh token, or clear it with `None`
    RefreshToken(Option<String>),
    PasswordHash(String),
    Media { kind: MediaKind, url: String },
    /// Replace whichever identity fields are present
    Details {
        full_name: Option<String>,
        username: Option<String>,
        email: Option<String>,
    },
}

/// Registration form fields (files travel separately)
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom = "validate_not_blank")]
    pub full_name: String,
    #[validate(custom = "validate_not_blank")]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom = "validate_not_blank")]
    pub password: String,
}

/// Login request DTO; either username or email identifies the account
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada")]
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// The username when given, otherwise the email
    pub fn identifier(&self) -> Option<&str> {
        [self.username.as_deref(), self.email.as_deref()]
            .into_iter()
            .flatten()
            .find(|v| !v.trim().is_empty())
    }
}

/// Token refresh request DTO
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RefreshRequest {
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// Password change request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[serde(default, alias = "oldPassword")]
    #[validate(custom = "validate_not_blank")]
    pub old_password: String,
    #[serde(default, alias = "newPassword")]
    #[validate(custom = "validate_not_blank")]
    pub new_password: String,
}

/// Account details update DTO; omitted fields are left untouched
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAccountRequest {
    #[serde(default, alias = "fullName")]
    #[validate(custom = "validate_not_blank")]
    pub full_name: Option<String>,
    #[serde(default)]
    #[validate(custom = "validate_not_blank")]
    pub username: Option<String>,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
}

impl UpdateAccountRequest {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.username.is_none() && self.email.is_none()
    }
}

/// Authentication response DTO
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AccountResponse,
}

/// Plain acknowledgement body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Logout successful")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
