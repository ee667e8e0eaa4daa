// JWT token generation and validation service

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::config::TokenConfig;

/// Discriminates the two token kinds; each has its own secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // account id
    pub kind: TokenKind,
    pub jti: Uuid, // unique per token, so same-second tokens still differ
    pub iat: i64,  // issued at timestamp
    pub exp: i64,  // expiration timestamp
}

#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    /// Bad signature, expired, malformed or wrong kind. Deliberately not split.
    #[error("invalid token")]
    InvalidToken,
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken => AuthError::Unauthorized,
            TokenError::Signing(msg) => AuthError::InternalError(msg),
        }
    }
}

/// A freshly minted access/refresh pair
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Token service for JWT operations
pub struct TokenService {
    access_secret: String,
    refresh_secret: String,
    access_token_duration: i64,  // in seconds
    refresh_token_duration: i64, // in seconds
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access_secret: config.access_secret.clone(),
            refresh_secret: config.refresh_secret.clone(),
            access_token_duration: config.access_ttl_seconds,
            refresh_token_duration: config.refresh_ttl_seconds,
        }
    }

    /// Generate a short-lived access token
    pub fn generate_access_token(&self, account_id: Uuid) -> Result<String, TokenError> {
        self.generate(account_id, TokenKind::Access)
    }

    /// Generate a long-lived refresh token
    pub fn generate_refresh_token(&self, account_id: Uuid) -> Result<String, TokenError> {
        self.generate(account_id, TokenKind::Refresh)
    }

    /// Generate both access and refresh tokens
    pub fn generate_token_pair(&self, account_id: Uuid) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.generate_access_token(account_id)?,
            refresh_token: self.generate_refresh_token(account_id)?,
        })
    }

    /// Verify a token of the expected kind and return its claims.
    ///
    /// Every failure collapses to [`TokenError::InvalidToken`].
    pub fn verify_token(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(kind)),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("Token rejected: {}", e);
            TokenError::InvalidToken
        })?;

        if claims.kind != kind {
            debug!("Token rejected: expected {:?}, got {:?}", kind, claims.kind);
            return Err(TokenError::InvalidToken);
        }

        Ok(claims)
    }

    fn generate(&self, account_id: Uuid, kind: TokenKind) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: account_id,
            kind,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + self.duration(kind),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret(kind)),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.access_secret.as_bytes(),
            TokenKind::Refresh => self.refresh_secret.as_bytes(),
        }
    }

    fn duration(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_token_duration,
            TokenKind::Refresh => self.refresh_token_duration,
        }
    }
}
