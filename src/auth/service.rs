// Account service - session lifecycle and profile business logic

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    error::AuthError,
    media::{MediaFile, MediaUploader},
    models::{
        AccountResponse, AccountUpdate, AuthResponse, ChangePasswordRequest, MediaKind,
        NewAccount, RegisterRequest, UpdateAccountRequest,
    },
    password::PasswordService,
    repository::AccountRepository,
    token::{TokenKind, TokenPair, TokenService},
};
use crate::validation::{is_present, normalize_identity};

/// Coordinates registration, credential checks and the refresh-token lifecycle.
///
/// Each account holds at most one refresh token. Issuing a new one overwrites the
/// previous value, so only the most recently issued token can be rotated.
pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    uploader: Arc<dyn MediaUploader>,
    token_service: TokenService,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        uploader: Arc<dyn MediaUploader>,
        token_service: TokenService,
    ) -> Self {
        Self {
            accounts,
            uploader,
            token_service,
        }
    }

    /// Register a new account.
    ///
    /// The avatar is mandatory. The cover image is optional, but if one is sent
    /// it must upload successfully.
    pub async fn register(
        &self,
        request: RegisterRequest,
        avatar: Option<MediaFile>,
        cover_image: Option<MediaFile>,
    ) -> Result<AccountResponse, AuthError> {
        debug!("Registering account: {}", request.username);
        request.validate()?;

        let avatar = avatar
            .filter(|file| !file.is_empty())
            .ok_or_else(|| AuthError::ValidationError("avatar image is required".to_string()))?;
        let cover_image = cover_image.filter(|file| !file.is_empty());

        let username = normalize_identity(&request.username);
        let email = normalize_identity(&request.email);

        if self
            .accounts
            .identity_taken(Some(&username), Some(&email), None)
            .await?
        {
            warn!("Registration rejected, identity taken: {}", username);
            return Err(AuthError::Conflict);
        }

        let avatar_url = self.upload(avatar).await?;
        let cover_image_url = match cover_image {
            Some(file) => Some(self.upload(file).await?),
            None => None,
        };

        let password_hash = PasswordService::hash_password(&request.password)?;

        let account = self
            .accounts
            .create(NewAccount {
                full_name: request.full_name.trim().to_string(),
                username,
                email,
                password_hash,
                avatar_url,
                cover_image_url,
            })
            .await?;

        info!("Registered account {} ({})", account.id, account.username);
        Ok(account.into())
    }

    /// Verify credentials and open a session, replacing any previous one
    pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthResponse, AuthError> {
        if !is_present(Some(identifier)) || !is_present(Some(password)) {
            return Err(AuthError::ValidationError(
                "username or email, and password are required".to_string(),
            ));
        }

        let identifier = normalize_identity(identifier);
        debug!("Login attempt for {}", identifier);

        let account = self
            .accounts
            .find_by_username_or_email(&identifier)
            .await?
            .ok_or_else(|| {
                warn!("Login for unknown account: {}", identifier);
                AuthError::NotFound
            })?;

        if !PasswordService::verify_password(password, &account.password_hash) {
            warn!("Invalid password for account {}", account.id);
            return Err(AuthError::Unauthorized);
        }

        let (tokens, account) = self.start_session(account.id).await?;

        info!("Account {} logged in", account.id);
        Ok(AuthResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: account,
        })
    }

    /// Clear the stored refresh token. Idempotent.
    pub async fn logout(&self, account_id: Uuid) -> Result<(), AuthError> {
        self.accounts
            .update_by_id(account_id, AccountUpdate::RefreshToken(None))
            .await?
            .ok_or(AuthError::NotFound)?;

        info!("Account {} logged out", account_id);
        Ok(())
    }

    /// Exchange the current refresh token for a new pair (rotation).
    ///
    /// Only the exact token stored on the account is honoured, so a rotated or
    /// logged-out token is rejected even while its signature is still valid.
    /// Two concurrent refreshes with the same token are not serialised: both may
    /// pass the comparison, and the later write decides which new token survives.
    pub async fn refresh_tokens(&self, presented: Option<&str>) -> Result<TokenPair, AuthError> {
        let token = presented
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                warn!("Refresh attempted without a token");
                AuthError::Unauthorized
            })?;

        let claims = self.token_service.verify_token(token, TokenKind::Refresh)?;

        let account = self
            .accounts
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if account.refresh_token.as_deref() != Some(token) {
            warn!("Stale or revoked refresh token presented for account {}", account.id);
            return Err(AuthError::Unauthorized);
        }

        let (tokens, _) = self
            .start_session(account.id)
            .await
            .map_err(|e| match e {
                AuthError::NotFound => AuthError::Unauthorized,
                other => other,
            })?;

        info!("Rotated refresh token for account {}", account.id);
        Ok(tokens)
    }

    /// Replace the password hash after checking the current password.
    ///
    /// The stored refresh token is left in place.
    pub async fn change_password(
        &self,
        account_id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        request.validate()?;

        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !PasswordService::verify_password(&request.old_password, &account.password_hash) {
            warn!("Password change rejected for account {}", account_id);
            return Err(AuthError::Unauthorized);
        }

        let password_hash = PasswordService::hash_password(&request.new_password)?;
        self.accounts
            .update_by_id(account_id, AccountUpdate::PasswordHash(password_hash))
            .await?
            .ok_or(AuthError::NotFound)?;

        info!("Password changed for account {}", account_id);
        Ok(())
    }

    /// Upload a new avatar or cover image and point the account at it
    pub async fn update_media(
        &self,
        account_id: Uuid,
        kind: MediaKind,
        file: Option<MediaFile>,
    ) -> Result<AccountResponse, AuthError> {
        let file = file
            .filter(|file| !file.is_empty())
            .ok_or_else(|| AuthError::ValidationError(format!("{} image is required", kind)))?;

        let url = self.upload(file).await?;
        let account = self
            .accounts
            .update_by_id(account_id, AccountUpdate::Media { kind, url })
            .await?
            .ok_or(AuthError::NotFound)?;

        info!("Updated {} for account {}", kind, account_id);
        Ok(account.into())
    }

    pub async fn get_current_account(&self, account_id: Uuid) -> Result<AccountResponse, AuthError> {
        self.accounts
            .find_by_id(account_id)
            .await?
            .map(AccountResponse::from)
            .ok_or(AuthError::NotFound)
    }

    /// Replace display name, username and/or email
    pub async fn update_account_details(
        &self,
        account_id: Uuid,
        request: UpdateAccountRequest,
    ) -> Result<AccountResponse, AuthError> {
        if request.is_empty() {
            return Err(AuthError::ValidationError(
                "at least one of full_name, username or email is required".to_string(),
            ));
        }
        request.validate()?;

        let username = request
            .username
            .as_deref()
            .map(normalize_identity);
        let email = request
            .email
            .as_deref()
            .map(normalize_identity);

        if (username.is_some() || email.is_some())
            && self
                .accounts
                .identity_taken(username.as_deref(), email.as_deref(), Some(account_id))
                .await?
        {
            warn!("Details update rejected, identity taken, account {}", account_id);
            return Err(AuthError::Conflict);
        }

        let account = self
            .accounts
            .update_by_id(
                account_id,
                AccountUpdate::Details {
                    full_name: request.full_name.map(|name| name.trim().to_string()),
                    username,
                    email,
                },
            )
            .await?
            .ok_or(AuthError::NotFound)?;

        info!("Updated details for account {}", account_id);
        Ok(account.into())
    }

    /// Resolve an access token to the account it was issued for
    pub async fn authenticate(&self, access_token: &str) -> Result<AccountResponse, AuthError> {
        let claims = self
            .token_service
            .verify_token(access_token, TokenKind::Access)?;

        self.accounts
            .find_by_id(claims.sub)
            .await?
            .map(AccountResponse::from)
            .ok_or(AuthError::Unauthorized)
    }

    /// Mint a token pair and store its refresh half on the account
    async fn start_session(
        &self,
        account_id: Uuid,
    ) -> Result<(TokenPair, AccountResponse), AuthError> {
        let tokens = self.token_service.generate_token_pair(account_id)?;

        let account = self
            .accounts
            .update_by_id(
                account_id,
                AccountUpdate::RefreshToken(Some(tokens.refresh_token.clone())),
            )
            .await?
            .ok_or(AuthError::NotFound)?;

        Ok((tokens, account.into()))
    }

    async fn upload(&self, file: MediaFile) -> Result<String, AuthError> {
        let uploaded = self.uploader.upload(file).await?;
        if uploaded.url.trim().is_empty() {
            return Err(AuthError::UploadFailure(
                "media host returned an empty url".to_string(),
            ));
        }
        Ok(uploaded.url)
    }
}
