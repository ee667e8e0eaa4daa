// Account storage: the repository contract and its Postgres implementation

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    models::{Account, AccountUpdate, MediaKind, NewAccount},
};

const ACCOUNT_COLUMNS: &str = "id, full_name, username, email, password_hash, avatar_url, \
     cover_image_url, refresh_token, created_at, updated_at";

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique username/email constraint was violated
    #[error("username or email already taken")]
    Duplicate,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => AuthError::Conflict,
            StoreError::Database(e) => {
                error!("Account store failure: {:?}", e);
                AuthError::InternalError(e.to_string())
            }
        }
    }
}

/// Persistence operations the account lifecycle needs.
///
/// Usernames and emails are passed in already normalised.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account; `Duplicate` when username or email is taken
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Find the account whose username or email equals `identifier`.
    ///
    /// A username match wins over an email match.
    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, StoreError>;

    /// Whether another account already uses the username or the email
    async fn identity_taken(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError>;

    /// Apply a single update; `None` when no account has this id
    async fn update_by_id(
        &self,
        id: Uuid,
        update: AccountUpdate,
    ) -> Result<Option<Account>, StoreError>;
}

/// Postgres-backed account repository
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate unique constraint violations into `Duplicate`
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate;
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let sql = format!(
            "INSERT INTO accounts (id, full_name, username, email, password_hash, avatar_url, cover_image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {}",
            ACCOUNT_COLUMNS
        );

        sqlx::query_as::<_, Account>(&sql)
            .bind(Uuid::new_v4())
            .bind(&account.full_name)
            .bind(&account.username)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.avatar_url)
            .bind(&account.cover_image_url)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);

        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, StoreError> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE username = $1 OR email = $1 \
             ORDER BY (username = $1) DESC LIMIT 1",
            ACCOUNT_COLUMNS
        );

        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn identity_taken(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        let exists: Option<bool> = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM accounts
                WHERE (username = $1 OR email = $2)
                  AND ($3::uuid IS NULL OR id <> $3)
            )",
        )
        .bind(username)
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.unwrap_or(false))
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        update: AccountUpdate,
    ) -> Result<Option<Account>, StoreError> {
        let query = match &update {
            AccountUpdate::RefreshToken(_) => "refresh_token = $2",
            AccountUpdate::PasswordHash(_) => "password_hash = $2",
            AccountUpdate::Media { kind: MediaKind::Avatar, .. } => "avatar_url = $2",
            AccountUpdate::Media { kind: MediaKind::CoverImage, .. } => "cover_image_url = $2",
            AccountUpdate::Details { .. } => {
                "full_name = COALESCE($2, full_name), \
                 username = COALESCE($3, username), \
                 email = COALESCE($4, email)"
            }
        };
        let sql = format!(
            "UPDATE accounts SET {}, updated_at = NOW() WHERE id = $1 RETURNING {}",
            query, ACCOUNT_COLUMNS
        );

        let statement = sqlx::query_as::<_, Account>(&sql).bind(id);
        let statement = match update {
            AccountUpdate::RefreshToken(token) => statement.bind(token),
            AccountUpdate::PasswordHash(hash) => statement.bind(hash),
            AccountUpdate::Media { url, .. } => statement.bind(url),
            AccountUpdate::Details {
                full_name,
                username,
                email,
            } => statement.bind(full_name).bind(username).bind(email),
        };

        statement
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)
    }
}
