// In-process account repository

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{
    models::{Account, AccountUpdate, MediaKind, NewAccount},
    repository::{AccountRepository, StoreError},
};

/// Account repository held in memory.
///
/// Enforces the same username/email uniqueness as the Postgres schema. The lock
/// is only held for the duration of one call.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }
}

fn conflicts(
    accounts: &HashMap<Uuid, Account>,
    username: Option<&str>,
    email: Option<&str>,
    exclude: Option<Uuid>,
) -> bool {
    accounts.values().any(|account| {
        Some(account.id) != exclude
            && (username == Some(account.username.as_str())
                || email == Some(account.email.as_str()))
    })
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().await;
        if conflicts(
            &accounts,
            Some(account.username.as_str()),
            Some(account.email.as_str()),
            None,
        ) {
            return Err(StoreError::Duplicate);
        }

        let now = Utc::now();
        let record = Account {
            id: Uuid::new_v4(),
            full_name: account.full_name,
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            avatar_url: account.avatar_url,
            cover_image_url: account.cover_image_url,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        let by_username = accounts.values().find(|a| a.username == identifier);
        Ok(by_username
            .or_else(|| accounts.values().find(|a| a.email == identifier))
            .cloned())
    }

    async fn identity_taken(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(conflicts(&accounts, username, email, exclude))
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        update: AccountUpdate,
    ) -> Result<Option<Account>, StoreError> {
        let mut accounts = self.accounts.write().await;

        if let AccountUpdate::Details {
            username, email, ..
        } = &update
        {
            if conflicts(&accounts, username.as_deref(), email.as_deref(), Some(id)) {
                return Err(StoreError::Duplicate);
            }
        }

        let Some(account) = accounts.get_mut(&id) else {
            return Ok(None);
        };

        match update {
            AccountUpdate::RefreshToken(token) => account.refresh_token = token,
            AccountUpdate::PasswordHash(hash) => account.password_hash = hash,
            AccountUpdate::Media {
                kind: MediaKind::Avatar,
                url,
            } => account.avatar_url = url,
            AccountUpdate::Media {
                kind: MediaKind::CoverImage,
                url,
            } => account.cover_image_url = Some(url),
            AccountUpdate::Details {
                full_name,
                username,
                email,
            } => {
                if let Some(full_name) = full_name {
                    account.full_name = full_name;
                }
                if let Some(username) = username {
                    account.username = username;
                }
                if let Some(email) = email {
                    account.email = email;
                }
            }
        }
        account.updated_at = Utc::now();

        Ok(Some(account.clone()))
    }
}
