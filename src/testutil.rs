// Shared fixtures for unit and handler tests

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::{
    media::{MediaFile, MediaUploader, UploadError, UploadedMedia},
    memory::InMemoryAccountRepository,
    models::RegisterRequest,
    AuthService, CookieSettings, TokenService,
};
use crate::config::TokenConfig;
use crate::AppState;

pub const STUB_MEDIA_HOST: &str = "https://media.test";

pub fn test_token_config() -> TokenConfig {
    TokenConfig {
        access_secret: "test_access_secret_key_for_testing".to_string(),
        refresh_secret: "test_refresh_secret_key_for_testing".to_string(),
        access_ttl_seconds: 900,
        refresh_ttl_seconds: 604_800,
    }
}

pub fn sample_file(name: &str) -> MediaFile {
    MediaFile {
        file_name: name.to_string(),
        content_type: Some("image/png".to_string()),
        bytes: vec![0x89, b'P', b'N', b'G', 1, 2, 3],
    }
}

pub fn register_request(username: &str, email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        full_name: "Test User".to_string(),
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    }
}

/// Uploader that stores nothing and answers `https://media.test/<file name>`.
///
/// Files named in `failing` are rejected; files named in `blank` come back
/// with an empty url.
#[derive(Default)]
pub struct StubUploader {
    failing: HashSet<String>,
    blank: HashSet<String>,
}

impl StubUploader {
    pub fn failing_on(mut self, file_name: &str) -> Self {
        self.failing.insert(file_name.to_string());
        self
    }

    pub fn blank_on(mut self, file_name: &str) -> Self {
        self.blank.insert(file_name.to_string());
        self
    }
}

#[async_trait]
impl MediaUploader for StubUploader {
    async fn upload(&self, file: MediaFile) -> Result<UploadedMedia, UploadError> {
        if self.failing.contains(&file.file_name) {
            return Err(UploadError::Rejected {
                status: 500,
                body: "stub failure".to_string(),
            });
        }
        if self.blank.contains(&file.file_name) {
            return Ok(UploadedMedia { url: String::new() });
        }
        Ok(UploadedMedia {
            url: format!("{}/{}", STUB_MEDIA_HOST, file.file_name),
        })
    }
}

pub fn service_with(accounts: Arc<InMemoryAccountRepository>, uploader: StubUploader) -> AuthService {
    AuthService::new(
        accounts,
        Arc::new(uploader),
        TokenService::new(&test_token_config()),
    )
}

pub fn test_service() -> AuthService {
    service_with(
        Arc::new(InMemoryAccountRepository::new()),
        StubUploader::default(),
    )
}

pub fn state_with(uploader: StubUploader) -> AppState {
    AppState::new(
        service_with(Arc::new(InMemoryAccountRepository::new()), uploader),
        CookieSettings::new(false, &test_token_config()),
    )
}

pub fn test_state() -> AppState {
    state_with(StubUploader::default())
}
