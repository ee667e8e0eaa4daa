// Session cookie helpers and token lookup on incoming requests

use axum::http::{header, HeaderMap};

use crate::auth::token::TokenPair;
use crate::config::TokenConfig;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

/// Attributes applied to the session cookies
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
    pub access_max_age: i64,
    pub refresh_max_age: i64,
}

impl CookieSettings {
    pub fn new(secure: bool, tokens: &TokenConfig) -> Self {
        Self {
            secure,
            access_max_age: tokens.access_ttl_seconds,
            refresh_max_age: tokens.refresh_ttl_seconds,
        }
    }

    fn attributes(&self) -> &'static str {
        // Browsers drop SameSite=None cookies that are not Secure
        if self.secure {
            "HttpOnly; Secure; SameSite=None; Path=/"
        } else {
            "HttpOnly; SameSite=Lax; Path=/"
        }
    }

    pub fn build_set_cookie(&self, name: &str, value: &str, max_age: i64) -> String {
        format!("{}={}; Max-Age={}; {}", name, value, max_age, self.attributes())
    }

    pub fn build_clear_cookie(&self, name: &str) -> String {
        format!("{}=; Max-Age=0; {}", name, self.attributes())
    }

    /// `Set-Cookie` values carrying a fresh token pair
    pub fn session_cookies(&self, pair: &TokenPair) -> [String; 2] {
        [
            self.build_set_cookie(ACCESS_TOKEN_COOKIE, &pair.access_token, self.access_max_age),
            self.build_set_cookie(
                REFRESH_TOKEN_COOKIE,
                &pair.refresh_token,
                self.refresh_max_age,
            ),
        ]
    }

    /// `Set-Cookie` values expiring both session cookies
    pub fn cleared_cookies(&self) -> [String; 2] {
        [
            self.build_clear_cookie(ACCESS_TOKEN_COOKIE),
            self.build_clear_cookie(REFRESH_TOKEN_COOKIE),
        ]
    }
}

/// Value of the named cookie, if present and non-empty
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// The refresh token a client presented: cookie first, then body, then header
pub fn presented_refresh_token(headers: &HeaderMap, body_token: Option<&str>) -> Option<String> {
    read_cookie(headers, REFRESH_TOKEN_COOKIE)
        .or_else(|| non_blank(body_token))
        .or_else(|| {
            non_blank(
                headers
                    .get(REFRESH_TOKEN_HEADER)
                    .and_then(|value| value.to_str().ok()),
            )
        })
}

/// The access token a client presented: cookie first, then `Authorization: Bearer`
pub fn presented_access_token(headers: &HeaderMap) -> Option<String> {
    read_cookie(headers, ACCESS_TOKEN_COOKIE).or_else(|| {
        non_blank(
            headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer ")),
        )
    })
}
