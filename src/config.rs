//! Process configuration.
//!
//! Everything the service needs from the environment is read once at startup
//! into [`AppConfig`] and handed to constructors from there.

use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
/// 15 minutes
const DEFAULT_ACCESS_TTL_SECONDS: i64 = 900;
/// 7 days
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 604_800;
const DEFAULT_CLOUDINARY_BASE_URL: &str = "https://api.cloudinary.com";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub server: ServerConfig,
    pub tokens: TokenConfig,
    pub media: MediaConfig,
    /// Emit `Secure` on session cookies. Only disable for plain-http local runs.
    pub cookie_secure: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Signing secrets and lifetimes for both token kinds
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
}

/// Credentials for the media host
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: Option<String>,
    pub base_url: String,
}

impl AppConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let tokens = TokenConfig {
            access_secret: require("ACCESS_TOKEN_SECRET")?,
            refresh_secret: require("REFRESH_TOKEN_SECRET")?,
            access_ttl_seconds: parse_ttl(
                "ACCESS_TOKEN_TTL_SECONDS",
                get("ACCESS_TOKEN_TTL_SECONDS"),
                DEFAULT_ACCESS_TTL_SECONDS,
            )?,
            refresh_ttl_seconds: parse_ttl(
                "REFRESH_TOKEN_TTL_SECONDS",
                get("REFRESH_TOKEN_TTL_SECONDS"),
                DEFAULT_REFRESH_TTL_SECONDS,
            )?,
        };

        if tokens.access_secret == tokens.refresh_secret {
            return Err(ConfigError::Invalid {
                key: "REFRESH_TOKEN_SECRET",
                reason: "must differ from ACCESS_TOKEN_SECRET".to_string(),
            });
        }

        let media = MediaConfig {
            cloud_name: require("CLOUDINARY_CLOUD_NAME")?,
            api_key: require("CLOUDINARY_API_KEY")?,
            api_secret: require("CLOUDINARY_API_SECRET")?,
            folder: get("CLOUDINARY_FOLDER"),
            base_url: get("CLOUDINARY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_CLOUDINARY_BASE_URL.to_string()),
        };

        let cookie_secure = match get("COOKIE_SECURE") {
            Some(raw) => parse_bool("COOKIE_SECURE", &raw)?,
            None => true,
        };

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            server: ServerConfig {
                host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port,
            },
            tokens,
            media,
            cookie_secure,
        })
    }
}

fn parse_ttl(key: &'static str, raw: Option<String>, default: i64) -> Result<i64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let seconds = raw.trim().parse::<i64>().map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })?;
    if seconds <= 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be a positive number of seconds".to_string(),
        });
    }
    Ok(seconds)
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}
