/*
 * Responsibility
 * - Read environment / .env once at startup (DATABASE_URL, JWT secrets, CORS, cache)
 * - Validate values (missing JWT_SECRET or DATABASE_URL stops the process before it serves)
 * - Nothing reads the environment after Config::from_env() returns
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Signing material and lifetimes for access/refresh tokens.
///
/// Secrets are not printable via Debug.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in_seconds: u64,
    pub refresh_secret: String,
    pub refresh_expires_in_seconds: u64,
    pub leeway_seconds: u64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("expires_in_seconds", &self.expires_in_seconds)
            .field("refresh_expires_in_seconds", &self.refresh_expires_in_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub jwt: JwtConfig,

    // Optional Valkey/Redis read-through cache for account lookups
    pub redis_url: Option<String>,
    pub account_cache_ttl_seconds: u64,

    pub request_timeout_seconds: u64,
    pub request_body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let app_env = AppEnv::from_env();

        // FRONTEND_URL is the single-origin form used by the SPA deployment.
        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .or_else(|_| std::env::var("FRONTEND_URL"))
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let jwt = JwtConfig::from_env()?;

        let redis_url = std::env::var("REDIS_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let account_cache_ttl_seconds = std::env::var("ACCOUNT_CACHE_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let request_timeout_seconds = std::env::var("REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let request_body_limit_bytes = std::env::var("REQUEST_BODY_LIMIT_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            jwt,
            redis_url,
            account_cache_ttl_seconds,
            request_timeout_seconds,
            request_body_limit_bytes,
        })
    }
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let expires_in = match std::env::var("JWT_EXPIRE") {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!("JWT_EXPIRE is not defined, using default: 1d");
                "1d".to_string()
            }
        };
        let expires_in_seconds =
            parse_duration_seconds(&expires_in).ok_or(ConfigError::Invalid("JWT_EXPIRE"))?;

        let refresh_secret = std::env::var("JWT_REFRESH_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| secret.clone());

        let refresh_expires_in =
            std::env::var("JWT_REFRESH_EXPIRE").unwrap_or_else(|_| "3d".to_string());
        let refresh_expires_in_seconds = parse_duration_seconds(&refresh_expires_in)
            .ok_or(ConfigError::Invalid("JWT_REFRESH_EXPIRE"))?;

        let leeway_seconds = std::env::var("JWT_LEEWAY_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        Ok(Self {
            secret,
            expires_in_seconds,
            refresh_secret,
            refresh_expires_in_seconds,
            leeway_seconds,
        })
    }
}

/// Parse a lifetime such as `"1d"`, `"12h"`, `"30m"`, `"45s"`, `"2w"` or a bare
/// number of seconds (`"3600"`).
pub fn parse_duration_seconds(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let split_at = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split_at);
    let value: u64 = digits.parse().ok()?;

    let multiplier = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 60 * 60,
        "d" | "day" | "days" => 24 * 60 * 60,
        "w" | "week" | "weeks" => 7 * 24 * 60 * 60,
        _ => return None,
    };

    value.checked_mul(multiplier)
}
