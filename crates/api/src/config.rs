//! Process configuration, read once from the environment at startup.

use std::fmt::Display;
use std::str::FromStr;

use placement_core::offer::DEFAULT_OFFER_EXPIRY_HOURS;

/// Server settings.
///
/// | Env Var                 | Default                 |
/// |-------------------------|-------------------------|
/// | `HOST`                  | `0.0.0.0`               |
/// | `PORT`                  | `3000`                  |
/// | `CORS_ORIGINS`          | `http://localhost:5173` |
/// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
/// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
/// | `OFFER_EXPIRY_HOURS`    | `72`                    |
/// | `DATABASE_URL`          | required                |
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed by CORS, from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Grace period for in-flight requests after a shutdown signal.
    pub shutdown_timeout_secs: u64,
    /// How long a pending offer stays open.
    pub offer_expiry_hours: i64,
    pub database_url: String,
    pub jwt: JwtConfig,
}

/// Token settings.
///
/// | Env Var                   | Default  |
/// |---------------------------|----------|
/// | `JWT_SECRET`              | required |
/// | `JWT_ACCESS_EXPIRY_MINS`  | `15`     |
/// | `JWT_REFRESH_EXPIRY_DAYS` | `7`      |
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HS256 signing secret.
    pub secret: String,
    pub access_token_expiry_mins: i64,
    pub refresh_token_expiry_days: i64,
}

impl ServerConfig {
    /// # Panics
    ///
    /// On unparsable values or missing required variables, so a
    /// misconfigured deployment fails at boot rather than on first request.
    pub fn from_env() -> Self {
        let offer_expiry_hours = env_or("OFFER_EXPIRY_HOURS", DEFAULT_OFFER_EXPIRY_HOURS);
        assert!(offer_expiry_hours > 0, "OFFER_EXPIRY_HOURS must be positive");

        Self {
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: env_or("PORT", 3000),
            cors_origins: parse_origins(&env_or(
                "CORS_ORIGINS",
                "http://localhost:5173".to_string(),
            )),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            offer_expiry_hours,
            database_url: required("DATABASE_URL"),
            jwt: JwtConfig::from_env(),
        }
    }
}

impl JwtConfig {
    /// # Panics
    ///
    /// When `JWT_SECRET` is missing or empty, or an expiry is not a number.
    pub fn from_env() -> Self {
        Self {
            secret: required("JWT_SECRET"),
            access_token_expiry_mins: env_or("JWT_ACCESS_EXPIRY_MINS", 15),
            refresh_token_expiry_days: env_or("JWT_REFRESH_EXPIRY_DAYS", 7),
        }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}

fn required(key: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => panic!("{key} must be set"),
    }
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
