/**
 * Application Configuration
 * Environment-driven settings, read once at startup
 */
use std::{net::SocketAddr, time::Duration};

/// Secret used when `JWT_SECRET` is not set. Refused in production.
pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("JWT_SECRET must be set to a secure, unique value in production")]
    InsecureSecret,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    /// `None` runs the service on the in-memory store.
    pub mongodb_uri: Option<String>,
    pub database_name: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub require_auth_for_writes: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            Err(_) => 5000,
        };

        let expires_in = std::env::var("EXPIRES_IN").unwrap_or_else(|_| "1h".to_string());
        let token_ttl = parse_expiry(&expires_in).ok_or(ConfigError::Invalid {
            name: "EXPIRES_IN",
            value: expires_in.clone(),
        })?;

        let require_auth_for_writes = match std::env::var("REQUIRE_AUTH_FOR_WRITES") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::Invalid {
                name: "REQUIRE_AUTH_FOR_WRITES",
                value: raw,
            })?,
            Err(_) => true,
        };

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            mongodb_uri: std::env::var("MONGODB_URI")
                .ok()
                .filter(|uri| !uri.trim().is_empty()),
            database_name: std::env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "portfolio".to_string()),
            jwt_secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            token_ttl,
            require_auth_for_writes,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Refuse to start in production with the insecure default JWT secret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_production()
            && (self.jwt_secret.is_empty() || self.jwt_secret == DEFAULT_JWT_SECRET)
        {
            return Err(ConfigError::InsecureSecret);
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Invalid {
            name: "HOST",
            value: raw,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            environment: "development".to_string(),
            mongodb_uri: None,
            database_name: "portfolio".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl: Duration::from_secs(3600),
            require_auth_for_writes: true,
        }
    }
}

/// Parse a token lifetime such as `3600`, `90s`, `15m`, `1h` or `7d`.
/// A bare number is taken as seconds.
pub fn parse_expiry(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let amount: u64 = digits.parse().ok()?;

    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };

    if amount == 0 {
        return None;
    }
    // Token timestamps are i64 seconds, so larger lifetimes cannot be encoded.
    amount
        .checked_mul(multiplier)
        .filter(|secs| i64::try_from(*secs).is_ok())
        .map(Duration::from_secs)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
