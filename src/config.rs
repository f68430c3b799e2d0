use anyhow::{bail, Context};
use serde::Deserialize;

/// Seven days, the lifetime of a bearer token unless overridden.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 7;

/// One year. Keeps `now + ttl` far from `OffsetDateTime`'s range limit.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Missing database URL or
    /// signing secret is an error: the server must not start without them.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .context("DATABASE_URL must be set")?;

        let secret = lookup("JWT_SECRET")
            .filter(|v| !v.trim().is_empty())
            .context("JWT_SECRET must be set")?;

        let ttl_minutes = match lookup("JWT_TTL_MINUTES") {
            Some(v) => v
                .parse::<i64>()
                .with_context(|| format!("JWT_TTL_MINUTES is not a number: {v}"))?,
            None => DEFAULT_TOKEN_TTL_MINUTES,
        };
        if ttl_minutes <= 0 {
            bail!("JWT_TTL_MINUTES must be positive");
        }
        if ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            bail!("JWT_TTL_MINUTES must not exceed {MAX_TOKEN_TTL_MINUTES} (one year)");
        }

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "ledgerly".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "ledgerly-users".into()),
            ttl_minutes,
        };

        let port = match lookup("APP_PORT").or_else(|| lookup("PORT")) {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("APP_PORT is not a valid port: {v}"))?,
            None => 8080,
        };

        Ok(Self {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            database_url,
            max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            jwt,
        })
    }
}
