//! Client configuration
//!
//! Read once at startup from environment variables, with working defaults
//! for local development. Everything here is plumbing for the consumer;
//! none of it changes behavior at runtime.

use std::env;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the authoritative server (no trailing slash needed).
    pub api_base_url: String,
    /// SQLite URL for the on-device cache.
    pub database_url: String,
    /// End-to-end bound on every remote call.
    pub http_timeout_secs: u64,
    /// Lifetime of issued session tokens, server-issued and offline alike.
    pub token_ttl_secs: i64,
    /// Minimum age of the last sync before an automatic refresh runs.
    pub sync_max_age_minutes: i64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            database_url: "sqlite://rostersync.db".to_string(),
            http_timeout_secs: 10,
            token_ttl_secs: 86_400,
            sync_max_age_minutes: 5,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            api_base_url: env::var("ROSTERSYNC_API_BASE_URL")
                .unwrap_or(defaults.api_base_url),
            database_url: env::var("ROSTERSYNC_DATABASE_URL")
                .unwrap_or(defaults.database_url),
            http_timeout_secs: env_number("ROSTERSYNC_HTTP_TIMEOUT_SECS")
                .unwrap_or(defaults.http_timeout_secs),
            token_ttl_secs: env_number("ROSTERSYNC_TOKEN_TTL_SECS")
                .unwrap_or(defaults.token_ttl_secs),
            sync_max_age_minutes: env_number("ROSTERSYNC_SYNC_MAX_AGE_MINUTES")
                .unwrap_or(defaults.sync_max_age_minutes),
        }
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}
