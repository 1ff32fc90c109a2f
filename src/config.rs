//! Runtime configuration read from the environment (and `.env`, loaded in `main`).
//!
//! `SUPABASE_URL` and `SUPABASE_KEY` are required. `PORT`, `CONTACT_TABLE`
//! and `CACHE_TTL_SECS` are optional.

use crate::errors::ConfigError;
use reqwest::Url;
use std::{env, time::Duration};

pub const DEFAULT_TABLE: &str = "contact_messages";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
    pub table: String,
    pub cache_ttl: Duration,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let supabase_url = required(&lookup, "SUPABASE_URL")?;
        validate_url(&supabase_url)?;
        let supabase_key = required(&lookup, "SUPABASE_KEY")?;

        let table = lookup("CONTACT_TABLE")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_TABLE.to_string());

        let cache_ttl = match lookup("CACHE_TTL_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|err| ConfigError::Invalid {
                    key: "CACHE_TTL_SECS",
                    reason: err.to_string(),
                })?,
            None => DEFAULT_CACHE_TTL,
        };

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            supabase_url,
            supabase_key,
            table,
            cache_ttl,
            port,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn validate_url(value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key: "SUPABASE_URL",
        reason,
    };
    let url = Url::parse(value).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}
