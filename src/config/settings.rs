//! Process settings read from the environment (optionally seeded from `.env`).

use crate::config::ValidationPolicy;
use crate::error::ConfigError;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    /// PostgreSQL schema holding the students table. Must be a plain identifier.
    pub schema: String,
    pub max_body_bytes: usize,
    pub policy: ValidationPolicy,
}

impl AppConfig {
    /// Read settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset and blank values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let bind_addr: SocketAddr = parse_or("BIND_ADDR", get("BIND_ADDR"), DEFAULT_BIND_ADDR.parse().ok())?;
        let max_connections: u32 = parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), Some(DEFAULT_MAX_CONNECTIONS))?;
        let max_body_bytes: usize = parse_or("MAX_BODY_BYTES", get("MAX_BODY_BYTES"), Some(DEFAULT_MAX_BODY_BYTES))?;
        let max_year: i32 = parse_or("STUDENT_MAX_YEAR", get("STUDENT_MAX_YEAR"), Some(ValidationPolicy::DEFAULT_MAX_YEAR))?;
        let phone_required: bool = parse_or("STUDENT_PHONE_REQUIRED", get("STUDENT_PHONE_REQUIRED"), Some(true))?;

        let schema = get("STUDENT_RECORDS_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.into());
        if !is_identifier(&schema) {
            return Err(ConfigError::Invalid {
                key: "STUDENT_RECORDS_SCHEMA",
                value: schema,
            });
        }
        if max_year < ValidationPolicy::MIN_YEAR {
            return Err(ConfigError::Invalid {
                key: "STUDENT_MAX_YEAR",
                value: max_year.to_string(),
            });
        }
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                value: "0".into(),
            });
        }

        Ok(AppConfig {
            database_url,
            bind_addr,
            max_connections,
            schema,
            max_body_bytes,
            policy: ValidationPolicy {
                max_year,
                phone_required,
            },
        })
    }
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: Option<T>) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => default.ok_or(ConfigError::Missing(key)),
    }
}

/// Lowercase ASCII letters, digits and underscores, not starting with a digit.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
