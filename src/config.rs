// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults and fixed header/path constants.
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding `social.redb` | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | HS256 secret for bearer tokens | Required |
//! | `ACCESS_TOKEN_TTL_SECS` | Bearer token lifetime | `900` |
//! | `REFRESH_TOKEN_TTL_SECS` | Refresh token lifetime | `604800` |
//! | `SEED_USERS` | Comma-separated usernames created at startup | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const ACCESS_TOKEN_TTL_ENV: &str = "ACCESS_TOKEN_TTL_SECS";
pub const REFRESH_TOKEN_TTL_ENV: &str = "REFRESH_TOKEN_TTL_SECS";
pub const SEED_USERS_ENV: &str = "SEED_USERS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;
/// Upper bound for either token lifetime (one year).
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Header carrying the single-use refresh token.
pub const REFRESH_TOKEN_HEADER: &str = "refresh-token";

/// Path prefixes the token gate never inspects.
///
/// `/ws` is the streaming upgrade path, `/api/auth/` the login/refresh
/// bootstrap endpoints.
pub const ALLOW_LISTED_PREFIXES: &[&str] = &["/ws", "/api/auth/", "/health", "/docs", "/api-doc"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Process-wide read-only configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub seed_users: Vec<String>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup(JWT_SECRET_ENV)
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;

        let parse_or = |key: &str, default: i64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|v| (1..=MAX_TOKEN_TTL_SECS).contains(v))
                .unwrap_or(default)
        };

        Ok(Self {
            host: lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: lookup(PORT_ENV)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            data_dir: lookup(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            jwt_secret,
            access_token_ttl_secs: parse_or(ACCESS_TOKEN_TTL_ENV, DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_token_ttl_secs: parse_or(REFRESH_TOKEN_TTL_ENV, DEFAULT_REFRESH_TOKEN_TTL_SECS),
            seed_users: lookup(SEED_USERS_ENV)
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            log_format: lookup(LOG_FORMAT_ENV)
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(LogFormat::Pretty),
        })
    }

    /// Defaults with the given secret and data directory.
    pub fn with_secret(jwt_secret: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: data_dir.into(),
            jwt_secret: jwt_secret.into(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            seed_users: Vec::new(),
            log_format: LogFormat::Pretty,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("seed_users", &self.seed_users)
            .field("log_format", &self.log_format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn secret_is_required() {
        let result = AppConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::Missing(JWT_SECRET_ENV))));
    }

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup_from(&[(JWT_SECRET_ENV, "s3cret")])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.access_token_ttl_secs, DEFAULT_ACCESS_TOKEN_TTL_SECS);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.seed_users.is_empty());
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn overrides_and_fallbacks() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (JWT_SECRET_ENV, "s3cret"),
            (PORT_ENV, "9000"),
            (ACCESS_TOKEN_TTL_ENV, "not-a-number"),
            (REFRESH_TOKEN_TTL_ENV, "60"),
            (SEED_USERS_ENV, "alice, bob,,"),
            (LOG_FORMAT_ENV, "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.access_token_ttl_secs, DEFAULT_ACCESS_TOKEN_TTL_SECS);
        assert_eq!(config.refresh_token_ttl_secs, 60);
        assert_eq!(config.seed_users, vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn out_of_range_ttls_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (JWT_SECRET_ENV, "s3cret"),
            (ACCESS_TOKEN_TTL_ENV, "9223372036854775807"),
            (REFRESH_TOKEN_TTL_ENV, "-5"),
        ]))
        .unwrap();
        assert_eq!(config.access_token_ttl_secs, DEFAULT_ACCESS_TOKEN_TTL_SECS);
        assert_eq!(config.refresh_token_ttl_secs, DEFAULT_REFRESH_TOKEN_TTL_SECS);

        let capped = AppConfig::from_lookup(lookup_from(&[
            (JWT_SECRET_ENV, "s3cret"),
            (REFRESH_TOKEN_TTL_ENV, &MAX_TOKEN_TTL_SECS.to_string()),
        ]))
        .unwrap();
        assert_eq!(capped.refresh_token_ttl_secs, MAX_TOKEN_TTL_SECS);
    }

    #[test]
    fn debug_redacts_secret() {
        let config = AppConfig::with_secret("top-secret", "/tmp/data");
        assert!(!format!("{config:?}").contains("top-secret"));
    }
}
