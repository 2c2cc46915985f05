// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`AppConfig`] loaded from
//! them once at startup. A `.env` file is read first when present.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `APP_PORT` / `PORT` | Server bind port (`APP_PORT` wins) | `8080` |
//! | `DATABASE_PATH` | redb database file | `data/receipts.redb` |
//! | `JWT_SECRET` | HMAC secret for issued tokens | Required (requests fail with 500 without it) |
//! | `JWT_EXPIRY_HOURS` | Token lifetime in hours | `72` |
//! | `GOOGLE_API_KEY` | Google Cloud Vision API key | Required for `/receipts/parse` |
//! | `VISION_API_BASE_URL` | Vision API base URL | `https://vision.googleapis.com` |
//! | `OPENAI_API_KEY` | OpenAI API key (`OPENAPI_API_KEY` also accepted) | Required for `/receipts/parse` |
//! | `OPENAI_API_BASE_URL` | OpenAI API base URL | `https://api.openai.com` |
//! | `OPENAI_MODEL` | Chat model used for structuring | `gpt-4o` |
//! | `UPSTREAM_TIMEOUT_SECS` | Timeout for Vision/OpenAI calls | `60` |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated origins, or `*` | `*` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::{
    auth::tokens::DEFAULT_TOKEN_TTL_HOURS,
    providers::{
        openai::{DEFAULT_OPENAI_API_BASE_URL, DEFAULT_OPENAI_MODEL},
        vision::DEFAULT_VISION_API_BASE_URL,
    },
};

pub const HOST_ENV: &str = "HOST";
pub const APP_PORT_ENV: &str = "APP_PORT";
pub const PORT_ENV: &str = "PORT";
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_EXPIRY_HOURS_ENV: &str = "JWT_EXPIRY_HOURS";
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const VISION_API_BASE_URL_ENV: &str = "VISION_API_BASE_URL";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Older deployments set the key under this misspelled name.
pub const OPENAI_API_KEY_ALIAS_ENV: &str = "OPENAPI_API_KEY";
pub const OPENAI_API_BASE_URL_ENV: &str = "OPENAI_API_BASE_URL";
pub const OPENAI_MODEL_ENV: &str = "OPENAI_MODEL";
pub const UPSTREAM_TIMEOUT_SECS_ENV: &str = "UPSTREAM_TIMEOUT_SECS";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_PATH: &str = "data/receipts.redb";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("invalid bind address {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
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

/// Which origins may call the API from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl CorsOrigins {
    fn parse(value: &str) -> Self {
        let origins: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
            CorsOrigins::Any
        } else {
            CorsOrigins::List(origins)
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub jwt_secret: Option<String>,
    pub jwt_expiry_hours: i64,
    pub google_api_key: String,
    pub vision_api_base_url: String,
    pub openai_api_key: String,
    pub openai_api_base_url: String,
    pub openai_model: String,
    pub upstream_timeout: Duration,
    pub cors_origins: CorsOrigins,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env.or_default(HOST_ENV, DEFAULT_HOST);
        let port = match env.optional(APP_PORT_ENV).or_else(|| env.optional(PORT_ENV)) {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: PORT_ENV,
                value,
            })?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(format!("{host}:{port}")))?;

        Ok(Self {
            bind_addr,
            database_path: PathBuf::from(env.or_default(DATABASE_PATH_ENV, DEFAULT_DATABASE_PATH)),
            jwt_secret: env.optional(JWT_SECRET_ENV),
            jwt_expiry_hours: env.parsed(JWT_EXPIRY_HOURS_ENV, DEFAULT_TOKEN_TTL_HOURS)?,
            google_api_key: env.or_default(GOOGLE_API_KEY_ENV, ""),
            vision_api_base_url: env
                .or_default(VISION_API_BASE_URL_ENV, DEFAULT_VISION_API_BASE_URL),
            openai_api_key: env
                .optional(OPENAI_API_KEY_ENV)
                .or_else(|| env.optional(OPENAI_API_KEY_ALIAS_ENV))
                .unwrap_or_default(),
            openai_api_base_url: env
                .or_default(OPENAI_API_BASE_URL_ENV, DEFAULT_OPENAI_API_BASE_URL),
            openai_model: env.or_default(OPENAI_MODEL_ENV, DEFAULT_OPENAI_MODEL),
            upstream_timeout: Duration::from_secs(
                env.parsed(UPSTREAM_TIMEOUT_SECS_ENV, DEFAULT_UPSTREAM_TIMEOUT_SECS)?,
            ),
            cors_origins: CorsOrigins::parse(&env.or_default(CORS_ALLOWED_ORIGINS_ENV, "*")),
            log_format: env
                .optional(LOG_FORMAT_ENV)
                .map(|value| LogFormat::parse(&value))
                .unwrap_or_default(),
        })
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value, treating blank as unset.
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn or_default(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: std::str::FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        match self.optional(name) {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue { name, value }),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.database_path, PathBuf::from("data/receipts.redb"));
        assert_eq!(config.jwt_secret, None);
        assert_eq!(config.jwt_expiry_hours, 72);
        assert_eq!(config.openai_model, "gpt-4o");
        assert_eq!(config.upstream_timeout, Duration::from_secs(60));
        assert_eq!(config.cors_origins, CorsOrigins::Any);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn app_port_wins_over_port() {
        let config = load(&[("APP_PORT", "9000"), ("PORT", "7000")]).unwrap();
        assert_eq!(config.bind_addr.port(), 9000);

        let config = load(&[("PORT", "7000")]).unwrap();
        assert_eq!(config.bind_addr.port(), 7000);
    }

    #[test]
    fn invalid_port_is_an_error() {
        assert!(matches!(
            load(&[("APP_PORT", "eighty")]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn blank_secret_counts_as_unset() {
        let config = load(&[("JWT_SECRET", "   ")]).unwrap();
        assert_eq!(config.jwt_secret, None);
    }

    #[test]
    fn openai_key_alias_is_accepted() {
        let config = load(&[("OPENAPI_API_KEY", "sk-legacy")]).unwrap();
        assert_eq!(config.openai_api_key, "sk-legacy");

        let config = load(&[("OPENAPI_API_KEY", "sk-legacy"), ("OPENAI_API_KEY", "sk-new")]).unwrap();
        assert_eq!(config.openai_api_key, "sk-new");
    }

    #[test]
    fn cors_origins_parse_lists() {
        let config = load(&[(
            "CORS_ALLOWED_ORIGINS",
            "https://a.example, https://b.example",
        )])
        .unwrap();
        assert_eq!(
            config.cors_origins,
            CorsOrigins::List(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );
        assert_eq!(CorsOrigins::parse("https://a.example,*"), CorsOrigins::Any);
    }

    #[test]
    fn json_log_format_is_case_insensitive() {
        let config = load(&[("LOG_FORMAT", "JSON")]).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
