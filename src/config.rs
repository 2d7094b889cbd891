//! Relay configuration, passed explicitly into [`crate::relay::HttpUpstream`]
//! and [`crate::relay::Relay`] at construction.

use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_UPSTREAM_URL: &str = "TEXTLENS_UPSTREAM_URL";
pub const ENV_MODEL: &str = "TEXTLENS_MODEL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TEXTLENS_REQUEST_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "TEXTLENS_CONNECT_TIMEOUT_SECS";
pub const ENV_LOG_REQUESTS: &str = "TEXTLENS_LOG_REQUESTS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Full URL of the model's generate endpoint.
    pub upstream_url: String,
    /// Used when the client request names no model.
    pub default_model: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub log_requests: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            upstream_url: "http://localhost:11434/api/generate".to_string(),
            default_model: "gemma3:1b".to_string(),
            request_timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(30),
            log_requests: true,
        }
    }
}

impl RelayConfig {
    /// Defaults overridden by any `TEXTLENS_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`RelayConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(url) = lookup(ENV_UPSTREAM_URL).filter(|v| !v.trim().is_empty()) {
            cfg.upstream_url = url.trim().to_string();
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            cfg.default_model = model.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            cfg.request_timeout = parse_secs(ENV_REQUEST_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CONNECT_TIMEOUT_SECS) {
            cfg.connect_timeout = parse_secs(ENV_CONNECT_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LOG_REQUESTS) {
            cfg.log_requests = parse_flag(ENV_LOG_REQUESTS, &raw)?;
        }
        Ok(cfg)
    }
}

fn parse_secs(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidVar {
            var,
            expected: "a positive number of seconds",
            value: raw.to_string(),
        }),
    }
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidVar {
            var,
            expected: "a boolean",
            value: raw.to_string(),
        }),
    }
}
