use std::str::FromStr;

use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_API_BASE, DEFAULT_MODEL};

/// Credits granted to each session.
pub const DEFAULT_QUOTA_MAX: u32 = 5;
/// Extracted text must be strictly longer than this (in characters) to be analysed.
pub const DEFAULT_MIN_TEXT_CHARS: usize = 100;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;
/// Upper bound on sessions held in memory at once.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Application configuration loaded from environment variables.
///
/// Secrets are optional at startup: a missing access code or API key is
/// reported as a configuration error on the request that needs it.
#[derive(Debug, Clone)]
pub struct Config {
    pub access_password: Option<String>,
    pub google_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub quota_max: u32,
    pub min_text_chars: usize,
    pub max_upload_bytes: usize,
    pub session_ttl_secs: u64,
    pub max_sessions: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            access_password: get("ADMIN_PASSWORD"),
            google_api_key: get("GOOGLE_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_api_base: get("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            quota_max: parse_or(get("QUOTA_MAX"), "QUOTA_MAX", DEFAULT_QUOTA_MAX)?,
            min_text_chars: parse_or(
                get("MIN_TEXT_CHARS"),
                "MIN_TEXT_CHARS",
                DEFAULT_MIN_TEXT_CHARS,
            )?,
            max_upload_bytes: parse_or(
                get("MAX_UPLOAD_BYTES"),
                "MAX_UPLOAD_BYTES",
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
            session_ttl_secs: parse_or(
                get("SESSION_TTL_SECS"),
                "SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
            )?,
            max_sessions: parse_or(get("MAX_SESSIONS"), "MAX_SESSIONS", DEFAULT_MAX_SESSIONS)?,
            port: parse_or(get("PORT"), "PORT", 8080u16)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .ok()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}
