use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Application configuration loaded from environment variables.
///
/// Nothing here is required: a missing `GROQ_API_KEY` only disables the chat
/// endpoint, it does not stop the server from starting.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: Option<String>,
    pub groq_base_url: String,
    pub groq_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
    /// Idle age after which a session is evicted. `None` keeps sessions forever.
    pub session_ttl: Option<Duration>,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ttl_secs: u64 = parse_or(&lookup, "SESSION_TTL_SECS", 86_400)?;

        Ok(Config {
            groq_api_key: lookup("GROQ_API_KEY").filter(|k| !k.trim().is_empty()),
            groq_base_url: lookup("GROQ_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            groq_model: lookup("GROQ_MODEL").unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string()),
            temperature: parse_or(&lookup, "LLM_TEMPERATURE", 0.7)?,
            max_tokens: parse_or(&lookup, "LLM_MAX_TOKENS", 1024)?,
            stream: parse_or(&lookup, "LLM_STREAM", false)?,
            session_ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert!(config.groq_api_key.is_none());
        assert_eq!(config.groq_base_url, DEFAULT_GROQ_BASE_URL);
        assert_eq!(config.groq_model, DEFAULT_GROQ_MODEL);
        assert_eq!(config.max_tokens, 1024);
        assert!(!config.stream);
        assert_eq!(config.session_ttl, Some(Duration::from_secs(86_400)));
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = config_from(&[("GROQ_API_KEY", "   ")]).unwrap();
        assert!(config.groq_api_key.is_none());
    }

    #[test]
    fn test_zero_ttl_disables_eviction() {
        let config = config_from(&[("SESSION_TTL_SECS", "0")]).unwrap();
        assert!(config.session_ttl.is_none());
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = config_from(&[
            ("GROQ_API_KEY", "gsk_test"),
            ("GROQ_BASE_URL", "http://localhost:9000/v1/"),
            ("LLM_STREAM", "true"),
            ("LLM_TEMPERATURE", "0.3"),
            ("PORT", "5000"),
        ])
        .unwrap();
        assert_eq!(config.groq_api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.groq_base_url, "http://localhost:9000/v1");
        assert!(config.stream);
        assert!((config.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
