use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::DEFAULT_API_URL;
use crate::roast::sanitizer::TextLimits;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub anthropic_api_url: String,
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub rate_limit_sweep: Duration,
    /// Honour `x-forwarded-for` / `x-real-ip` when deriving the client id.
    pub trust_forwarded_headers: bool,
    pub text_limits: TextLimits,
    pub llm_timeout: Duration,
    pub llm_max_tokens: u32,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            anthropic_api_url: std::env::var("ANTHROPIC_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            redis_url: std::env::var("REDIS_URL").ok().filter(|s| !s.trim().is_empty()),
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            rate_limit_max: env_or("RATE_LIMIT_MAX", 10)?,
            rate_limit_window: Duration::from_secs(env_or("RATE_LIMIT_WINDOW_SECS", 60)?),
            rate_limit_sweep: Duration::from_secs(env_or("RATE_LIMIT_SWEEP_SECS", 60)?),
            trust_forwarded_headers: env_or("TRUST_FORWARDED_HEADERS", true)?,
            text_limits: TextLimits {
                min_chars: env_or("MIN_TEXT_CHARS", TextLimits::default().min_chars)?,
                max_chars: env_or("MAX_TEXT_CHARS", TextLimits::default().max_chars)?,
            },
            llm_timeout: Duration::from_secs(env_or("LLM_TIMEOUT_SECS", 60)?),
            llm_max_tokens: env_or("LLM_MAX_TOKENS", 4096)?,
            request_timeout: Duration::from_secs(env_or("REQUEST_TIMEOUT_SECS", 90)?),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
        };

        config.check()?;
        Ok(config)
    }

    /// Rejects combinations that would make the pipeline unusable.
    fn check(&self) -> Result<()> {
        if self.rate_limit_max == 0 {
            bail!("RATE_LIMIT_MAX must be at least 1");
        }
        if self.rate_limit_window.is_zero() {
            bail!("RATE_LIMIT_WINDOW_SECS must be at least 1");
        }
        if self.rate_limit_sweep.is_zero() {
            bail!("RATE_LIMIT_SWEEP_SECS must be at least 1");
        }
        if self.text_limits.min_chars > self.text_limits.max_chars {
            bail!(
                "MIN_TEXT_CHARS ({}) must not exceed MAX_TEXT_CHARS ({})",
                self.text_limits.min_chars,
                self.text_limits.max_chars
            );
        }
        Ok(())
    }

    /// Fully populated configuration that never touches the environment.
    #[cfg(test)]
    pub fn test_default() -> Self {
        Config {
            anthropic_api_key: "test-key".to_string(),
            anthropic_api_url: DEFAULT_API_URL.to_string(),
            redis_url: None,
            port: 8080,
            rust_log: "info".to_string(),
            rate_limit_max: 10,
            rate_limit_window: Duration::from_secs(60),
            rate_limit_sweep: Duration::from_secs(60),
            trust_forwarded_headers: true,
            text_limits: TextLimits::default(),
            llm_timeout: Duration::from_secs(60),
            llm_max_tokens: 4096,
            request_timeout: Duration::from_secs(90),
            max_upload_bytes: 1024,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_var(key, std::env::var(key).ok(), default)
}

fn parse_var<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{value}'")),
        _ => Ok(default),
    }
}
