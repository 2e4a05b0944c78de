//! Configuration management for the math solver.
//!
//! Configuration can be set via environment variables; none are required:
//! - `HOST` - Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Server port. Defaults to `5000`.
//! - `DEFAULT_MODEL` - Model identifier sent to the provider. Defaults to `gemma2-9b-it`.
//! - `GROQ_BASE_URL` - OpenAI-compatible API base. Defaults to `https://api.groq.com/openai/v1`.
//! - `GROQ_API_KEY` - Default credential for the interactive chat only. The HTTP
//!   endpoint always requires a per-request credential.
//! - `LLM_TIMEOUT_SECS` - Provider request timeout. Defaults to `120`.
//! - `LLM_TEMPERATURE` - Sampling temperature. Defaults to `0.0`.
//! - `WIKIPEDIA_API_URL` - MediaWiki API endpoint. Defaults to English Wikipedia.
//! - `WIKIPEDIA_TOP_K` - Pages summarised per lookup. Defaults to `3`.
//! - `WIKIPEDIA_MAX_CHARS` - Maximum lookup output length. Defaults to `4000`.
//! - `MAX_ITERATIONS` - Maximum agent loop iterations. Defaults to `15`.
//! - `RATE_LIMIT_REQUESTS` - Requests admitted per client per window. Defaults to `10`.
//! - `RATE_LIMIT_WINDOW_SECS` - Rate window length. Defaults to `60`.
//! - `RATE_LIMIT_EVICTION` - `clear_others` (default) or `per_key`.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::api::rate_limit::EvictionPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Settings for the hosted language model.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    pub base_url: String,

    /// Timeout applied to each completion request
    pub timeout: Duration,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemma2-9b-it".to_string(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            timeout: Duration::from_secs(120),
            temperature: 0.0,
        }
    }
}

/// Settings for the encyclopedia lookup tool.
#[derive(Debug, Clone)]
pub struct WikipediaConfig {
    pub api_url: String,
    pub top_k: usize,
    pub max_chars: usize,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            top_k: 3,
            max_chars: 4000,
        }
    }
}

/// Per-client request quota.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests admitted per window
    pub max_requests: u32,

    /// Window length
    pub window: Duration,

    /// How stale entries leave the table
    pub eviction: EvictionPolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
            eviction: EvictionPolicy::ClearOthers,
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum iterations for the agent loop
    pub max_iterations: usize,

    /// Fallback credential for the interactive chat
    pub default_api_key: Option<String>,

    pub llm: LlmConfig,

    pub wikipedia: WikipediaConfig,

    pub rate_limit: RateLimitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_iterations: 15,
            default_api_key: None,
            llm: LlmConfig::default(),
            wikipedia: WikipediaConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or(defaults.host);
        let port = parse_env("PORT", defaults.port)?;
        let max_iterations = parse_env("MAX_ITERATIONS", defaults.max_iterations)?;

        let default_api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let llm = LlmConfig {
            model: std::env::var("DEFAULT_MODEL").unwrap_or(defaults.llm.model),
            base_url: std::env::var("GROQ_BASE_URL").unwrap_or(defaults.llm.base_url),
            timeout: Duration::from_secs(parse_env(
                "LLM_TIMEOUT_SECS",
                defaults.llm.timeout.as_secs(),
            )?),
            temperature: parse_env("LLM_TEMPERATURE", defaults.llm.temperature)?,
        };

        let wikipedia = WikipediaConfig {
            api_url: std::env::var("WIKIPEDIA_API_URL").unwrap_or(defaults.wikipedia.api_url),
            top_k: parse_env("WIKIPEDIA_TOP_K", defaults.wikipedia.top_k)?,
            max_chars: parse_env("WIKIPEDIA_MAX_CHARS", defaults.wikipedia.max_chars)?,
        };

        let rate_limit = RateLimitConfig {
            max_requests: parse_env("RATE_LIMIT_REQUESTS", defaults.rate_limit.max_requests)?,
            window: Duration::from_secs(parse_env(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit.window.as_secs(),
            )?),
            eviction: parse_env("RATE_LIMIT_EVICTION", defaults.rate_limit.eviction)?,
        };

        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            max_iterations,
            default_api_key,
            llm,
            wikipedia,
            rate_limit,
        })
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}
