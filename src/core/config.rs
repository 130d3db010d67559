//! Configuration management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::errors::{ClientError, Result};

/// Default OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Upper bound of the sampling temperature accepted by providers
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Configuration for the chat client
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Model identifier sent with each request
    pub model: String,
    /// Sampling temperature, 0 = deterministic
    pub temperature: f32,
    /// Response length cap; unset means provider default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Request timeout; unset means no client-side limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Resubmissions allowed on transient failure
    pub max_retries: u32,
    /// Base delay of the exponential backoff between attempts
    pub retry_delay_ms: u64,
    /// Bearer credential. Never written back to disk.
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Endpoint root, e.g. `https://api.openai.com/v1`
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tokens: None,
            timeout_ms: None,
            max_retries: 2,
            retry_delay_ms: 500,
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Parse an optional environment value, naming the variable on failure
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ClientError::config(format!("Invalid {}: {}", key, e))),
        _ => Ok(None),
    }
}

impl ClientConfig {
    /// Build and validate a configuration in one step
    pub fn configure(
        model: impl Into<String>,
        temperature: f32,
        max_tokens: Option<u32>,
        timeout: Option<Duration>,
        max_retries: u32,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let timeout_ms = timeout.map(timeout_to_millis).transpose()?;

        let config = Self {
            model: model.into(),
            temperature,
            max_tokens,
            timeout_ms,
            max_retries,
            api_key: api_key.into(),
            base_url: base_url.into(),
            ..Default::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        config.apply_lookup(&lookup)?;

        if config.api_key.is_empty() {
            return Err(ClientError::config(
                "OPENAI_API_KEY environment variable is required",
            ));
        }

        debug!("Loaded configuration from environment: {:?}", config);
        Ok(config)
    }

    /// Override fields with any lookup values that are set
    pub fn apply_lookup(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(api_key) = lookup("OPENAI_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.api_key = api_key;
        }
        if let Some(base_url) = lookup("OPENAI_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.base_url = base_url;
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|v| !v.trim().is_empty()) {
            self.model = model;
        }
        if let Some(temperature) = parse_var(lookup, "OPENAI_TEMPERATURE")? {
            self.temperature = temperature;
        }
        if let Some(max_tokens) = parse_var(lookup, "OPENAI_MAX_TOKENS")? {
            self.max_tokens = Some(max_tokens);
        }
        if let Some(timeout_ms) = parse_var(lookup, "REQUEST_TIMEOUT_MS")? {
            self.timeout_ms = Some(timeout_ms);
        }
        if let Some(max_retries) = parse_var(lookup, "MAX_RETRIES")? {
            self.max_retries = max_retries;
        }
        if let Some(retry_delay_ms) = parse_var(lookup, "RETRY_DELAY_MS")? {
            self.retry_delay_ms = retry_delay_ms;
        }
        Ok(())
    }

    /// Load from a JSON or YAML file (chosen by extension).
    ///
    /// Files written by `to_file` carry no API key; when the loaded key is
    /// empty it falls back to `OPENAI_API_KEY`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let mut config: Self = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        if config.api_key.is_empty() {
            config.api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        }

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to file, without the API key
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ClientError::config("API key is required"));
        }

        if self.base_url.trim().is_empty() {
            return Err(ClientError::config("Base URL is required"));
        }

        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ClientError::config(format!("Invalid base URL '{}': {}", self.base_url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::config(format!(
                "Base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.model.trim().is_empty() {
            return Err(ClientError::config("Model is required"));
        }

        if !self.temperature.is_finite() || !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(ClientError::config(format!(
                "temperature must be within [0, {}], got {}",
                MAX_TEMPERATURE, self.temperature
            )));
        }

        if self.max_tokens == Some(0) {
            return Err(ClientError::config("max_tokens must be greater than 0"));
        }

        if self.timeout_ms == Some(0) {
            return Err(ClientError::config("timeout must be greater than 0"));
        }

        Ok(())
    }

    /// Request timeout, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Full URL of the chat-completions endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Whole milliseconds, rounding a sub-millisecond timeout up to 1 ms
fn timeout_to_millis(timeout: Duration) -> Result<u64> {
    if timeout.is_zero() {
        return Ok(0);
    }
    u64::try_from(timeout.as_millis().max(1))
        .map_err(|_| ClientError::config(format!("timeout {:?} is out of range", timeout)))
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
