//! HTTP transport with retry and backoff
//!
//! The client hands a request body and a retry budget to this layer; it never
//! retries on its own. Only transient failures (connection errors, timeouts,
//! 408/409/429 and 5xx responses) consume the budget.

use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::core::config::ClientConfig;
use crate::core::errors::{ClientError, Result};

/// Upper bound for a single backoff pause
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// How a non-success status is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusClass {
    /// Resubmit while budget remains
    Transient,
    /// Credential rejected
    Auth,
    /// Any other rejection
    Fatal,
}

fn classify_status(status: StatusCode) -> StatusClass {
    match status.as_u16() {
        401 | 403 => StatusClass::Auth,
        408 | 409 | 429 => StatusClass::Transient,
        s if s >= 500 => StatusClass::Transient,
        _ => StatusClass::Fatal,
    }
}

/// Outcome of one failed attempt
#[derive(Debug)]
enum AttemptError {
    Transient {
        message: String,
        retry_after: Option<Duration>,
    },
    Fatal(ClientError),
}

/// Pull `error.message` out of an OpenAI-style error body, else the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// JSON-over-HTTP transport owning the retry budget
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    api_key: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a transport from a validated configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10);

        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// POST `body` as JSON and decode the JSON reply, retrying transient failures
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            debug!(
                "POST {} (attempt {}/{})",
                url,
                attempt,
                self.max_retries.saturating_add(1)
            );

            match self.send_once(url, body).await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("Request succeeded after {} retries", attempt - 1);
                    }
                    return Ok(value);
                }
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Transient {
                    message,
                    retry_after,
                }) => {
                    if attempt > self.max_retries {
                        return Err(ClientError::Transport {
                            message,
                            attempts: attempt,
                        });
                    }

                    let delay = retry_after
                        .unwrap_or_else(|| self.backoff(attempt))
                        .min(MAX_BACKOFF);
                    warn!(
                        "Attempt {} failed: {}, retrying in {:?}",
                        attempt, message, delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// Exponential backoff before the resubmission that follows `attempt`
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_delay.saturating_mul(factor)
    }

    async fn send_once<B, T>(&self, url: &str, body: &B) -> std::result::Result<T, AttemptError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    AttemptError::Fatal(ClientError::config(format!("Invalid request: {}", e)))
                } else if e.is_timeout() {
                    AttemptError::Transient {
                        message: "Request timeout".to_string(),
                        retry_after: None,
                    }
                } else {
                    AttemptError::Transient {
                        message: e.to_string(),
                        retry_after: None,
                    }
                }
            })?;

        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await.map_err(|e| AttemptError::Transient {
                message: e.to_string(),
                retry_after: None,
            })?;

            return serde_json::from_slice(&bytes).map_err(|e| {
                AttemptError::Fatal(ClientError::response(format!(
                    "Failed to decode response body: {}",
                    e
                )))
            });
        }

        // Headers must be read before the body consumes the response
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let message = error_message(&response.text().await.unwrap_or_default());

        match classify_status(status) {
            StatusClass::Transient => Err(AttemptError::Transient {
                message: format!("HTTP {}: {}", status.as_u16(), message),
                retry_after,
            }),
            StatusClass::Auth => Err(AttemptError::Fatal(ClientError::Authentication {
                status: status.as_u16(),
                message,
            })),
            StatusClass::Fatal => Err(AttemptError::Fatal(ClientError::Api {
                status: status.as_u16(),
                message,
            })),
        }
    }
}
