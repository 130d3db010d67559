//! Custom error types for chat-completion requests

use thiserror::Error;

/// Errors raised while configuring or invoking the chat client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Invalid parameter value, detected before any request is sent
    #[error("Configuration error: {message}")]
    Configuration {
        /// What was wrong
        message: String,
    },

    /// Credential rejected by the endpoint
    #[error("Authentication failed: {status} - {message}")]
    Authentication {
        /// HTTP status, 401 or 403
        status: u16,
        /// Provider diagnostic
        message: String,
    },

    /// Network or timeout failure that outlived the retry budget
    #[error("Transport error after {attempts} attempt(s): {message}")]
    Transport {
        /// Last failure seen
        message: String,
        /// Attempts made, including the first
        attempts: u32,
    },

    /// Non-transient rejection from the endpoint
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status
        status: u16,
        /// Provider diagnostic
        message: String,
    },

    /// Malformed or empty result
    #[error("Invalid response: {message}")]
    Response {
        /// What was missing or malformed
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ClientError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        ClientError::Configuration {
            message: message.into(),
        }
    }

    /// Shorthand for a response error
    pub fn response(message: impl Into<String>) -> Self {
        ClientError::Response {
            message: message.into(),
        }
    }

    /// Whether the error happened after a request was attempted.
    ///
    /// Operators see all of these as a single "request failed" category.
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            ClientError::Authentication { .. }
                | ClientError::Transport { .. }
                | ClientError::Api { .. }
                | ClientError::Response { .. }
        )
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
