//! Chat Translator - OpenAI-compatible chat-completion client
//!
//! This library configures a chat-completion endpoint, submits an ordered
//! sequence of role-tagged messages, and presents the generated reply. Retries
//! on transient failures are handled by the HTTP transport layer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;
pub mod server;

// Re-export key types for convenience
pub use self::core::{
    client::{present, render, ChatClient, ChatModel, PresentMode},
    config::ClientConfig,
    errors::ClientError,
    models::{ChatResponse, Message, Role, TokenUsage},
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
