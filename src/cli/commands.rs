//! CLI command definitions and handlers

use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::core::client::{present, ChatClient, ChatModel, PresentMode};
use crate::core::config::ClientConfig;
use crate::core::models::Message;

/// Sentence translated when no subcommand is given
pub const DEFAULT_TEXT: &str = "I love programming.";

/// Language used when none is requested
pub const DEFAULT_TARGET_LANG: &str = "French";

/// Client settings that override the config file and environment
#[derive(Args, Debug, Default)]
pub struct ClientOverrides {
    /// JSON or YAML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API key (defaults to OPENAI_API_KEY env var)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Endpoint root, e.g. https://api.openai.com/v1
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Model identifier
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Sampling temperature in [0, 2]
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Response length cap in tokens
    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Resubmissions allowed on transient failure
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,
}

impl ClientOverrides {
    /// Resolve the configuration: file (or defaults), then environment, then flags
    pub fn resolve(&self) -> anyhow::Result<ClientConfig> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Same as `resolve`, reading environment values through `lookup`
    pub fn resolve_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        config.apply_lookup(&lookup)?;
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut ClientConfig) {
        if let Some(api_key) = &self.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = Some(max_tokens);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = Some(timeout_ms);
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
    }
}

/// Commands for the chat translator
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate one sentence
    Translate {
        /// Text to translate
        text: String,

        /// Target language (default: French)
        #[arg(short, long, default_value = DEFAULT_TARGET_LANG)]
        target_lang: String,

        /// Print provider metadata after the text
        #[arg(long)]
        raw: bool,
    },

    /// Send a free-form prompt
    Chat {
        /// Human message
        prompt: String,

        /// System instruction sent before the prompt
        #[arg(long)]
        system: Option<String>,

        /// Print provider metadata after the text
        #[arg(long)]
        raw: bool,
    },

    /// Start HTTP API server
    Serve {
        /// Bind address (default: 127.0.0.1)
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Listen port (default: 3000)
        #[arg(short, long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },
}

fn present_mode(raw: bool) -> PresentMode {
    if raw {
        PresentMode::Full
    } else {
        PresentMode::Content
    }
}

/// Build the message sequence for a free-form prompt
pub fn chat_messages(prompt: String, system: Option<String>) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system {
        messages.push(Message::system(system));
    }
    messages.push(Message::human(prompt));
    messages
}

/// Handle translate command
pub async fn handle_translate(
    client: &ChatClient,
    text: String,
    target_lang: String,
    raw: bool,
) -> anyhow::Result<()> {
    info!("Translating to {} with {}", target_lang, client.model_name());

    let response = client.translate(&text, &target_lang).await?;
    present(&response, present_mode(raw));

    Ok(())
}

/// Handle chat command
pub async fn handle_chat(
    client: &ChatClient,
    prompt: String,
    system: Option<String>,
    raw: bool,
) -> anyhow::Result<()> {
    let messages = chat_messages(prompt, system);
    let response = client.invoke(&messages).await?;
    present(&response, present_mode(raw));

    Ok(())
}

/// Handle server command
pub async fn handle_server(client: ChatClient, host: String, port: u16) -> anyhow::Result<()> {
    use crate::server::api::run_server;

    info!("Starting HTTP server on {}:{}", host, port);
    println!("🚀 Server starting on http://{}:{}", host, port);

    run_server(Arc::new(client), host, port).await?;

    Ok(())
}
