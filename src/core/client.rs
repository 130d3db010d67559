//! Chat-completion client: configure, invoke, present

use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::config::ClientConfig;
use crate::core::errors::Result;
use crate::core::models::{ChatResponse, CompletionBody, CompletionRequest, Message};
use crate::core::transport::HttpTransport;

/// Provider-agnostic chat model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send an ordered message sequence and return the first successful response
    async fn invoke(&self, messages: &[Message]) -> Result<ChatResponse>;

    /// Model identifier used for requests
    fn model_name(&self) -> &str;
}

/// How much of a response `present` writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PresentMode {
    /// Generated text only
    #[default]
    Content,
    /// Generated text followed by provider metadata
    Full,
}

/// Client for an OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone)]
pub struct ChatClient {
    config: Arc<ClientConfig>,
    transport: HttpTransport,
}

impl ChatClient {
    /// Create a new client, validating the configuration eagerly
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;

        info!(
            "Chat client ready: model={}, endpoint={}, max_retries={}",
            config.model,
            config.completions_url(),
            config.max_retries
        );

        Ok(Self {
            config: Arc::new(config),
            transport,
        })
    }

    /// Create from environment
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Active configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Translate one sentence into `target_language`
    pub async fn translate(&self, text: &str, target_language: &str) -> Result<ChatResponse> {
        let messages = Message::translation_exchange(target_language, text);
        self.invoke(&messages).await
    }

    async fn send(&self, messages: &[Message]) -> Result<ChatResponse> {
        Message::validate_sequence(messages)?;

        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!(
            "Sending {} message(s) to {}",
            messages.len(),
            self.config.model
        );

        let body: CompletionBody = self
            .transport
            .post_json(&self.config.completions_url(), &request)
            .await?;

        let response = body.into_response(&self.config.model)?;

        if let Some(usage) = response.usage {
            debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatModel for ChatClient {
    async fn invoke(&self, messages: &[Message]) -> Result<ChatResponse> {
        self.send(messages).await
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Human-readable form of a response
pub fn render(response: &ChatResponse, mode: PresentMode) -> String {
    match mode {
        PresentMode::Content => response.content.clone(),
        PresentMode::Full => {
            let mut out = response.content.clone();
            out.push_str("\n\n");
            // Writing to a String cannot fail
            let _ = writeln!(out, "model: {}", response.model);
            if let Some(id) = &response.id {
                let _ = writeln!(out, "id: {}", id);
            }
            if let Some(created) = &response.created {
                let _ = writeln!(out, "created: {}", created.to_rfc3339());
            }
            if let Some(reason) = &response.finish_reason {
                let _ = writeln!(out, "finish_reason: {}", reason);
            }
            if let Some(usage) = &response.usage {
                let _ = writeln!(
                    out,
                    "usage: prompt={} completion={} total={}",
                    usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
                );
            }
            out.trim_end().to_string()
        }
    }
}

/// Write a response to standard output
pub fn present(response: &ChatResponse, mode: PresentMode) {
    println!("{}", render(response, mode));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ClientError;
    use crate::core::models::TokenUsage;

    fn sample_response() -> ChatResponse {
        ChatResponse {
            content: "J'aime la programmation.".to_string(),
            id: Some("chatcmpl-42".to_string()),
            model: "gpt-4o".to_string(),
            created: None,
            finish_reason: Some("stop".to_string()),
            usage: Some(TokenUsage {
                prompt_tokens: 30,
                completion_tokens: 7,
                total_tokens: 37,
            }),
        }
    }

    #[test]
    fn test_client_creation() {
        let config = ClientConfig {
            api_key: "test_key".to_string(),
            ..Default::default()
        };
        let client = ChatClient::new(config).unwrap();
        assert_eq!(client.model_name(), "gpt-4o");
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        let result = ChatClient::new(ClientConfig::default());
        assert!(matches!(result, Err(ClientError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_invoke_rejects_misordered_messages() {
        let config = ClientConfig {
            api_key: "test_key".to_string(),
            // Never contacted: validation fails first
            base_url: "http://127.0.0.1:9/v1".to_string(),
            ..Default::default()
        };
        let client = ChatClient::new(config).unwrap();

        let result = client
            .invoke(&[Message::human("hi"), Message::system("late")])
            .await;
        assert!(matches!(result, Err(ClientError::Configuration { .. })));
    }

    #[test]
    fn test_render_content_only() {
        assert_eq!(
            render(&sample_response(), PresentMode::Content),
            "J'aime la programmation."
        );
    }

    #[test]
    fn test_render_full() {
        let rendered = render(&sample_response(), PresentMode::Full);
        assert!(rendered.starts_with("J'aime la programmation.\n\n"));
        assert!(rendered.contains("model: gpt-4o"));
        assert!(rendered.contains("id: chatcmpl-42"));
        assert!(rendered.contains("finish_reason: stop"));
        assert!(rendered.contains("usage: prompt=30 completion=7 total=37"));
        assert!(!rendered.contains("created:"));
    }
}
