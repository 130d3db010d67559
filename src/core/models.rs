//! Core data models for chat-completion requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::errors::{ClientError, Result};

/// Author of a message in the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Sets the assistant's behavior before the task is posed
    #[serde(rename = "system")]
    System,
    /// The task itself; sent as `user` on the wire
    #[serde(rename = "user", alias = "human")]
    Human,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::Human => write!(f, "human"),
        }
    }
}

/// A role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message
    pub role: Role,
    /// Message text
    pub content: String,
}

impl Message {
    /// Message with an explicit role
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// System instruction
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Human utterance
    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    /// Build the system instruction + human utterance pair used for translation
    pub fn translation_exchange(target_language: &str, text: impl Into<String>) -> Vec<Message> {
        vec![
            Message::system(format!(
                "You are a helpful translator. Translate the user sentence to {}.",
                target_language
            )),
            Message::human(text),
        ]
    }

    /// Check that a sequence can be sent as-is.
    ///
    /// The sequence must be non-empty, carry at least one human message, and
    /// every system message must precede the first human message.
    pub fn validate_sequence(messages: &[Message]) -> Result<()> {
        if messages.is_empty() {
            return Err(ClientError::config("At least one message is required"));
        }

        let first_human = messages
            .iter()
            .position(|m| m.role == Role::Human)
            .ok_or_else(|| ClientError::config("At least one human message is required"))?;

        if let Some(offset) = messages[first_human..]
            .iter()
            .position(|m| m.role == Role::System)
        {
            return Err(ClientError::config(format!(
                "System message at position {} follows a human message",
                first_human + offset
            )));
        }

        Ok(())
    }
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the submitted messages
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Tokens in the generated reply
    #[serde(default)]
    pub completion_tokens: u64,
    /// Sum of both
    #[serde(default)]
    pub total_tokens: u64,
}

/// Result of a single invocation. Never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated text
    pub content: String,
    /// Provider-assigned completion id
    pub id: Option<String>,
    /// Model that produced the reply
    pub model: String,
    /// Creation time reported by the provider
    pub created: Option<DateTime<Utc>>,
    /// Why generation stopped, e.g. `stop` or `length`
    pub finish_reason: Option<String>,
    /// Token accounting, when reported
    pub usage: Option<TokenUsage>,
}

/// Request body for `POST {base_url}/chat/completions`
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    /// Model identifier
    pub model: &'a str,
    /// Ordered exchange
    pub messages: &'a [Message],
    /// Sampling temperature
    pub temperature: f32,
    /// Response length cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Response body of a chat completion, as much of it as we read
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionBody {
    /// Completion id
    pub id: Option<String>,
    /// Model that answered
    pub model: Option<String>,
    /// Unix timestamp in seconds
    pub created: Option<i64>,
    /// Candidate replies; only the first is used
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    /// Token accounting
    pub usage: Option<TokenUsage>,
}

/// One candidate reply
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    /// Assistant message
    pub message: Option<CompletionMessage>,
    /// Why generation stopped
    pub finish_reason: Option<String>,
}

/// Assistant message inside a choice
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionMessage {
    /// Generated text
    pub content: Option<String>,
}

impl CompletionBody {
    /// Extract the generated text and metadata.
    ///
    /// `requested_model` is used when the provider omits the model name.
    pub fn into_response(self, requested_model: &str) -> Result<ChatResponse> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::response("No choices in response"))?;

        let content = choice
            .message
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ClientError::response("No content in response"))?;

        Ok(ChatResponse {
            content,
            id: self.id,
            model: self.model.unwrap_or_else(|| requested_model.to_string()),
            created: self
                .created
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
            finish_reason: choice.finish_reason,
            usage: self.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_human_role_serializes_as_user() {
        let value = serde_json::to_value(Message::human("hi")).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "hi"}));

        let parsed: Message =
            serde_json::from_value(json!({"role": "human", "content": "hi"})).unwrap();
        assert_eq!(parsed.role, Role::Human);
    }

    #[test]
    fn test_translation_exchange() {
        let messages = Message::translation_exchange("French", "I love programming.");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(
            messages[0].content,
            "You are a helpful translator. Translate the user sentence to French."
        );
        assert_eq!(messages[1], Message::human("I love programming."));
    }

    #[test]
    fn test_sequence_validation() {
        assert!(Message::validate_sequence(&[]).is_err());
        assert!(Message::validate_sequence(&[Message::system("only system")]).is_err());
        assert!(Message::validate_sequence(&[Message::human("hello")]).is_ok());
        assert!(Message::validate_sequence(&[
            Message::system("a"),
            Message::system("b"),
            Message::human("c"),
        ])
        .is_ok());

        let err = Message::validate_sequence(&[Message::human("c"), Message::system("a")])
            .unwrap_err();
        assert!(matches!(err, ClientError::Configuration { .. }));
        assert!(err.to_string().contains("position 1"));
    }

    #[test]
    fn test_completion_body_extraction() {
        let body: CompletionBody = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-2024-08-06",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "J'aime la programmation."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 30, "completion_tokens": 7, "total_tokens": 37}
        }))
        .unwrap();

        let response = body.into_response("gpt-4o").unwrap();
        assert_eq!(response.content, "J'aime la programmation.");
        assert_eq!(response.model, "gpt-4o-2024-08-06");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(37));
        assert_eq!(response.created.map(|c| c.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn test_empty_content_is_rejected() {
        let body: CompletionBody = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "  "}}]
        }))
        .unwrap();
        assert!(matches!(
            body.into_response("gpt-4o"),
            Err(ClientError::Response { .. })
        ));

        let body: CompletionBody = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            body.into_response("gpt-4o"),
            Err(ClientError::Response { .. })
        ));
    }
}
