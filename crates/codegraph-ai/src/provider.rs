use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A message in the conversation, one turn of a chat-style completion
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: Option<usize>,
    /// When set, the provider must return content conforming to this JSON
    /// Schema, letting the provider return structured output directly.
    pub expected_shape: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
}

/// The provider-facing error kinds for a `call(model, prompt,
/// expected_shape?) -> text | structured` request: quota exhaustion,
/// transient transport failure, response-shape mismatch, or fatal.
#[derive(Debug, Clone)]
pub enum ProviderError {
    Quota,
    Transient(String),
    Shape(String),
    Fatal(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Quota => write!(f, "quota exhausted"),
            ProviderError::Transient(msg) => write!(f, "transient error: {msg}"),
            ProviderError::Shape(msg) => write!(f, "shape error: {msg}"),
            ProviderError::Fatal(msg) => write!(f, "fatal error: {msg}"),
        }
    }
}

/// One model endpoint in the fallback chain. Concrete providers (Anthropic,
/// an OpenAI-compatible endpoint, ...) implement this over `reqwest`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<LlmResponse, ProviderError>;
}
