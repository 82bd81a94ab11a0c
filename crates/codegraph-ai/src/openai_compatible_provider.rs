use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::provider::{GenerationConfig, LlmProvider, LlmResponse, Message, ProviderError};

/// Configuration for any Chat-Completions-shaped endpoint: a hosted gateway,
/// or a local model server (Ollama, LM Studio) reached as a fallback-chain
/// entry when no hosted quota remains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiCompatibleConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl OpenAiCompatibleConfig {
    pub fn ollama(model: impl Into<String>) -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: model.into(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

pub struct OpenAiCompatibleProvider {
    config: OpenAiCompatibleConfig,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Fatal(e.to_string()))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<LlmResponse, ProviderError> {
        let request = ChatCompletionsRequest {
            model: self.config.model.clone(),
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: role_str(m.role),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::Transient(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::Quota);
        }
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Transient(format!("{status}: {body}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Fatal(format!("{status}: {body}")));
        }

        let body: ChatCompletionsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Transient(e.to_string()))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Shape("response had no choices".to_string()))?;

        Ok(LlmResponse {
            content: choice.message.content,
            model: body.model,
        })
    }
}

fn role_str(role: crate::provider::MessageRole) -> &'static str {
    use crate::provider::MessageRole::*;
    match role {
        System => "system",
        User => "user",
        Assistant => "assistant",
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    model: String,
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_default_points_at_local_endpoint() {
        let config = OpenAiCompatibleConfig::ollama("llama3");
        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn construction_succeeds_without_api_key() {
        let config = OpenAiCompatibleConfig::ollama("llama3");
        assert!(OpenAiCompatibleProvider::new(config).is_ok());
    }
}
