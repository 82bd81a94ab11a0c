use std::sync::Arc;
use std::time::Duration;

use codegraph_core::{AnalyzerConfig, CodeGraphError};
use rand::Rng;
use tracing::{info, warn};

use crate::provider::{GenerationConfig, LlmProvider, Message, ProviderError};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("quota exhausted across every model in the fallback chain")]
    QuotaExhausted,
    #[error("LLM API error: {0}")]
    ApiError(String),
    #[error("response did not match the expected shape: {0}")]
    ShapeError(String),
}

impl From<GatewayError> for CodeGraphError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::QuotaExhausted => {
                CodeGraphError::QuotaExhausted("all models exhausted".to_string())
            }
            GatewayError::ApiError(msg) => CodeGraphError::ApiError(msg),
            GatewayError::ShapeError(msg) => CodeGraphError::ShapeError(msg),
        }
    }
}

/// The single call surface to any model provider. Owns the ordered model
/// fallback chain and the bounded per-model retry policy.
pub struct LlmGateway {
    models: Vec<Arc<dyn LlmProvider>>,
    attempts_per_model: u32,
    retry_wait_min: Duration,
    retry_wait_max: Duration,
    per_call_deadline: Duration,
}

impl LlmGateway {
    pub fn new(models: Vec<Arc<dyn LlmProvider>>, config: &AnalyzerConfig) -> Self {
        Self {
            models,
            attempts_per_model: config.retry.attempts_per_model,
            retry_wait_min: Duration::from_secs(config.retry.retry_wait_min_secs),
            retry_wait_max: Duration::from_secs(config.retry.retry_wait_max_secs),
            per_call_deadline: Duration::from_secs(config.per_call_deadline_secs),
        }
    }

    /// Plain-text generation, e.g. the narrative prompt.
    pub async fn generate_markdown(&self, prompt: &str) -> Result<String, GatewayError> {
        let messages = vec![Message::user(prompt)];
        let response = self
            .call_with_fallback(&messages, &GenerationConfig::default())
            .await?;
        Ok(response)
    }

    /// Structured generation: the gateway validates the response against
    /// `expected_shape` and, on mismatch, issues one corrective retry with a
    /// shape-repair prompt before surfacing `ShapeError`.
    pub async fn generate_structured<T: serde::de::DeserializeOwned>(
        &self,
        prompt: &str,
        expected_shape: serde_json::Value,
    ) -> Result<T, GatewayError> {
        let config = GenerationConfig {
            expected_shape: Some(expected_shape),
            ..Default::default()
        };
        let messages = vec![Message::user(prompt)];
        let first = self.call_with_fallback(&messages, &config).await?;

        if let Ok(parsed) = serde_json::from_str::<T>(extract_json_block(&first)) {
            return Ok(parsed);
        }

        warn!("structured response failed shape validation, issuing corrective retry");
        let repair_prompt = format!(
            "Your previous response did not match the required JSON shape. \
             Respond again with ONLY valid JSON matching the shape.\n\nPrevious response:\n{first}"
        );
        let repair_messages = vec![Message::user(prompt), Message::user(repair_prompt)];
        let second = self.call_with_fallback(&repair_messages, &config).await?;

        serde_json::from_str::<T>(extract_json_block(&second))
            .map_err(|e| GatewayError::ShapeError(e.to_string()))
    }

    /// Mermaid generation with fenced-block post-processing.
    pub async fn generate_mermaid(&self, prompt: &str) -> Result<String, GatewayError> {
        let messages = vec![Message::user(prompt)];
        let raw = self
            .call_with_fallback(&messages, &GenerationConfig::default())
            .await?;
        Ok(extract_mermaid_block(&raw))
    }

    /// The fallback-chain + bounded-retry algorithm: for each model, up to
    /// `attempts_per_model` attempts; transient failures
    /// wait uniformly in `[retry_wait_min, retry_wait_max]` and retry the
    /// same model; quota exhaustion moves to the next model without waiting.
    /// Fails `QuotaExhausted` only when every model exhausted on quota.
    async fn call_with_fallback(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<String, GatewayError> {
        let mut all_quota = true;
        let mut last_message = "no models configured".to_string();

        for model in &self.models {
            let mut model_quota_exhausted = false;

            for attempt in 1..=self.attempts_per_model {
                match tokio::time::timeout(
                    self.per_call_deadline,
                    model.complete(messages, config),
                )
                .await
                {
                    Ok(Ok(response)) => {
                        info!(model = model.model_name(), attempt, "LLM call succeeded");
                        return Ok(response.content);
                    }
                    Ok(Err(ProviderError::Quota)) => {
                        info!(model = model.model_name(), "quota exhausted, moving to next model");
                        model_quota_exhausted = true;
                        last_message = format!("{} exhausted quota", model.model_name());
                        break;
                    }
                    Ok(Err(ProviderError::Shape(msg))) => {
                        // Shape errors are handled by the caller's corrective
                        // retry, not the gateway's transport retry loop.
                        return Err(GatewayError::ShapeError(msg));
                    }
                    Ok(Err(ProviderError::Transient(msg))) | Ok(Err(ProviderError::Fatal(msg))) => {
                        last_message = msg.clone();
                        if attempt < self.attempts_per_model {
                            warn!(model = model.model_name(), attempt, %msg, "transient failure, retrying");
                            tokio::time::sleep(self.jittered_wait()).await;
                        } else {
                            warn!(model = model.model_name(), "attempts exhausted, moving to next model");
                        }
                    }
                    Err(_elapsed) => {
                        last_message = format!("{} deadline exceeded", model.model_name());
                        if attempt < self.attempts_per_model {
                            tokio::time::sleep(self.jittered_wait()).await;
                        }
                    }
                }
            }

            if !model_quota_exhausted {
                all_quota = false;
            }
        }

        if all_quota && !self.models.is_empty() {
            Err(GatewayError::QuotaExhausted)
        } else {
            Err(GatewayError::ApiError(last_message))
        }
    }

    fn jittered_wait(&self) -> Duration {
        let min = self.retry_wait_min.as_millis() as u64;
        let max = self.retry_wait_max.as_millis() as u64;
        if max <= min {
            return self.retry_wait_min;
        }
        let millis = rand::rng().random_range(min..=max);
        Duration::from_millis(millis)
    }
}

fn extract_json_block(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        if let Some(end) = after.find("```") {
            return after[..end].trim();
        }
    }
    trimmed
}

fn extract_mermaid_block(text: &str) -> String {
    if let Some(start) = text.find("```mermaid") {
        let after = &text[start + "```mermaid".len()..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }
    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fenced_mermaid_block() {
        let raw = "Here is the diagram:\n```mermaid\nflowchart TD\n    A --> B\n```\nThanks";
        assert_eq!(extract_mermaid_block(raw), "flowchart TD\n    A --> B");
    }

    #[test]
    fn falls_back_to_whole_body_without_fence() {
        let raw = "flowchart TD\n    A --> B";
        assert_eq!(extract_mermaid_block(raw), raw);
    }
}
