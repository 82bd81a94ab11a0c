//! In-memory `LlmProvider` fakes for exercising the gateway and the
//! orchestrator without a network call, following the common
//! `test_helpers`/`test_utils` convention of keeping fakes alongside the
//! real implementation rather than behind a separate crate.
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::provider::{GenerationConfig, LlmProvider, LlmResponse, Message, ProviderError};

/// A scripted response queue. Each call consumes the next entry; the last
/// entry repeats once exhausted.
pub struct ScriptedProvider {
    name: String,
    script: Vec<ScriptedOutcome>,
    calls: AtomicUsize,
}

#[derive(Clone)]
pub enum ScriptedOutcome {
    Text(String),
    Quota,
    Transient,
}

impl ScriptedProvider {
    pub fn new(name: impl Into<String>, script: Vec<ScriptedOutcome>) -> Self {
        Self {
            name: name.into(),
            script,
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider that always succeeds with `text`.
    pub fn always(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, vec![ScriptedOutcome::Text(text.into())])
    }

    /// A provider that always exhausts its quota.
    pub fn always_quota(name: impl Into<String>) -> Self {
        Self::new(name, vec![ScriptedOutcome::Quota])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// A provider that quota-exhausts only calls whose prompt contains one of
/// `blocked_substrings`, succeeding on everything else with a fixed stock
/// reply appropriate to the prompt's shape. Lets a test degrade one stage
/// (e.g. a single diagram mode) while leaving the rest of a run healthy.
pub struct SelectiveProvider {
    name: String,
    blocked_substrings: Vec<String>,
    calls: AtomicUsize,
}

impl SelectiveProvider {
    pub fn new(name: impl Into<String>, blocked_substrings: Vec<String>) -> Self {
        Self {
            name: name.into(),
            blocked_substrings,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for SelectiveProvider {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<LlmResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = messages.iter().map(|m| m.content.as_str()).collect::<Vec<_>>().join("\n");

        if self.blocked_substrings.iter().any(|s| prompt.contains(s.as_str())) {
            return Err(ProviderError::Quota);
        }

        let content = if config.expected_shape.is_some() {
            "{\"components\": []}".to_string()
        } else if prompt.contains("Mermaid flowchart") {
            "```mermaid\nflowchart TD\n    a --> b\n```".to_string()
        } else {
            "## Architecture\nA small repository.".to_string()
        };

        Ok(LlmResponse {
            content,
            model: self.name.clone(),
        })
    }
}

/// A provider that sleeps for `delay` before returning a fixed reply. Used to
/// force a run past its per-run deadline without relying on wall-clock
/// flakiness from a real network call.
pub struct SlowProvider {
    name: String,
    delay: std::time::Duration,
    reply: String,
}

impl SlowProvider {
    pub fn new(name: impl Into<String>, delay: std::time::Duration, reply: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delay,
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for SlowProvider {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _config: &GenerationConfig,
    ) -> Result<LlmResponse, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(LlmResponse {
            content: self.reply.clone(),
            model: self.name.clone(),
        })
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _config: &GenerationConfig,
    ) -> Result<LlmResponse, ProviderError> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .get(idx)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or(ScriptedOutcome::Quota);

        match outcome {
            ScriptedOutcome::Text(content) => Ok(LlmResponse {
                content,
                model: self.name.clone(),
            }),
            ScriptedOutcome::Quota => Err(ProviderError::Quota),
            ScriptedOutcome::Transient => Err(ProviderError::Transient("simulated".to_string())),
        }
    }
}
