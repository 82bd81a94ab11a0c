use std::sync::Arc;

use codegraph_ai::gateway::{GatewayError, LlmGateway};
use codegraph_ai::testing::ScriptedProvider;
use codegraph_ai::LlmProvider;
use codegraph_core::AnalyzerConfig;

fn fast_config() -> AnalyzerConfig {
    let mut config = AnalyzerConfig::default();
    config.retry.attempts_per_model = 2;
    config.retry.retry_wait_min_secs = 0;
    config.retry.retry_wait_max_secs = 0;
    config
}

#[tokio::test]
async fn quota_exhausted_on_every_model_surfaces_quota_error() {
    let models: Vec<Arc<dyn LlmProvider>> = vec![
        Arc::new(ScriptedProvider::always_quota("model-a")),
        Arc::new(ScriptedProvider::always_quota("model-b")),
    ];
    let gateway = LlmGateway::new(models, &fast_config());
    let result = gateway.generate_markdown("hello").await;
    assert!(matches!(result, Err(GatewayError::QuotaExhausted)));
}

#[tokio::test]
async fn falls_back_to_second_model_on_quota() {
    let models: Vec<Arc<dyn LlmProvider>> = vec![
        Arc::new(ScriptedProvider::always_quota("model-a")),
        Arc::new(ScriptedProvider::always("model-b", "architecture overview")),
    ];
    let gateway = LlmGateway::new(models, &fast_config());
    let result = gateway.generate_markdown("hello").await.unwrap();
    assert_eq!(result, "architecture overview");
}

#[tokio::test]
async fn mixed_quota_and_transient_failure_is_api_error_not_quota() {
    use codegraph_ai::testing::ScriptedOutcome;
    let models: Vec<Arc<dyn LlmProvider>> = vec![
        Arc::new(ScriptedProvider::new(
            "model-a",
            vec![ScriptedOutcome::Transient, ScriptedOutcome::Transient],
        )),
        Arc::new(ScriptedProvider::always_quota("model-b")),
    ];
    let gateway = LlmGateway::new(models, &fast_config());
    let result = gateway.generate_markdown("hello").await;
    assert!(matches!(result, Err(GatewayError::ApiError(_))));
}
