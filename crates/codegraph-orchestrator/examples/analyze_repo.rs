//! Runs one analysis to completion against a local repository path and
//! prints the resulting narrative and dependency summary.
//!
//! Run with: `cargo run --example analyze_repo -- <path_or_git_url>`
//!
//! Uses the Anthropic provider when `ANTHROPIC_API_KEY` is set, otherwise
//! falls back to a local Ollama endpoint.

use std::sync::Arc;

use codegraph_ai::{AnthropicConfig, AnthropicProvider, LlmGateway, LlmProvider, OpenAiCompatibleConfig, OpenAiCompatibleProvider};
use codegraph_core::AnalyzerConfig;
use codegraph_orchestrator::{AnalysisService, InMemoryStore};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let repo_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://github.com/rust-lang/log".to_string());

    let config = Arc::new(AnalyzerConfig::default());
    let store = Arc::new(InMemoryStore::new());
    let gateway = Arc::new(LlmGateway::new(model_chain(), &config));
    let service = AnalysisService::new(store, gateway, config);

    info!(repo_url, "starting analysis");
    let outcome = service.start(&repo_url, false).await?;

    loop {
        let (status, progress, failure) = service.status(outcome.run_id).await?;
        info!(?status, progress, failure, "poll");
        if status.is_terminal() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    }

    let results = service.result(outcome.run_id).await?;
    println!("{}", results.artifacts.architecture_md);
    println!(
        "central files: {}",
        results
            .central_files
            .iter()
            .map(|f| f.path.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(())
}

fn model_chain() -> Vec<Arc<dyn LlmProvider>> {
    let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();
    if !api_key.is_empty() {
        if let Ok(provider) = AnthropicProvider::new(AnthropicConfig::from_env(
            "claude-3-5-sonnet-20241022",
        )) {
            return vec![Arc::new(provider)];
        }
    }
    let provider = OpenAiCompatibleProvider::new(OpenAiCompatibleConfig::ollama("llama3"))
        .expect("local provider always constructs");
    vec![Arc::new(provider)]
}
