mod common;

use std::sync::Arc;

use codegraph_ai::testing::ScriptedProvider;
use codegraph_ai::LlmGateway;
use codegraph_core::{AnalyzerConfig, RunStatus};
use codegraph_orchestrator::{AnalysisService, InMemoryStore};

/// A second `start()` for the same URL, once the first run has completed,
/// returns the same run with no new workspace acquisition or LLM calls.
#[tokio::test]
async fn second_start_for_same_url_hits_cache() {
    let fixture = common::init_local_repo(&[("src/a.py", "x = 1\n")]);
    let repo_url = common::repo_url(&fixture);

    let mut config = AnalyzerConfig::default();
    config.work_dir_root = std::env::temp_dir()
        .join("codegraph-analyzer-test-cache")
        .to_string_lossy()
        .to_string();
    let config = Arc::new(config);

    let provider = Arc::new(ScriptedProvider::always("stub", "## Architecture\nstub"));
    let gateway = Arc::new(LlmGateway::new(vec![provider.clone()], &config));
    let store: Arc<dyn codegraph_orchestrator::PersistenceStore> = Arc::new(InMemoryStore::new());

    let service = AnalysisService::new(store, gateway, config);

    let first = service.start(&repo_url, false).await.expect("start run");
    common::wait_for_terminal(&service, first.run_id).await;
    let calls_after_first_run = provider.call_count();
    assert!(calls_after_first_run > 0);

    let second = service.start(&repo_url, false).await.expect("start run again");
    assert_eq!(second.run_id, first.run_id);
    assert_eq!(second.status, RunStatus::Completed);
    assert!(second.cached_at.is_some());

    assert_eq!(
        provider.call_count(),
        calls_after_first_run,
        "cache hit must not issue any further LLM calls"
    );
}

/// `force_refresh` bypasses the cache and schedules a fresh run even when a
/// completed run already exists for the same URL.
#[tokio::test]
async fn force_refresh_schedules_a_new_run() {
    let fixture = common::init_local_repo(&[("src/a.py", "x = 1\n")]);
    let repo_url = common::repo_url(&fixture);

    let mut config = AnalyzerConfig::default();
    config.work_dir_root = std::env::temp_dir()
        .join("codegraph-analyzer-test-cache-refresh")
        .to_string_lossy()
        .to_string();
    let config = Arc::new(config);

    let provider = Arc::new(ScriptedProvider::always("stub", "## Architecture\nstub"));
    let gateway = Arc::new(LlmGateway::new(vec![provider], &config));
    let store: Arc<dyn codegraph_orchestrator::PersistenceStore> = Arc::new(InMemoryStore::new());

    let service = AnalysisService::new(store, gateway, config);

    let first = service.start(&repo_url, false).await.expect("start run");
    common::wait_for_terminal(&service, first.run_id).await;

    let second = service.start(&repo_url, true).await.expect("forced refresh");
    assert_ne!(second.run_id, first.run_id);
    assert!(second.cached_at.is_none());
}
