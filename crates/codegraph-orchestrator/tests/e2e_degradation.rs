mod common;

use std::sync::Arc;

use codegraph_ai::testing::SelectiveProvider;
use codegraph_ai::LlmGateway;
use codegraph_core::{AnalyzerConfig, DiagramMode, RunStatus, StageErrorKind};
use codegraph_orchestrator::{AnalysisService, InMemoryStore};

/// Every call whose prompt asks for the "detailed" diagram view quota-exhausts;
/// every other prompt (narrative, components, overview/balanced diagrams)
/// succeeds. The run must still complete, with the detailed diagram left
/// empty and a `quota_exhausted` entry tagged `diagram:detailed` in the log.
#[tokio::test]
async fn partial_degradation_leaves_run_completed_with_one_empty_diagram() {
    let fixture = common::init_local_repo(&[
        ("src/a.py", "import b\nprint('a')\n"),
        ("src/b.py", "x = 1\n"),
    ]);
    let repo_url = common::repo_url(&fixture);

    let mut config = AnalyzerConfig::default();
    config.work_dir_root = std::env::temp_dir()
        .join("codegraph-analyzer-test-degradation")
        .to_string_lossy()
        .to_string();
    config.per_run_deadline_secs = 30;
    let config = Arc::new(config);

    let provider = Arc::new(SelectiveProvider::new(
        "selective",
        vec!["detailed view".to_string()],
    ));
    let gateway = Arc::new(LlmGateway::new(vec![provider], &config));
    let store: Arc<dyn codegraph_orchestrator::PersistenceStore> = Arc::new(InMemoryStore::new());

    let service = AnalysisService::new(store, gateway, config);
    let started = service.start(&repo_url, false).await.expect("start run");

    let status = common::wait_for_terminal(&service, started.run_id).await;
    assert_eq!(status, RunStatus::Completed);

    let results = service.result(started.run_id).await.expect("load results");
    assert!(results.artifacts.mermaid_modules_detailed.is_empty());
    assert!(!results.artifacts.mermaid_modules_simple.is_empty());
    assert!(!results.artifacts.mermaid_modules_balanced.is_empty());
    assert!(!results.artifacts.architecture_md.is_empty());

    let has_detailed_quota_entry = results
        .error_log
        .iter()
        .any(|e| e.stage == "diagram:detailed" && e.kind == StageErrorKind::QuotaExhausted);
    assert!(
        has_detailed_quota_entry,
        "expected a quota_exhausted entry tagged diagram:detailed, got {:?}",
        results.error_log
    );

    // The degraded mode remains independently correctable afterward.
    let regenerated = service
        .generate_diagram(started.run_id, DiagramMode::Detailed)
        .await;
    assert!(regenerated.is_ok());
}
