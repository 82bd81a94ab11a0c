mod common;

use std::sync::Arc;
use std::time::Duration;

use codegraph_ai::testing::SlowProvider;
use codegraph_ai::LlmGateway;
use codegraph_core::{AnalyzerConfig, RunStatus, StageErrorKind};
use codegraph_orchestrator::{AnalysisService, InMemoryStore};

/// A per-run deadline far shorter than the configured model latency forces
/// the S3 fan-out to be cancelled partway through. The run still reaches a
/// terminal, completed status (finalize always runs), with a degraded-run
/// log entry recording the deadline expiry, and the scoped work directory is
/// removed either way since `shallow_clone`'s `RepoSnapshot` cleans up on
/// drop regardless of how the rest of the workflow concluded.
#[tokio::test]
async fn run_past_its_deadline_completes_with_a_timeout_log_entry() {
    let fixture = common::init_local_repo(&[
        ("src/a.py", "import b\nprint('a')\n"),
        ("src/b.py", "x = 1\n"),
    ]);
    let repo_url = common::repo_url(&fixture);
    let work_root = std::env::temp_dir().join("codegraph-analyzer-test-cancellation");

    let mut config = AnalyzerConfig::default();
    config.work_dir_root = work_root.to_string_lossy().to_string();
    // Shorter than the provider's per-call delay below, so S3 never finishes
    // before the deadline fires.
    config.per_run_deadline_secs = 1;
    config.per_call_deadline_secs = 30;
    config.retry.attempts_per_model = 1;
    let config = Arc::new(config);

    let provider = Arc::new(SlowProvider::new(
        "slow",
        Duration::from_secs(5),
        "## Architecture\nstub",
    ));
    let gateway = Arc::new(LlmGateway::new(vec![provider], &config));
    let store: Arc<dyn codegraph_orchestrator::PersistenceStore> = Arc::new(InMemoryStore::new());

    let service = AnalysisService::new(store, gateway, config);
    let started = service.start(&repo_url, false).await.expect("start run");

    let status = common::wait_for_terminal(&service, started.run_id).await;
    assert_eq!(status, RunStatus::Completed);

    let results = service.result(started.run_id).await.expect("load results");
    let has_deadline_entry = results
        .error_log
        .iter()
        .any(|e| e.stage == "run" && e.kind == StageErrorKind::Degraded);
    assert!(
        has_deadline_entry,
        "expected a degraded run-level entry for the expired deadline, got {:?}",
        results.error_log
    );

    // Whatever diagrams the fan-out did not finish in time are left empty
    // rather than blocking the run; the deterministic folder diagram never
    // depends on the gateway and is always present.
    assert!(!results.artifacts.mermaid_folders.is_empty());
}
