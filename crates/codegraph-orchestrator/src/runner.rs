use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use codegraph_ai::{ContentGenerator, GatewayError, LlmGateway};
use codegraph_core::{
    AnalysisResults, AnalyzerConfig, Artifacts, CentralFile, CodeGraphError, ComponentRecord,
    DependencyAnalysis, DependencyGraph, DiagramMode, FileRecord, RunStatus, StageError,
    StageErrorKind,
};
use codegraph_diagram::{produce_diagram, DiagramState};
use codegraph_git::shallow_clone;
use codegraph_graph::{build_graph, classify, folder_diagram, top_n};
use codegraph_parser::{extract_all, scan_repository};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ports::PersistenceStore;

/// Runs the full staged workflow (S1 static prelude, S2 narrative, S3
/// parallel fan-out, S4 finalize) for one run and persists the outcome.
pub async fn execute(
    run_id: Uuid,
    repo_url: String,
    config: Arc<AnalyzerConfig>,
    gateway: Arc<LlmGateway>,
    store: Arc<dyn PersistenceStore>,
) {
    let _ = store
        .update_status(run_id, RunStatus::Started, Some("cloning".to_string()), None, None)
        .await;

    match run_workflow(run_id, &repo_url, &config, gateway, &store).await {
        Ok(results) => {
            let _ = store.save_results(run_id, results).await;
            let _ = store
                .update_status(run_id, RunStatus::Completed, Some("completed".to_string()), None, None)
                .await;
        }
        Err(err) => {
            warn!(%run_id, %err, "run failed");
            let reason = fatal_reason(&err);
            let _ = store
                .update_status(run_id, RunStatus::Failed, None, Some(reason.to_string()), Some(err.to_string()))
                .await;
        }
    }
}

fn fatal_reason(err: &CodeGraphError) -> &'static str {
    match StageErrorKind::from(err) {
        StageErrorKind::FetchFailed => "fetch_failed",
        StageErrorKind::ScanFailed => "scan_failed",
        StageErrorKind::PersistenceFailed => "persistence_failed",
        StageErrorKind::QuotaExhausted => "quota_exhausted",
        _ => "failed",
    }
}

async fn run_workflow(
    run_id: Uuid,
    repo_url: &str,
    config: &AnalyzerConfig,
    gateway: Arc<LlmGateway>,
    store: &Arc<dyn PersistenceStore>,
) -> Result<AnalysisResults, CodeGraphError> {
    let mut error_log: Vec<StageError> = Vec::new();

    // S1: static prelude. The workspace directory is released when
    // `snapshot` drops at the end of this function's scope, on every exit
    // path including the early `?` returns below.
    let snapshot = shallow_clone(repo_url, std::path::Path::new(&config.work_dir_root))
        .map_err(|e| CodeGraphError::FetchFailed(e.to_string()))?;

    let _ = store
        .update_status(run_id, RunStatus::Started, Some("scanning".to_string()), None, None)
        .await;
    let scan = scan_repository(snapshot.path(), config)
        .map_err(|e| CodeGraphError::ScanFailed(e.to_string()))?;

    let edges = extract_all(snapshot.path(), &scan.files);
    let graph = build_graph(&scan.files, &edges);
    let dependency_analysis = classify(&edges);
    let central_files = top_n(&graph, config.top_n);
    let folders_diagram =
        folder_diagram(&scan.files.iter().map(|f| f.path.clone()).collect::<Vec<_>>());

    let files_by_path: HashMap<String, &FileRecord> =
        scan.files.iter().map(|f| (f.path.clone(), f)).collect();

    // S2: narrative. Strictly precedes every S3 subtask; total quota
    // exhaustion here is fatal since every downstream prompt embeds it.
    let _ = store
        .update_status(run_id, RunStatus::Started, Some("narrative".to_string()), None, None)
        .await;
    let generator = ContentGenerator::new(&gateway);
    let narrative = match generator
        .narrative(
            &scan.language_stats,
            &central_files,
            &files_by_path,
            config.excerpt_char_budget,
        )
        .await
    {
        Ok(text) => text,
        Err(GatewayError::QuotaExhausted) => {
            return Err(CodeGraphError::QuotaExhausted("narrative".to_string()));
        }
        Err(other) => {
            warn!(%run_id, %other, "narrative generation degraded");
            error_log.push(StageError::new(
                "narrative",
                StageErrorKind::Degraded,
                other.to_string(),
            ));
            String::new()
        }
    };

    // S3: parallel fan-out over components and the three LLM-backed diagram
    // modes, each independent and writing disjoint outputs. A per-run
    // deadline races the join against a cooperative cancellation token.
    let _ = store
        .update_status(
            run_id,
            RunStatus::Started,
            Some("components_and_diagrams".to_string()),
            None,
            None,
        )
        .await;
    let deadline = Duration::from_secs(config.per_run_deadline_secs);
    let start = Instant::now();

    let (components, diagrams, fanout_errors, timed_out) = run_fanout(
        gateway.clone(),
        config.component_count,
        config.diagram.max_attempts,
        dependency_analysis.clone(),
        graph.clone(),
        narrative.clone(),
        central_files.clone(),
        scan.files.clone(),
        deadline,
        start,
    )
    .await;
    error_log.extend(fanout_errors);
    if timed_out {
        error_log.push(StageError::new(
            "run",
            StageErrorKind::Degraded,
            "per-run deadline exceeded; outstanding subtasks cancelled",
        ));
    }

    // S4: finalize. Runs regardless of how S3 concluded.
    let artifacts = Artifacts {
        architecture_md: narrative,
        mermaid_modules: diagrams.get(&DiagramMode::Balanced).cloned().unwrap_or_default(),
        mermaid_modules_simple: diagrams.get(&DiagramMode::Overview).cloned().unwrap_or_default(),
        mermaid_modules_balanced: diagrams.get(&DiagramMode::Balanced).cloned().unwrap_or_default(),
        mermaid_modules_detailed: diagrams.get(&DiagramMode::Detailed).cloned().unwrap_or_default(),
        mermaid_folders: folders_diagram,
    };

    info!(%run_id, errors = error_log.len(), "workflow finalized");

    Ok(AnalysisResults {
        status: RunStatus::Completed,
        repo: codegraph_core::RepoInfo {
            url: repo_url.to_string(),
            commit_sha: snapshot.commit_sha().to_string(),
        },
        language_stats: scan.language_stats,
        loc_total: scan.loc_total,
        file_count: scan.files.len(),
        central_files,
        graph,
        dependency_analysis,
        components,
        artifacts,
        token_budget: Default::default(),
        error_log,
    })
}

enum SubtaskOutcome {
    Components(Result<Vec<ComponentRecord>, GatewayError>),
    Diagram(DiagramMode, String, DiagramState),
}

#[allow(clippy::too_many_arguments)]
async fn run_fanout(
    gateway: Arc<LlmGateway>,
    component_count: usize,
    max_attempts: u32,
    dependency_analysis: DependencyAnalysis,
    graph: DependencyGraph,
    narrative: String,
    central_files: Vec<CentralFile>,
    files: Vec<FileRecord>,
    deadline: Duration,
    start: Instant,
) -> (Vec<ComponentRecord>, HashMap<DiagramMode, String>, Vec<StageError>, bool) {
    let cancellation = CancellationToken::new();
    let mut join_set: JoinSet<SubtaskOutcome> = JoinSet::new();

    // S3a: components.
    {
        let gateway = gateway.clone();
        let central_files = central_files.clone();
        let files = files.clone();
        let cancel = cancellation.clone();
        join_set.spawn(async move {
            if cancel.is_cancelled() {
                return SubtaskOutcome::Components(Ok(Vec::new()));
            }
            let files_by_path: HashMap<String, &FileRecord> =
                files.iter().map(|f| (f.path.clone(), f)).collect();
            let generator = ContentGenerator::new(&gateway);
            let result = generator
                .components(&central_files, &files_by_path, component_count)
                .await;
            SubtaskOutcome::Components(result)
        });
    }

    // S3b/c/d: one diagram mode each.
    for mode in [DiagramMode::Overview, DiagramMode::Balanced, DiagramMode::Detailed] {
        let gateway = gateway.clone();
        let dependency_analysis = dependency_analysis.clone();
        let graph = graph.clone();
        let narrative = narrative.clone();
        let cancel = cancellation.clone();
        join_set.spawn(async move {
            if cancel.is_cancelled() {
                return SubtaskOutcome::Diagram(mode, String::new(), DiagramState::Exhausted);
            }
            let generator = ContentGenerator::new(&gateway);
            let outcome = produce_diagram(
                &generator,
                &gateway,
                mode,
                &dependency_analysis,
                &graph,
                &narrative,
                max_attempts,
            )
            .await;
            SubtaskOutcome::Diagram(mode, outcome.diagram, outcome.state)
        });
    }

    let mut components = Vec::new();
    let mut diagrams = HashMap::new();
    let mut errors = Vec::new();
    let mut timed_out = false;

    let sleep = tokio::time::sleep(deadline.saturating_sub(start.elapsed()));
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => {
                cancellation.cancel();
                timed_out = true;
                break;
            }
            next = join_set.join_next() => {
                match next {
                    Some(Ok(SubtaskOutcome::Components(Ok(list)))) => components = list,
                    Some(Ok(SubtaskOutcome::Components(Err(GatewayError::QuotaExhausted)))) => {
                        errors.push(StageError::new("components", StageErrorKind::QuotaExhausted, "quota exhausted"));
                    }
                    Some(Ok(SubtaskOutcome::Components(Err(other)))) => {
                        errors.push(StageError::new("components", StageErrorKind::Degraded, other.to_string()));
                    }
                    Some(Ok(SubtaskOutcome::Diagram(mode, text, DiagramState::Valid))) => {
                        diagrams.insert(mode, text);
                    }
                    Some(Ok(SubtaskOutcome::Diagram(mode, text, DiagramState::Exhausted))) => {
                        if !text.is_empty() {
                            diagrams.insert(mode, text);
                        }
                        errors.push(StageError::new(
                            format!("diagram:{}", mode.label()),
                            StageErrorKind::QuotaExhausted,
                            "diagram self-correction exhausted its attempts",
                        ));
                    }
                    Some(Err(join_err)) => {
                        errors.push(StageError::new("fanout", StageErrorKind::Programming, join_err.to_string()));
                    }
                    None => break,
                }
            }
        }
    }

    (components, diagrams, errors, timed_out)
}
