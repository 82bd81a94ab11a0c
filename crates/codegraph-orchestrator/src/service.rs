use std::sync::Arc;

use codegraph_ai::LlmGateway;
use codegraph_core::{AnalysisResults, AnalyzerConfig, CodeGraphError, DiagramMode, RunStatus};
use codegraph_diagram::{correct_diagram, DiagramState};
use tracing::info;
use uuid::Uuid;

use crate::ports::PersistenceStore;
use crate::runner;

/// The public surface described by the exposed analysis service: `start`,
/// `status`, `result`, `generate_diagram`, `correct_diagram`.
pub struct AnalysisService {
    store: Arc<dyn PersistenceStore>,
    gateway: Arc<LlmGateway>,
    config: Arc<AnalyzerConfig>,
}

pub struct StartOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub cached_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl AnalysisService {
    pub fn new(store: Arc<dyn PersistenceStore>, gateway: Arc<LlmGateway>, config: Arc<AnalyzerConfig>) -> Self {
        Self { store, gateway, config }
    }

    /// Starts a new analysis, or returns the cached run for `repo_url` when
    /// one has already completed and `force_refresh` is false. No new
    /// workspace is acquired and no LLM calls are issued on a cache hit.
    pub async fn start(&self, repo_url: &str, force_refresh: bool) -> Result<StartOutcome, CodeGraphError> {
        if !force_refresh {
            if let Some(run_id) = self
                .store
                .lookup_latest_by_url(repo_url)
                .await
                .map_err(|e| CodeGraphError::PersistenceFailed(e.to_string()))?
            {
                if let Some(run) = self
                    .store
                    .load_run(run_id)
                    .await
                    .map_err(|e| CodeGraphError::PersistenceFailed(e.to_string()))?
                {
                    if run.status == RunStatus::Completed {
                        return Ok(StartOutcome {
                            run_id,
                            status: RunStatus::Completed,
                            cached_at: Some(run.updated_at),
                        });
                    }
                }
            }
        }

        let run = self
            .store
            .create_run(repo_url)
            .await
            .map_err(|e| CodeGraphError::PersistenceFailed(e.to_string()))?;

        info!(run_id = %run.id, repo_url, "scheduling analysis run");
        tokio::spawn(runner::execute(
            run.id,
            repo_url.to_string(),
            self.config.clone(),
            self.gateway.clone(),
            self.store.clone(),
        ));

        Ok(StartOutcome {
            run_id: run.id,
            status: RunStatus::Pending,
            cached_at: None,
        })
    }

    pub async fn status(
        &self,
        run_id: Uuid,
    ) -> Result<(RunStatus, Option<String>, Option<String>), CodeGraphError> {
        let run = self
            .store
            .load_run(run_id)
            .await
            .map_err(|e| CodeGraphError::PersistenceFailed(e.to_string()))?
            .ok_or_else(|| CodeGraphError::NotFound(run_id.to_string()))?;
        Ok((run.status, Some(run.progress_label), run.failure_message))
    }

    pub async fn result(&self, run_id: Uuid) -> Result<AnalysisResults, CodeGraphError> {
        let run = self
            .store
            .load_run(run_id)
            .await
            .map_err(|e| CodeGraphError::PersistenceFailed(e.to_string()))?
            .ok_or_else(|| CodeGraphError::NotFound(run_id.to_string()))?;
        if run.status != RunStatus::Completed {
            return Err(CodeGraphError::NotReady(run_id.to_string()));
        }
        self.store
            .load_results(run_id)
            .await
            .map_err(|e| CodeGraphError::PersistenceFailed(e.to_string()))?
            .ok_or_else(|| CodeGraphError::NotReady(run_id.to_string()))
    }

    /// Runs one instance of the diagram self-correction loop using the
    /// already-stored analysis data; idempotent per `(run_id, mode)` once a
    /// non-empty result is stored.
    pub async fn generate_diagram(&self, run_id: Uuid, mode: DiagramMode) -> Result<String, CodeGraphError> {
        let mut results = self.result(run_id).await?;
        if let Some(existing) = artifact_for(&results, mode) {
            if !existing.is_empty() {
                return Ok(existing.to_string());
            }
        }

        let generator = codegraph_ai::ContentGenerator::new(&self.gateway);
        let outcome = codegraph_diagram::produce_diagram(
            &generator,
            &self.gateway,
            mode,
            &results.dependency_analysis,
            &results.graph,
            &results.artifacts.architecture_md,
            self.config.diagram.max_attempts,
        )
        .await;

        set_artifact(&mut results, mode, outcome.diagram.clone());
        self.store
            .save_results(run_id, results)
            .await
            .map_err(|e| CodeGraphError::PersistenceFailed(e.to_string()))?;

        if outcome.state == DiagramState::Exhausted {
            tracing::warn!(%run_id, mode = mode.label(), "diagram generation exhausted its repair budget");
        }
        Ok(outcome.diagram)
    }

    /// Feeds `broken_code` directly into the self-correction loop's
    /// validate/repair steps, bypassing initial generation. `error_message`
    /// is carried only for observability; the loop re-derives its own
    /// findings from the candidate.
    pub async fn correct_diagram(
        &self,
        run_id: Uuid,
        mode: DiagramMode,
        broken_code: String,
        error_message: &str,
    ) -> Result<String, CodeGraphError> {
        let mut results = self.result(run_id).await?;
        tracing::info!(%run_id, mode = mode.label(), error_message, "correcting supplied diagram candidate");

        let outcome = correct_diagram(
            &self.gateway,
            mode,
            &results.graph,
            broken_code,
            self.config.diagram.max_attempts,
        )
        .await;

        set_artifact(&mut results, mode, outcome.diagram.clone());
        self.store
            .save_results(run_id, results)
            .await
            .map_err(|e| CodeGraphError::PersistenceFailed(e.to_string()))?;

        Ok(outcome.diagram)
    }
}

fn artifact_for(results: &AnalysisResults, mode: DiagramMode) -> Option<&str> {
    Some(match mode {
        DiagramMode::Overview => results.artifacts.mermaid_modules_simple.as_str(),
        DiagramMode::Balanced => results.artifacts.mermaid_modules_balanced.as_str(),
        DiagramMode::Detailed => results.artifacts.mermaid_modules_detailed.as_str(),
        DiagramMode::FolderStructure => results.artifacts.mermaid_folders.as_str(),
    })
}

fn set_artifact(results: &mut AnalysisResults, mode: DiagramMode, diagram: String) {
    match mode {
        DiagramMode::Overview => results.artifacts.mermaid_modules_simple = diagram,
        DiagramMode::Balanced => {
            results.artifacts.mermaid_modules = diagram.clone();
            results.artifacts.mermaid_modules_balanced = diagram;
        }
        DiagramMode::Detailed => results.artifacts.mermaid_modules_detailed = diagram,
        DiagramMode::FolderStructure => results.artifacts.mermaid_folders = diagram,
    }
}
