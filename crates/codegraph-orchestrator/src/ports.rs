//! The two interfaces the service consumes. `LlmApi` is already defined by
//! `codegraph_ai::LlmProvider`/`LlmGateway`; this module adds the other one
//! the orchestrator owns, `PersistenceStore`, plus an in-memory fake used by
//! the seed tests.
use std::collections::HashMap;

use async_trait::async_trait;
use codegraph_core::{AnalysisResults, AnalysisRun, RunStatus};
use parking_lot::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transient storage error: {0}")]
    Transient(String),
    #[error("fatal storage error: {0}")]
    Fatal(String),
}

#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn create_run(&self, repo_url: &str) -> Result<AnalysisRun, StoreError>;
    async fn update_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        progress_label: Option<String>,
        reason: Option<String>,
        message: Option<String>,
    ) -> Result<(), StoreError>;
    async fn load_run(&self, run_id: Uuid) -> Result<Option<AnalysisRun>, StoreError>;
    /// Idempotent per run: a second call with the same `run_id` overwrites.
    async fn save_results(&self, run_id: Uuid, results: AnalysisResults) -> Result<(), StoreError>;
    async fn load_results(&self, run_id: Uuid) -> Result<Option<AnalysisResults>, StoreError>;
    async fn lookup_latest_by_url(&self, repo_url: &str) -> Result<Option<Uuid>, StoreError>;
}

/// An in-memory `PersistenceStore`, following the same convention as
/// `codegraph-ai::testing::ScriptedProvider`: a `parking_lot`-guarded fake
/// kept alongside the real trait for tests.
#[derive(Default)]
pub struct InMemoryStore {
    runs: Mutex<HashMap<Uuid, AnalysisRun>>,
    results: Mutex<HashMap<Uuid, AnalysisResults>>,
    by_url: Mutex<HashMap<String, Uuid>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceStore for InMemoryStore {
    async fn create_run(&self, repo_url: &str) -> Result<AnalysisRun, StoreError> {
        let run = AnalysisRun::new(repo_url);
        self.runs.lock().insert(run.id, run.clone());
        self.by_url.lock().insert(repo_url.to_string(), run.id);
        Ok(run)
    }

    async fn update_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        progress_label: Option<String>,
        reason: Option<String>,
        message: Option<String>,
    ) -> Result<(), StoreError> {
        let mut runs = self.runs.lock();
        let run = runs
            .get_mut(&run_id)
            .ok_or_else(|| StoreError::Fatal(format!("run {run_id} not found")))?;
        match status {
            RunStatus::Completed => run.complete(),
            RunStatus::Failed => run.fail(
                reason.unwrap_or_default(),
                message.unwrap_or_default(),
            ),
            _ => {
                run.enter_stage(progress_label.unwrap_or_else(|| "running".to_string()));
            }
        }
        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<AnalysisRun>, StoreError> {
        Ok(self.runs.lock().get(&run_id).cloned())
    }

    async fn save_results(&self, run_id: Uuid, results: AnalysisResults) -> Result<(), StoreError> {
        self.results.lock().insert(run_id, results);
        Ok(())
    }

    async fn load_results(&self, run_id: Uuid) -> Result<Option<AnalysisResults>, StoreError> {
        Ok(self.results.lock().get(&run_id).cloned())
    }

    async fn lookup_latest_by_url(&self, repo_url: &str) -> Result<Option<Uuid>, StoreError> {
        Ok(self.by_url.lock().get(repo_url).copied())
    }
}
