use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::RunStatus;

/// Identity and lifecycle record for one analysis invocation. Mutated by the
/// workflow runner as it enters each stage and at terminal outcome; read by
/// ingress for polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub id: Uuid,
    pub repo_url: String,
    pub commit_sha: Option<String>,
    pub status: RunStatus,
    pub progress_label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub failure_reason: Option<String>,
    pub failure_message: Option<String>,
}

impl AnalysisRun {
    pub fn new(repo_url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            repo_url: repo_url.into(),
            commit_sha: None,
            status: RunStatus::Pending,
            progress_label: "queued".to_string(),
            created_at: now,
            updated_at: now,
            failure_reason: None,
            failure_message: None,
        }
    }

    /// Moves the run into a new non-terminal status. No-op (returns false) if
    /// the run is already terminal: once `Completed` or `Failed`, a run never
    /// changes status again.
    pub fn enter_stage(&mut self, label: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = RunStatus::Started;
        self.progress_label = label.into();
        self.updated_at = Utc::now();
        true
    }

    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
        self.progress_label = "completed".to_string();
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self, reason: impl Into<String>, message: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.failure_message = Some(message.into());
        self.updated_at = Utc::now();
    }
}
