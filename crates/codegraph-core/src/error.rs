use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodeGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Repository fetch failed: {0}")]
    FetchFailed(String),

    #[error("File scan failed: {0}")]
    ScanFailed(String),

    #[error("Persistence error: {0}")]
    PersistenceFailed(String),

    #[error("LLM quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("LLM API error: {0}")]
    ApiError(String),

    #[error("LLM response shape error: {0}")]
    ShapeError(String),

    #[error("Run not found: {0}")]
    NotFound(String),

    #[error("Run not ready: {0}")]
    NotReady(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, CodeGraphError>;

/// The sentinel the workflow runner's classifier matches on. Stages are
/// categorized by this enum, never by message content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageErrorKind {
    FetchFailed,
    ScanFailed,
    PersistenceFailed,
    QuotaExhausted,
    /// A per-stage optional-artifact failure; the run still completes.
    Degraded,
    /// A transient error retried within the gateway; should never escape it.
    Transient,
    /// A programming error; the runner must not swallow these.
    Programming,
}

impl StageErrorKind {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StageErrorKind::FetchFailed
                | StageErrorKind::ScanFailed
                | StageErrorKind::PersistenceFailed
                | StageErrorKind::QuotaExhausted
        )
    }
}

/// One entry in a run's append-only error log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageError {
    pub stage: String,
    pub kind: StageErrorKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl StageError {
    pub fn new(stage: impl Into<String>, kind: StageErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            kind,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

impl From<&CodeGraphError> for StageErrorKind {
    fn from(err: &CodeGraphError) -> Self {
        match err {
            CodeGraphError::FetchFailed(_) => StageErrorKind::FetchFailed,
            CodeGraphError::ScanFailed(_) => StageErrorKind::ScanFailed,
            CodeGraphError::PersistenceFailed(_) => StageErrorKind::PersistenceFailed,
            CodeGraphError::QuotaExhausted(_) => StageErrorKind::QuotaExhausted,
            CodeGraphError::ApiError(_) | CodeGraphError::ShapeError(_) => {
                StageErrorKind::Degraded
            }
            CodeGraphError::Io(_) | CodeGraphError::Serialization(_) => StageErrorKind::Degraded,
            CodeGraphError::NotFound(_)
            | CodeGraphError::NotReady(_)
            | CodeGraphError::InvalidOperation(_) => StageErrorKind::Programming,
        }
    }
}
