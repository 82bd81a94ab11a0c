pub mod config;
pub mod error;
pub mod run;
pub mod types;

pub use config::AnalyzerConfig;
pub use error::{CodeGraphError, Result, StageError, StageErrorKind};
pub use run::AnalysisRun;
pub use types::*;
