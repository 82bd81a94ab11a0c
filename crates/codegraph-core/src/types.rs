use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::StageError;

/// One of the two language families the analyzer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
}

impl Language {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" => Some(Language::Python),
            "ts" | "tsx" => Some(Language::TypeScript),
            "js" | "jsx" => Some(Language::JavaScript),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
        }
    }
}

/// A file kept by the scanner. Paths are repository-relative, forward-slash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub extension: String,
    pub language: Language,
    pub line_count: usize,
    /// First ~1,400 characters of content, used for prompt excerpts.
    pub excerpt: String,
}

/// Which parser produced an edge; diagnostic only, never used for semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractorTag {
    PythonPrimary,
    PythonFallback,
    TsJsPrimary,
    TsJsFallback,
}

/// An import relationship. When `internal` is true, `destination` is a
/// repository-relative file path present in the file-record set; otherwise
/// `destination` is the raw import specifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub destination: String,
    pub internal: bool,
    pub extractor: ExtractorTag,
}

impl Edge {
    /// Identity used for deduplication: extractor tag is diagnostic only.
    pub fn dedup_key(&self) -> (String, String, bool) {
        (self.source.clone(), self.destination.clone(), self.internal)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GraphNode {
    pub path: String,
    pub language: Language,
    pub line_count: usize,
    pub fan_in: usize,
    pub fan_out: usize,
    pub degree_centrality: f64,
}

impl Default for Language {
    fn default() -> Self {
        Language::Python
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdgeRecord {
    pub source: String,
    pub destination: String,
}

/// The directed internal dependency graph plus per-node metrics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdgeRecord>,
}

/// Top-N files ranked by fan-in + fan-out, ties broken lexicographically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentralFile {
    pub path: String,
    pub fan_in: usize,
    pub fan_out: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalPackageUse {
    pub source_file: String,
    pub package: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DependencyAnalysis {
    pub internal_edges: Vec<GraphEdgeRecord>,
    /// category name -> uses
    pub external_groups: HashMap<String, Vec<ExternalPackageUse>>,
    pub internal_count: usize,
    pub external_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    pub purpose: String,
    pub key_files: Vec<KeyFile>,
    pub apis: Vec<NamedApi>,
    pub depends_on: Vec<String>,
    pub risks: Vec<String>,
    pub test_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyFile {
    pub path: String,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedApi {
    pub name: String,
    pub owning_file: String,
}

/// The four diagram modes. `FolderStructure` is deterministic (no LLM call).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagramMode {
    Overview,
    Balanced,
    Detailed,
    FolderStructure,
}

impl DiagramMode {
    /// (max nodes, max edges) for this mode. `FolderStructure` has no LLM
    /// budget since it is built deterministically.
    pub fn complexity_budget(&self) -> Option<(usize, usize)> {
        match self {
            DiagramMode::Overview => Some((20, 25)),
            DiagramMode::Balanced => Some((50, 75)),
            DiagramMode::Detailed => Some((100, 150)),
            DiagramMode::FolderStructure => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DiagramMode::Overview => "overview",
            DiagramMode::Balanced => "balanced",
            DiagramMode::Detailed => "detailed",
            DiagramMode::FolderStructure => "folders",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TokenBudget {
    pub embed_calls: usize,
    pub gen_calls: usize,
    pub chunks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoInfo {
    pub url: String,
    pub commit_sha: String,
}

/// The terminal status of an analysis run. Once `Completed` or `Failed` it is
/// terminal: no further status transition is ever recorded afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Started,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// The persisted artifact shape returned by `result()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResults {
    pub status: RunStatus,
    pub repo: RepoInfo,
    pub language_stats: HashMap<String, f64>,
    pub loc_total: usize,
    pub file_count: usize,
    pub central_files: Vec<CentralFile>,
    pub graph: DependencyGraph,
    pub dependency_analysis: DependencyAnalysis,
    pub components: Vec<ComponentRecord>,
    pub artifacts: Artifacts,
    pub token_budget: TokenBudget,
    /// Non-fatal issues recorded while producing this run's artifacts,
    /// surfaced to callers as warnings rather than a run failure.
    pub error_log: Vec<StageError>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Artifacts {
    pub architecture_md: String,
    pub mermaid_modules: String,
    pub mermaid_modules_simple: String,
    pub mermaid_modules_balanced: String,
    pub mermaid_modules_detailed: String,
    pub mermaid_folders: String,
}
