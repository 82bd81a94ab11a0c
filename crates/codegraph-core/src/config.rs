use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Node/edge budget for a generated diagram mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct ComplexityBudget {
    pub max_nodes: usize,
    pub max_edges: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiagramConfig {
    pub max_attempts: u32,
    pub overview: ComplexityBudget,
    pub balanced: ComplexityBudget,
    pub detailed: ComplexityBudget,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            overview: ComplexityBudget {
                max_nodes: 20,
                max_edges: 25,
            },
            balanced: ComplexityBudget {
                max_nodes: 50,
                max_edges: 75,
            },
            detailed: ComplexityBudget {
                max_nodes: 100,
                max_edges: 150,
            },
        }
    }
}

/// Gateway retry policy: K attempts per model, uniform backoff in
/// `[retry_wait_min_secs, retry_wait_max_secs]`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RetryConfig {
    pub attempts_per_model: u32,
    pub retry_wait_min_secs: u64,
    pub retry_wait_max_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts_per_model: 3,
            retry_wait_min_secs: 1,
            retry_wait_max_secs: 5,
        }
    }
}

/// Process-wide configuration, loaded via the `config` crate layered over
/// defaults and `CODEGRAPH_*` environment overrides.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzerConfig {
    /// Ordered list of models to try; first is preferred.
    pub model_fallback_chain: Vec<String>,
    pub retry: RetryConfig,
    pub per_call_deadline_secs: u64,
    pub per_run_deadline_secs: u64,
    pub diagram: DiagramConfig,
    pub top_n: usize,
    pub component_count: usize,
    #[schemars(skip)]
    pub supported_extensions: HashSet<String>,
    pub excluded_directories: Vec<String>,
    pub work_dir_root: String,
    pub excerpt_char_budget: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model_fallback_chain: vec![
                "claude-sonnet".to_string(),
                "claude-haiku".to_string(),
                "gpt-4o-mini".to_string(),
            ],
            retry: RetryConfig::default(),
            per_call_deadline_secs: 60,
            per_run_deadline_secs: 300,
            diagram: DiagramConfig::default(),
            top_n: 40,
            component_count: 8,
            supported_extensions: ["py", "ts", "tsx", "js", "jsx"]
                .into_iter()
                .map(String::from)
                .collect(),
            excluded_directories: vec![
                "node_modules".to_string(),
                "target".to_string(),
                "dist".to_string(),
                "build".to_string(),
                ".git".to_string(),
                ".next".to_string(),
                ".nuxt".to_string(),
                "coverage".to_string(),
                "__pycache__".to_string(),
                ".pytest_cache".to_string(),
                "venv".to_string(),
                ".venv".to_string(),
            ],
            work_dir_root: std::env::temp_dir()
                .join("codegraph-analyzer")
                .to_string_lossy()
                .to_string(),
            excerpt_char_budget: 1_400,
        }
    }
}

impl AnalyzerConfig {
    /// Load defaults, then layer a config file (if present) and
    /// `CODEGRAPH_*`-prefixed environment variables on top, following the
    /// teacher's `config`-crate layering convention in `codegraph-core::config`.
    pub fn load() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let figment = config::Config::builder()
            .add_source(config::Config::try_from(&defaults)?)
            .add_source(config::File::with_name("codegraph-analyzer").required(false))
            .add_source(config::Environment::with_prefix("CODEGRAPH").separator("__"))
            .build()?;
        Ok(figment.try_deserialize().unwrap_or(defaults))
    }
}
