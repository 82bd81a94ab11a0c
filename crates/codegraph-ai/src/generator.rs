use codegraph_core::{
    CentralFile, ComponentRecord, DependencyAnalysis, DependencyGraph, DiagramMode, FileRecord,
};
use serde::Deserialize;
use serde_json::json;

use crate::gateway::{GatewayError, LlmGateway};

/// Assembles the three LLM-backed prompt kinds and parses their responses.
pub struct ContentGenerator<'a> {
    gateway: &'a LlmGateway,
}

impl<'a> ContentGenerator<'a> {
    pub fn new(gateway: &'a LlmGateway) -> Self {
        Self { gateway }
    }

    /// From language stats, the top-N file list, and diverse excerpts from
    /// the most central files, produces a markdown overview. Excerpts are
    /// truncated to `excerpt_budget` total characters.
    pub async fn narrative(
        &self,
        language_stats: &std::collections::HashMap<String, f64>,
        central_files: &[CentralFile],
        files_by_path: &std::collections::HashMap<String, &FileRecord>,
        excerpt_budget: usize,
    ) -> Result<String, GatewayError> {
        if central_files.is_empty() {
            return Ok("No supported files were found in this repository.".to_string());
        }

        let mut excerpts = String::new();
        let mut used = 0usize;
        for central in central_files {
            if used >= excerpt_budget {
                break;
            }
            let Some(file) = files_by_path.get(&central.path) else {
                continue;
            };
            let remaining = excerpt_budget - used;
            let slice: String = file.excerpt.chars().take(remaining).collect();
            used += slice.chars().count();
            excerpts.push_str(&format!("\n### {}\n```\n{}\n```\n", central.path, slice));
        }

        let stats_summary: String = language_stats
            .iter()
            .map(|(lang, pct)| format!("{lang}: {pct:.1}%"))
            .collect::<Vec<_>>()
            .join(", ");

        let prompt = format!(
            "You are documenting a software repository's architecture.\n\
             Language breakdown: {stats_summary}\n\
             Most central files (by fan-in + fan-out): {top_files}\n\
             Representative excerpts:{excerpts}\n\n\
             Write a concise markdown architecture overview.",
            top_files = central_files
                .iter()
                .map(|c| c.path.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );

        self.gateway.generate_markdown(&prompt).await
    }

    /// From the top-N files (bounded to `component_count`), produces a list
    /// of component records. The request declares the structured shape.
    pub async fn components(
        &self,
        central_files: &[CentralFile],
        files_by_path: &std::collections::HashMap<String, &FileRecord>,
        component_count: usize,
    ) -> Result<Vec<ComponentRecord>, GatewayError> {
        if central_files.is_empty() {
            return Ok(Vec::new());
        }

        let selected: Vec<&CentralFile> = central_files.iter().take(component_count).collect();
        let file_list = selected
            .iter()
            .map(|c| {
                let excerpt = files_by_path
                    .get(&c.path)
                    .map(|f| f.excerpt.as_str())
                    .unwrap_or_default();
                format!("- {} (fan-in {}, fan-out {}):\n{}", c.path, c.fan_in, c.fan_out, excerpt)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Identify up to {component_count} architectural components from these files.\n\
             Respond as a JSON array matching the declared schema, nothing else.\n\n{file_list}"
        );

        let shape = component_list_shape();

        #[derive(Deserialize)]
        struct Wrapper {
            components: Vec<ComponentRecord>,
        }

        match self
            .gateway
            .generate_structured::<Wrapper>(&prompt, shape)
            .await
        {
            Ok(wrapper) => Ok(wrapper.components),
            Err(GatewayError::ShapeError(_)) => {
                // Degrading failure: an empty component list lets the run
                // complete.
                Ok(Vec::new())
            }
            Err(other) => Err(other),
        }
    }

    /// From the dependency analysis, the graph, and the narrative, produces
    /// a single Mermaid flowchart for `mode`, honoring its complexity
    /// budget.
    pub async fn diagram(
        &self,
        mode: DiagramMode,
        dependency_analysis: &DependencyAnalysis,
        graph: &DependencyGraph,
        narrative: &str,
    ) -> Result<String, GatewayError> {
        let (max_nodes, max_edges) = mode.complexity_budget().unwrap_or((50, 75));
        let edges_preview = dependency_analysis
            .internal_edges
            .iter()
            .take(max_edges.min(60))
            .map(|e| format!("{} --> {}", e.source, e.destination))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Generate a Mermaid flowchart (`flowchart LR` or `flowchart TD`) for the \
             {mode_label} view of this codebase's internal dependencies.\n\
             Budget: at most {max_nodes} nodes and {max_edges} edges.\n\
             Architecture summary:\n{narrative}\n\n\
             Known internal edges ({node_count} files total):\n{edges_preview}\n\n\
             Respond with a fenced ```mermaid code block containing only the diagram.",
            mode_label = mode.label(),
            node_count = graph.nodes.len(),
        );

        self.gateway.generate_mermaid(&prompt).await
    }
}

fn component_list_shape() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "components": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "purpose": { "type": "string" },
                        "key_files": { "type": "array" },
                        "apis": { "type": "array" },
                        "depends_on": { "type": "array", "items": { "type": "string" } },
                        "risks": { "type": "array", "items": { "type": "string" } },
                        "test_files": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["name", "purpose"]
                }
            }
        },
        "required": ["components"]
    })
}
