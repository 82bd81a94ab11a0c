use codegraph_ai::{ContentGenerator, GatewayError, LlmGateway};
use codegraph_core::{DependencyAnalysis, DependencyGraph, DiagramMode};
use tracing::{info, warn};

use crate::repairer::repair;
use crate::validator::{has_errors, validate, Finding};

/// Where a diagram candidate sits in the self-correction loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramState {
    Valid,
    Exhausted,
}

pub struct DiagramOutcome {
    pub diagram: String,
    pub state: DiagramState,
    pub attempts_used: u32,
}

/// Generates a fresh diagram candidate and runs it through the
/// self-correction loop.
pub async fn produce_diagram(
    generator: &ContentGenerator<'_>,
    gateway: &LlmGateway,
    mode: DiagramMode,
    dependency_analysis: &DependencyAnalysis,
    graph: &DependencyGraph,
    narrative: &str,
    max_attempts: u32,
) -> DiagramOutcome {
    let candidate = match generator
        .diagram(mode, dependency_analysis, graph, narrative)
        .await
    {
        Ok(text) => text,
        Err(err) => {
            warn!(mode = mode.label(), %err, "diagram generation failed, using deterministic fallback");
            return DiagramOutcome {
                diagram: fallback_diagram(dependency_analysis),
                state: DiagramState::Exhausted,
                attempts_used: 0,
            };
        }
    };

    correct_diagram(gateway, mode, graph, candidate, max_attempts).await
}

/// Feeds an already-produced candidate straight into the validate/repair
/// loop, bypassing generation. Used both as the tail of `produce_diagram`
/// and directly by the service's correction entry point: a caller can supply
/// a broken diagram plus an external error message and have it run through
/// the same bounded repair machinery.
pub async fn correct_diagram(
    gateway: &LlmGateway,
    mode: DiagramMode,
    graph: &DependencyGraph,
    candidate: String,
    max_attempts: u32,
) -> DiagramOutcome {
    let (max_nodes, max_edges) = mode.complexity_budget().unzip();
    let centrality = centrality_lookup(graph);

    let mut candidate = candidate;
    let mut findings = validate(&candidate, max_nodes, max_edges);
    if !has_errors(&findings) {
        return DiagramOutcome {
            diagram: candidate,
            state: DiagramState::Valid,
            attempts_used: 0,
        };
    }

    candidate = repair(&candidate, &findings, &centrality);
    findings = validate(&candidate, max_nodes, max_edges);
    if !has_errors(&findings) {
        return DiagramOutcome {
            diagram: candidate,
            state: DiagramState::Valid,
            attempts_used: 0,
        };
    }

    let llm_attempts = max_attempts.saturating_sub(1);
    for attempt in 1..=llm_attempts {
        match llm_repair(gateway, &candidate, &findings).await {
            Ok(repaired) => candidate = repaired,
            Err(GatewayError::QuotaExhausted) => {
                warn!(mode = mode.label(), attempt, "LLM repair exhausted quota, stopping early");
                break;
            }
            Err(err) => {
                warn!(mode = mode.label(), attempt, %err, "LLM repair call failed");
                break;
            }
        }

        candidate = repair(&candidate, &findings, &centrality);
        findings = validate(&candidate, max_nodes, max_edges);
        if !has_errors(&findings) {
            info!(mode = mode.label(), attempt, "diagram repaired to valid state");
            return DiagramOutcome {
                diagram: candidate,
                state: DiagramState::Valid,
                attempts_used: attempt,
            };
        }
    }

    warn!(
        mode = mode.label(),
        remaining_errors = findings.len(),
        "diagram self-correction exhausted attempts, returning best-effort candidate"
    );
    DiagramOutcome {
        diagram: candidate,
        state: DiagramState::Exhausted,
        attempts_used: llm_attempts,
    }
}

async fn llm_repair(
    gateway: &LlmGateway,
    candidate: &str,
    findings: &[Finding],
) -> Result<String, GatewayError> {
    let issues = findings
        .iter()
        .map(|f| format!("- {}", f.detail))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "The following Mermaid flowchart has syntax issues. Fix them and respond \
         with ONLY a fenced ```mermaid code block containing the corrected diagram.\n\n\
         Issues:\n{issues}\n\nDiagram:\n```mermaid\n{candidate}\n```"
    );
    gateway.generate_mermaid(&prompt).await
}

fn centrality_lookup(graph: &DependencyGraph) -> impl Fn(&str) -> f64 + '_ {
    move |path: &str| {
        graph
            .nodes
            .iter()
            .find(|n| n.path == path)
            .map(|n| n.degree_centrality)
            .unwrap_or(0.0)
    }
}

/// Deterministic fallback used when generation itself fails before any
/// candidate exists: a minimal, always-valid diagram over the highest-fan
/// edges. With no internal edges to draw, there is nothing worth showing, so
/// the mode's artifact is left genuinely empty rather than a bare header.
fn fallback_diagram(dependency_analysis: &DependencyAnalysis) -> String {
    if dependency_analysis.internal_edges.is_empty() {
        return String::new();
    }
    let mut body = String::from("flowchart LR\n");
    for edge in dependency_analysis.internal_edges.iter().take(20) {
        body.push_str(&format!(
            "    {} --> {}\n",
            sanitize_id(&edge.source),
            sanitize_id(&edge.destination)
        ));
    }
    body
}

fn sanitize_id(path: &str) -> String {
    path.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_ai::testing::ScriptedProvider;
    use codegraph_core::{AnalyzerConfig, GraphEdgeRecord};
    use std::sync::Arc;

    fn config() -> AnalyzerConfig {
        let mut config = AnalyzerConfig::default();
        config.retry.attempts_per_model = 1;
        config.retry.retry_wait_min_secs = 0;
        config.retry.retry_wait_max_secs = 0;
        config
    }

    #[tokio::test]
    async fn valid_first_draft_short_circuits() {
        let provider = ScriptedProvider::always(
            "model",
            "```mermaid\nflowchart TD\n    A --> B\n```",
        );
        let gateway = LlmGateway::new(vec![Arc::new(provider)], &config());
        let generator = ContentGenerator::new(&gateway);
        let dependency_analysis = DependencyAnalysis::default();
        let graph = DependencyGraph::default();

        let outcome = produce_diagram(
            &generator,
            &gateway,
            DiagramMode::Overview,
            &dependency_analysis,
            &graph,
            "narrative",
            3,
        )
        .await;

        assert_eq!(outcome.state, DiagramState::Valid);
        assert_eq!(outcome.attempts_used, 0);
    }

    #[tokio::test]
    async fn quota_exhaustion_on_generation_returns_deterministic_fallback() {
        let provider = ScriptedProvider::always_quota("model");
        let gateway = LlmGateway::new(vec![Arc::new(provider)], &config());
        let generator = ContentGenerator::new(&gateway);
        let mut dependency_analysis = DependencyAnalysis::default();
        dependency_analysis.internal_edges.push(GraphEdgeRecord {
            source: "a.py".to_string(),
            destination: "b.py".to_string(),
        });
        let graph = DependencyGraph::default();

        let outcome = produce_diagram(
            &generator,
            &gateway,
            DiagramMode::Overview,
            &dependency_analysis,
            &graph,
            "narrative",
            3,
        )
        .await;

        assert_eq!(outcome.state, DiagramState::Exhausted);
        assert!(outcome.diagram.starts_with("flowchart LR"));
        assert!(!has_errors(&validate(&outcome.diagram, None, None)));
    }

    #[tokio::test]
    async fn correct_diagram_repairs_header_label_and_subgraph() {
        let provider = ScriptedProvider::always("model", "unused");
        let gateway = LlmGateway::new(vec![Arc::new(provider)], &config());
        let graph = DependencyGraph::default();
        let candidate = "A[node (with parens)] --> B\nsubgraph S\nA --> B".to_string();

        let outcome = correct_diagram(&gateway, DiagramMode::Overview, &graph, candidate, 3).await;

        assert_eq!(outcome.state, DiagramState::Valid);
        assert!(outcome.diagram.starts_with("flowchart"));
        assert!(!has_errors(&validate(&outcome.diagram, None, None)));
    }

    #[tokio::test]
    async fn correct_diagram_on_already_valid_candidate_is_unchanged() {
        let provider = ScriptedProvider::always("model", "unused");
        let gateway = LlmGateway::new(vec![Arc::new(provider)], &config());
        let graph = DependencyGraph::default();
        let candidate = "flowchart TD\n    A --> B".to_string();

        let outcome =
            correct_diagram(&gateway, DiagramMode::Overview, &graph, candidate.clone(), 3).await;

        assert_eq!(outcome.state, DiagramState::Valid);
        assert_eq!(outcome.attempts_used, 0);
        assert_eq!(outcome.diagram, candidate);
    }
}
