use once_cell::sync::Lazy;
use regex::Regex;

/// One syntactic issue found in a diagram candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub detail: String,
    /// 0-indexed line number the finding anchors to, when applicable.
    pub line: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindingKind {
    MissingHeader,
    UnbalancedSubgraph { opens: usize, closes: usize },
    IdentifierWithSpace { identifier: String },
    ParenthesizedLabel,
    OverBudget { nodes: usize, max_nodes: usize, edges: usize, max_edges: usize },
}

static IDENTIFIER_WITH_SPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*([A-Za-z0-9_]+(?:\s+[A-Za-z0-9_]+)+)\s*[\[\(\{]").unwrap());
static PARENTHESIZED_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[(?:(?!").)*\([^\]]*\)[^\]]*\]"#).unwrap());
static EDGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{1,3}>").unwrap());
static NODE_DECL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z0-9_]+)\s*[\[\(\{]").unwrap());

/// Pure-text syntactic validator for Mermaid flowcharts. Runs without
/// invoking any external renderer; a deterministic line-oriented scan with
/// an explicit "inside subgraph" state.
pub fn validate(diagram: &str, max_nodes: Option<usize>, max_edges: Option<usize>) -> Vec<Finding> {
    let mut findings = Vec::new();
    let lines: Vec<&str> = diagram.lines().collect();

    check_header(&lines, &mut findings);
    check_subgraph_balance(&lines, &mut findings);
    check_identifier_spaces(diagram, &mut findings);
    check_parenthesized_labels(diagram, &mut findings);
    check_budget(diagram, max_nodes, max_edges, &mut findings);

    findings
}

fn check_header(lines: &[&str], findings: &mut Vec<Finding>) {
    let first_non_empty = lines.iter().find(|l| !l.trim().is_empty());
    let ok = first_non_empty
        .map(|l| {
            let trimmed = l.trim_start();
            trimmed.starts_with("flowchart") || trimmed.starts_with("graph")
        })
        .unwrap_or(false);
    if !ok {
        findings.push(Finding {
            kind: FindingKind::MissingHeader,
            severity: Severity::Error,
            detail: "first non-empty line is not a flowchart/graph header".to_string(),
            line: Some(0),
        });
    }
}

/// Tracks subgraph-open/close depth line by line; the "inside subgraph"
/// state the spec's redesign note calls for instead of ad-hoc regexes.
fn check_subgraph_balance(lines: &[&str], findings: &mut Vec<Finding>) {
    let opens = lines
        .iter()
        .filter(|l| l.trim_start().starts_with("subgraph"))
        .count();
    let closes = lines.iter().filter(|l| l.trim() == "end").count();
    if opens != closes {
        findings.push(Finding {
            kind: FindingKind::UnbalancedSubgraph { opens, closes },
            severity: Severity::Error,
            detail: format!("{opens} `subgraph` line(s) but {closes} `end` line(s)"),
            line: None,
        });
    }
}

fn check_identifier_spaces(diagram: &str, findings: &mut Vec<Finding>) {
    for (idx, line) in diagram.lines().enumerate() {
        if let Some(caps) = IDENTIFIER_WITH_SPACE_RE.captures(line) {
            findings.push(Finding {
                kind: FindingKind::IdentifierWithSpace {
                    identifier: caps[1].to_string(),
                },
                severity: Severity::Error,
                detail: format!("identifier `{}` contains a space", &caps[1]),
                line: Some(idx),
            });
        }
    }
}

fn check_parenthesized_labels(diagram: &str, findings: &mut Vec<Finding>) {
    for (idx, line) in diagram.lines().enumerate() {
        if PARENTHESIZED_LABEL_RE.is_match(line) {
            findings.push(Finding {
                kind: FindingKind::ParenthesizedLabel,
                severity: Severity::Error,
                detail: "node label contains unquoted parentheses".to_string(),
                line: Some(idx),
            });
        }
    }
}

fn check_budget(
    diagram: &str,
    max_nodes: Option<usize>,
    max_edges: Option<usize>,
    findings: &mut Vec<Finding>,
) {
    let (Some(max_nodes), Some(max_edges)) = (max_nodes, max_edges) else {
        return;
    };
    let nodes = count_nodes(diagram);
    let edges = count_edges(diagram);
    if nodes > max_nodes || edges > max_edges {
        findings.push(Finding {
            kind: FindingKind::OverBudget {
                nodes,
                max_nodes,
                edges,
                max_edges,
            },
            severity: Severity::Error,
            detail: format!(
                "{nodes}/{max_nodes} nodes, {edges}/{max_edges} edges"
            ),
            line: None,
        });
    }
}

pub fn count_nodes(diagram: &str) -> usize {
    use std::collections::HashSet;
    let mut ids = HashSet::new();
    for line in diagram.lines() {
        if let Some(caps) = NODE_DECL_RE.captures(line) {
            ids.insert(caps[1].to_string());
        }
    }
    ids.len()
}

pub fn count_edges(diagram: &str) -> usize {
    diagram.lines().filter(|l| EDGE_RE.is_match(l)).count()
}

/// Zero errors (warnings are tolerated) means the candidate is usable.
pub fn has_errors(findings: &[Finding]) -> bool {
    findings.iter().any(|f| f.severity == Severity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_missing_header() {
        let findings = validate("A --> B", None, None);
        assert!(findings.iter().any(|f| f.kind == FindingKind::MissingHeader));
    }

    #[test]
    fn detects_unbalanced_subgraph() {
        let diagram = "flowchart TD\nsubgraph S\nA --> B";
        let findings = validate(diagram, None, None);
        assert!(findings
            .iter()
            .any(|f| matches!(f.kind, FindingKind::UnbalancedSubgraph { .. })));
    }

    #[test]
    fn valid_diagram_has_no_errors() {
        let diagram = "flowchart TD\n    A --> B\n    B --> C";
        let findings = validate(diagram, Some(20), Some(25));
        assert!(!has_errors(&findings));
    }

    #[test]
    fn detects_parenthesized_label() {
        let diagram = "flowchart TD\n    A[node (with parens)] --> B";
        let findings = validate(diagram, None, None);
        assert!(findings
            .iter()
            .any(|f| f.kind == FindingKind::ParenthesizedLabel));
    }
}
