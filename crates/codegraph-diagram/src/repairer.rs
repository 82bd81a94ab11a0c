use crate::validator::{count_edges, count_nodes, FindingKind};
use crate::validator::Finding;

/// Applies every repairable rule-based fix for the given findings.
/// Over-budget repair additionally needs a per-node centrality ranking
/// (path -> score), lowest first, to decide what to drop.
pub fn repair(diagram: &str, findings: &[Finding], centrality: &dyn Fn(&str) -> f64) -> String {
    let mut body = diagram.to_string();

    for finding in findings {
        body = match &finding.kind {
            FindingKind::MissingHeader => prepend_header(&body),
            FindingKind::UnbalancedSubgraph { opens, closes } => {
                balance_subgraph(&body, *opens, *closes)
            }
            FindingKind::IdentifierWithSpace { identifier } => {
                replace_space_identifier(&body, identifier)
            }
            FindingKind::ParenthesizedLabel => quote_parenthesized_labels(&body),
            FindingKind::OverBudget {
                max_nodes, max_edges, ..
            } => trim_to_budget(&body, *max_nodes, *max_edges, centrality),
        };
    }
    body
}

fn prepend_header(body: &str) -> String {
    let trimmed = body.trim_start();
    let already_has_header = trimmed
        .lines()
        .next()
        .map(|l| l.trim_start().starts_with("flowchart") || l.trim_start().starts_with("graph"))
        .unwrap_or(false);
    if already_has_header {
        return body.to_string();
    }
    format!("flowchart LR\n{body}")
}

fn balance_subgraph(body: &str, opens: usize, closes: usize) -> String {
    if opens > closes {
        let deficit = opens - closes;
        let mut out = body.to_string();
        if !out.ends_with('\n') {
            out.push('\n');
        }
        for _ in 0..deficit {
            out.push_str("end\n");
        }
        out
    } else if closes > opens {
        // More closes than opens is unrepairable by rule; leave as-is so the
        // validator re-reports it and the LLM repair step takes over.
        body.to_string()
    } else {
        body.to_string()
    }
}

fn replace_space_identifier(body: &str, identifier: &str) -> String {
    let replacement = identifier.replace(' ', "_");
    body.lines()
        .map(|line| {
            if line.contains(identifier) {
                line.replacen(identifier, &replacement, 1)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wraps any `ID[...(...)...]` label in double quotes so the parser doesn't
/// choke on unquoted parentheses. Idempotent: a label that is already quoted
/// is left untouched.
fn quote_parenthesized_labels(body: &str) -> String {
    body.lines()
        .map(quote_line_label)
        .collect::<Vec<_>>()
        .join("\n")
}

fn quote_line_label(line: &str) -> String {
    let Some(open) = line.find('[') else {
        return line.to_string();
    };
    let Some(close) = line[open..].find(']').map(|i| i + open) else {
        return line.to_string();
    };
    let label = &line[open + 1..close];
    if label.starts_with('"') && label.ends_with('"') {
        return line.to_string(); // already quoted: idempotent
    }
    if !label.contains('(') {
        return line.to_string();
    }
    format!("{}[\"{}\"]{}", &line[..open], label, &line[close + 1..])
}

/// Drops the lowest-centrality nodes (and edges touching a dropped node)
/// until both the node and edge count are under budget.
fn trim_to_budget(body: &str, max_nodes: usize, max_edges: usize, centrality: &dyn Fn(&str) -> f64) -> String {
    let mut lines: Vec<String> = body.lines().map(String::from).collect();

    if count_nodes(body) <= max_nodes && count_edges(body) <= max_edges {
        return body.to_string();
    }

    let mut node_ids: Vec<String> = node_identifiers(&lines);
    node_ids.sort_by(|a, b| {
        centrality(a)
            .partial_cmp(&centrality(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut to_drop = Vec::new();
    while node_ids.len() > max_nodes.max(1) {
        to_drop.push(node_ids.remove(0));
    }

    lines.retain(|line| !to_drop.iter().any(|id| references_identifier(line, id)));

    // Edge budget: if still too many edges, drop the tail of edge lines.
    let mut edge_count = lines.iter().filter(|l| l.contains("-->")).count();
    if edge_count > max_edges {
        let mut trimmed = Vec::with_capacity(lines.len());
        for line in lines {
            if line.contains("-->") && edge_count > max_edges {
                edge_count -= 1;
                continue;
            }
            trimmed.push(line);
        }
        return trimmed.join("\n");
    }

    lines.join("\n")
}

fn node_identifiers(lines: &[String]) -> Vec<String> {
    use std::collections::HashSet;
    let re = regex::Regex::new(r"^\s*([A-Za-z0-9_]+)\s*[\[\(\{]").unwrap();
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for line in lines {
        if let Some(caps) = re.captures(line) {
            let id = caps[1].to_string();
            if seen.insert(id.clone()) {
                out.push(id);
            }
        }
    }
    out
}

fn references_identifier(line: &str, id: &str) -> bool {
    line.split(|c: char| !c.is_alphanumeric() && c != '_')
        .any(|token| token == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate;

    fn no_centrality(_: &str) -> f64 {
        0.0
    }

    #[test]
    fn prepends_missing_header() {
        let findings = validate("A --> B", None, None);
        let repaired = repair("A --> B", &findings, &no_centrality);
        assert!(repaired.starts_with("flowchart LR"));
    }

    #[test]
    fn quotes_parenthesized_label_and_is_idempotent() {
        let diagram = "flowchart TD\n    A[node (with parens)] --> B";
        let findings = validate(diagram, None, None);
        let once = repair(diagram, &findings, &no_centrality);
        assert!(once.contains("A[\"node (with parens)\"]"));

        let findings_again = validate(&once, None, None);
        let twice = repair(&once, &findings_again, &no_centrality);
        assert_eq!(once, twice);
    }

    #[test]
    fn balances_unbalanced_subgraph() {
        let diagram = "flowchart TD\nsubgraph S\nA --> B";
        let findings = validate(diagram, None, None);
        let repaired = repair(diagram, &findings, &no_centrality);
        assert_eq!(repaired.matches("end").count(), 1);
    }

    #[test]
    fn replaces_space_in_identifier() {
        let diagram = "flowchart TD\n    my node[Label] --> B";
        let findings = validate(diagram, None, None);
        let repaired = repair(diagram, &findings, &no_centrality);
        assert!(repaired.contains("my_node[Label]"));
    }
}
