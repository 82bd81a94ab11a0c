use std::collections::{HashMap, HashSet};

use codegraph_core::{CentralFile, DependencyGraph, Edge, FileRecord, GraphEdgeRecord, GraphNode};

/// Adjacency as two parallel maps (forward, reverse); centrality is a small
/// arithmetic loop, deliberately avoiding a general-purpose graph library for
/// a graph this small and short-lived.
pub fn build_graph(files: &[FileRecord], edges: &[Edge]) -> DependencyGraph {
    let internal_paths: HashSet<&str> = files.iter().map(|f| f.path.as_str()).collect();

    let mut forward: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut reverse: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut edge_records = Vec::new();

    for edge in edges {
        if !edge.internal {
            continue;
        }
        if edge.source == edge.destination {
            continue; // no self-loops
        }
        if !internal_paths.contains(edge.source.as_str())
            || !internal_paths.contains(edge.destination.as_str())
        {
            continue;
        }
        let is_new = forward
            .entry(edge.source.as_str())
            .or_default()
            .insert(edge.destination.as_str());
        if is_new {
            reverse
                .entry(edge.destination.as_str())
                .or_default()
                .insert(edge.source.as_str());
            edge_records.push(GraphEdgeRecord {
                source: edge.source.clone(),
                destination: edge.destination.clone(),
            });
        }
    }

    let node_count = files.len();
    let denom = (node_count.saturating_sub(1)).max(1) as f64;

    let mut nodes: Vec<GraphNode> = files
        .iter()
        .map(|f| {
            let fan_in = reverse.get(f.path.as_str()).map(HashSet::len).unwrap_or(0);
            let fan_out = forward.get(f.path.as_str()).map(HashSet::len).unwrap_or(0);
            GraphNode {
                path: f.path.clone(),
                language: f.language,
                line_count: f.line_count,
                fan_in,
                fan_out,
                degree_centrality: (fan_in + fan_out) as f64 / denom,
            }
        })
        .collect();
    nodes.sort_by(|a, b| a.path.cmp(&b.path));

    DependencyGraph {
        nodes,
        edges: edge_records,
    }
}

/// Top-N files by fan-in + fan-out, ties broken by lexicographic path.
pub fn top_n(graph: &DependencyGraph, n: usize) -> Vec<CentralFile> {
    let mut ranked: Vec<CentralFile> = graph
        .nodes
        .iter()
        .map(|node| CentralFile {
            path: node.path.clone(),
            fan_in: node.fan_in,
            fan_out: node.fan_out,
        })
        .collect();
    ranked.sort_by(|a, b| {
        let score_a = a.fan_in + a.fan_out;
        let score_b = b.fan_in + b.fan_out;
        score_b.cmp(&score_a).then_with(|| a.path.cmp(&b.path))
    });
    ranked.truncate(n.min(100));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use codegraph_core::{ExtractorTag, Language};

    fn file(path: &str) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            extension: "py".to_string(),
            language: Language::Python,
            line_count: 10,
            excerpt: String::new(),
        }
    }

    fn edge(src: &str, dst: &str) -> Edge {
        Edge {
            source: src.to_string(),
            destination: dst.to_string(),
            internal: true,
            extractor: ExtractorTag::PythonPrimary,
        }
    }

    #[test]
    fn fan_in_out_and_centrality_match_definition() {
        let files = vec![file("a.py"), file("b.py"), file("c.py")];
        let edges = vec![edge("a.py", "b.py"), edge("a.py", "c.py")];
        let graph = build_graph(&files, &edges);

        let a = graph.nodes.iter().find(|n| n.path == "a.py").unwrap();
        let b = graph.nodes.iter().find(|n| n.path == "b.py").unwrap();
        assert_eq!(a.fan_out, 2);
        assert_eq!(a.fan_in, 0);
        assert_eq!(b.fan_in, 1);
        assert_eq!(b.fan_out, 0);
        assert_relative_eq!(a.degree_centrality, 2.0 / 2.0);
        assert_relative_eq!(b.degree_centrality, 1.0 / 2.0);
    }

    #[test]
    fn self_loops_are_dropped() {
        let files = vec![file("a.py")];
        let edges = vec![edge("a.py", "a.py")];
        let graph = build_graph(&files, &edges);
        assert!(graph.edges.is_empty());
        assert_eq!(graph.nodes[0].fan_in, 0);
        assert_eq!(graph.nodes[0].fan_out, 0);
    }

    #[test]
    fn single_file_no_imports_has_zero_centrality() {
        let files = vec![file("solo.py")];
        let graph = build_graph(&files, &[]);
        assert_eq!(graph.nodes.len(), 1);
        assert_relative_eq!(graph.nodes[0].degree_centrality, 0.0);
    }
}
