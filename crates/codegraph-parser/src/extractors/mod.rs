pub mod package_index;
pub mod python_fallback;
pub mod python_primary;
pub mod ts_js_resolver;
pub mod tsconfig;
pub mod tsjs_fallback;
pub mod tsjs_primary;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use codegraph_core::{Edge, FileRecord};

use package_index::PackageIndex;
use tsconfig::TsConfig;

/// Produces the complete, deduplicated edge set for the file-record set by
/// running every language's primary and fallback extractor and taking the
/// union. When two extractors disagree on internal-vs-
/// external for the same `(src, dst)` pair, internal wins; duplicate edges
/// from different extractors collapse to one.
pub fn extract_all(repo_root: &Path, files: &[FileRecord]) -> Vec<Edge> {
    let package_index = PackageIndex::build(files);
    let known_files: HashSet<String> = files.iter().map(|f| f.path.clone()).collect();
    let tsconfig = TsConfig::load(repo_root);

    let mut all = Vec::new();
    all.extend(python_primary::extract(repo_root, files, &package_index));
    all.extend(python_fallback::extract(repo_root, files, &package_index));
    all.extend(tsjs_primary::extract(repo_root, files));

    for file in files.iter().filter(|f| is_ts_or_js(&f.path)) {
        all.extend(tsjs_fallback::extract_for_file(
            repo_root,
            file,
            &known_files,
            tsconfig.as_ref(),
        ));
    }

    merge(all)
}

fn is_ts_or_js(path: &str) -> bool {
    [".ts", ".tsx", ".js", ".jsx"]
        .iter()
        .any(|ext| path.ends_with(ext))
}

/// Deduplicates by `(src, dst, internal)`, preferring an internal
/// classification over an external one for the same `(src, dst)` pair since
/// a resolved file path is strictly more informative than a raw specifier.
fn merge(edges: Vec<Edge>) -> Vec<Edge> {
    let mut by_pair: HashMap<(String, String), Edge> = HashMap::new();
    for edge in edges {
        let key = (edge.source.clone(), edge.destination.clone());
        match by_pair.get(&key) {
            Some(existing) if existing.internal || !edge.internal => {}
            _ => {
                by_pair.insert(key, edge);
            }
        }
    }
    by_pair.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::ExtractorTag;

    #[test]
    fn internal_wins_over_external_for_same_pair() {
        let edges = vec![
            Edge {
                source: "a.ts".into(),
                destination: "react".into(),
                internal: false,
                extractor: ExtractorTag::TsJsFallback,
            },
            Edge {
                source: "a.ts".into(),
                destination: "react".into(),
                internal: true,
                extractor: ExtractorTag::TsJsPrimary,
            },
        ];
        let merged = merge(edges);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].internal);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let edges = vec![
            Edge {
                source: "a.py".into(),
                destination: "b.py".into(),
                internal: true,
                extractor: ExtractorTag::PythonPrimary,
            },
            Edge {
                source: "a.py".into(),
                destination: "b.py".into(),
                internal: true,
                extractor: ExtractorTag::PythonFallback,
            },
        ];
        assert_eq!(merge(edges).len(), 1);
    }
}
