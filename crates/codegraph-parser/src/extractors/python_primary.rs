use std::path::Path;

use codegraph_core::{Edge, ExtractorTag, FileRecord};
use once_cell::sync::Lazy;
use regex::Regex;

use super::package_index::PackageIndex;

static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*import\s+([\w.]+(?:\s*,\s*[\w.]+)*)").unwrap());
static FROM_IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*from\s+(\.*)([\w.]*)\s+import\s+(.+)").unwrap()
});
static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w]+").unwrap());

/// Package-aware primary parser: resolves each importer -> imported module
/// pair by mapping module names to file paths via the `PackageIndex`.
pub fn extract(repo_root: &Path, files: &[FileRecord], index: &PackageIndex) -> Vec<Edge> {
    let mut edges = Vec::new();
    for file in files.iter().filter(|f| f.path.ends_with(".py")) {
        let Ok(content) = std::fs::read_to_string(repo_root.join(&file.path)) else {
            continue;
        };
        extract_file(file, &content, index, &mut edges);
    }
    edges
}

fn extract_file(file: &FileRecord, content: &str, index: &PackageIndex, edges: &mut Vec<Edge>) {
    for caps in IMPORT_RE.captures_iter(content) {
        for module in caps[1].split(',').map(str::trim) {
            push_edge(file, module, index, edges);
        }
    }

    for caps in FROM_IMPORT_RE.captures_iter(content) {
        let dots = &caps[1];
        let module = caps[2].trim();
        let names = &caps[3];

        if !dots.is_empty() {
            // Relative from-import; the package-aware parser only resolves
            // absolute names, the syntax-tree fallback handles relative
            // levels precisely.
            continue;
        }
        if module.is_empty() {
            continue;
        }
        for raw_name in names.split(',') {
            let Some(name) = NAME_RE.find(raw_name.trim()).map(|m| m.as_str()) else {
                continue;
            };
            if let Some(path) = index.resolve_from_import(module, name) {
                push_internal(file, path, edges);
            } else {
                push_external(file, &format!("{module}.{name}"), edges);
            }
        }
    }
}

fn push_edge(file: &FileRecord, module: &str, index: &PackageIndex, edges: &mut Vec<Edge>) {
    if module.is_empty() {
        return;
    }
    if let Some(path) = index.resolve(module) {
        push_internal(file, path, edges);
    } else {
        push_external(file, module, edges);
    }
}

fn push_internal(file: &FileRecord, path: &str, edges: &mut Vec<Edge>) {
    if path == file.path {
        return; // no self-loops
    }
    edges.push(Edge {
        source: file.path.clone(),
        destination: path.to_string(),
        internal: true,
        extractor: ExtractorTag::PythonPrimary,
    });
}

fn push_external(file: &FileRecord, module: &str, edges: &mut Vec<Edge>) {
    edges.push(Edge {
        source: file.path.clone(),
        destination: module.to_string(),
        internal: false,
        extractor: ExtractorTag::PythonPrimary,
    });
}
