use std::collections::HashSet;
use std::path::Path;

use codegraph_core::{Edge, ExtractorTag, FileRecord};
use once_cell::sync::Lazy;
use regex::Regex;

use super::ts_js_resolver::resolve;
use super::tsconfig::TsConfig;

static IMPORT_FROM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:import|export)[^;'"]*from\s*['"]([^'"]+)['"]"#).unwrap());
static BARE_IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*import\s*['"]([^'"]+)['"]"#).unwrap());
static REQUIRE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());
static DYNAMIC_IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

/// Line-oriented regex fallback, used only when the AST primary parser fails
/// on a file.
pub fn extract_for_file(
    repo_root: &Path,
    file: &FileRecord,
    known_files: &HashSet<String>,
    tsconfig: Option<&TsConfig>,
) -> Vec<Edge> {
    let Ok(content) = std::fs::read_to_string(repo_root.join(&file.path)) else {
        return Vec::new();
    };

    let mut specifiers = Vec::new();
    for line in content.lines() {
        for re in [&*IMPORT_FROM_RE, &*BARE_IMPORT_RE, &*REQUIRE_RE, &*DYNAMIC_IMPORT_RE] {
            if let Some(caps) = re.captures(line) {
                specifiers.push(caps[1].to_string());
            }
        }
    }

    let mut edges = Vec::new();
    for spec in specifiers {
        match resolve(&file.path, &spec, known_files, tsconfig) {
            Some(path) if path != file.path => edges.push(Edge {
                source: file.path.clone(),
                destination: path,
                internal: true,
                extractor: ExtractorTag::TsJsFallback,
            }),
            Some(_) => {}
            None => edges.push(Edge {
                source: file.path.clone(),
                destination: spec,
                internal: false,
                extractor: ExtractorTag::TsJsFallback,
            }),
        }
    }
    edges
}
