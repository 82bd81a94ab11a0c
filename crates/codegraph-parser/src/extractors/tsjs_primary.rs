use std::collections::HashSet;
use std::path::Path;

use codegraph_core::{Edge, ExtractorTag, FileRecord};
use tree_sitter::{Node, Parser, TreeCursor};

use super::ts_js_resolver::resolve;
use super::tsconfig::TsConfig;

/// AST-based primary parser for TS/JS: extracts static import sources,
/// export-from sources, and string arguments to `require`/dynamic `import`
/// calls.
pub fn extract(repo_root: &Path, files: &[FileRecord]) -> Vec<Edge> {
    let tsconfig = TsConfig::load(repo_root);
    let known_files: HashSet<String> = files.iter().map(|f| f.path.clone()).collect();

    let mut edges = Vec::new();
    for file in files.iter().filter(|f| is_ts_or_js(&f.path)) {
        let Ok(content) = std::fs::read_to_string(repo_root.join(&file.path)) else {
            continue;
        };
        let Some(mut parser) = parser_for(&file.path) else {
            continue;
        };
        let Some(tree) = parser.parse(&content, None) else {
            continue;
        };

        let mut specifiers = Vec::new();
        let mut cursor = tree.walk();
        collect_specifiers(&mut cursor, &content, &mut specifiers);

        for spec in specifiers {
            match resolve(&file.path, &spec, &known_files, tsconfig.as_ref()) {
                Some(path) if path != file.path => edges.push(Edge {
                    source: file.path.clone(),
                    destination: path,
                    internal: true,
                    extractor: ExtractorTag::TsJsPrimary,
                }),
                Some(_) => {} // self-loop, dropped
                None => edges.push(Edge {
                    source: file.path.clone(),
                    destination: spec,
                    internal: false,
                    extractor: ExtractorTag::TsJsPrimary,
                }),
            }
        }
    }
    edges
}

fn is_ts_or_js(path: &str) -> bool {
    [".ts", ".tsx", ".js", ".jsx"]
        .iter()
        .any(|ext| path.ends_with(ext))
}

fn parser_for(path: &str) -> Option<Parser> {
    let mut parser = Parser::new();
    let lang = if path.ends_with(".tsx") {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    } else if path.ends_with(".ts") {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    } else {
        tree_sitter_javascript::LANGUAGE.into()
    };
    parser.set_language(&lang).ok()?;
    Some(parser)
}

fn collect_specifiers(cursor: &mut TreeCursor, content: &str, out: &mut Vec<String>) {
    let node = cursor.node();
    match node.kind() {
        "import_statement" | "export_statement" => {
            if let Some(src) = string_field(&node, "source", content) {
                out.push(src);
            }
        }
        "call_expression" => {
            if let Some(callee) = node.child_by_field_name("function") {
                let name = text(&callee, content);
                if name == "require" || name == "import" {
                    if let Some(args) = node.child_by_field_name("arguments") {
                        if let Some(first) = first_string_literal(&args, content) {
                            out.push(first);
                        }
                    }
                }
            }
        }
        _ => {}
    }

    if cursor.goto_first_child() {
        loop {
            collect_specifiers(cursor, content, out);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

fn string_field(node: &Node, field: &str, content: &str) -> Option<String> {
    let n = node.child_by_field_name(field)?;
    Some(unquote(&text(&n, content)))
}

fn first_string_literal(node: &Node, content: &str) -> Option<String> {
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let n = cursor.node();
            if n.kind() == "string" {
                return Some(unquote(&text(&n, content)));
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    None
}

fn unquote(s: &str) -> String {
    s.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}

fn text(node: &Node, content: &str) -> String {
    node.utf8_text(content.as_bytes()).unwrap_or("").to_string()
}
