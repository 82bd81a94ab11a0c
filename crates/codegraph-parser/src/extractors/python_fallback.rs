use std::path::Path;

use codegraph_core::{Edge, ExtractorTag, FileRecord};
use tree_sitter::{Node, Parser, TreeCursor};

use super::package_index::PackageIndex;

/// Syntax-tree based fallback: parses each file's AST and extracts the names
/// in `import` / `from ... import` constructs, resolving relative imports by
/// applying the file's own package path and the declared dot level.
pub fn extract(repo_root: &Path, files: &[FileRecord], index: &PackageIndex) -> Vec<Edge> {
    let mut parser = Parser::new();
    if parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .is_err()
    {
        return Vec::new();
    }

    let mut edges = Vec::new();
    for file in files.iter().filter(|f| f.path.ends_with(".py")) {
        let Ok(content) = std::fs::read_to_string(repo_root.join(&file.path)) else {
            continue;
        };
        let Some(tree) = parser.parse(&content, None) else {
            continue;
        };
        let mut cursor = tree.walk();
        walk(&mut cursor, &content, file, index, &mut edges);
    }
    edges
}

fn walk(
    cursor: &mut TreeCursor,
    content: &str,
    file: &FileRecord,
    index: &PackageIndex,
    edges: &mut Vec<Edge>,
) {
    let node = cursor.node();
    match node.kind() {
        "import_statement" => {
            for dotted in children_of_kind(&node, "dotted_name") {
                let module = text(&dotted, content);
                resolve_absolute(file, &module, index, edges);
            }
        }
        "import_from_statement" => {
            handle_from_import(&node, content, file, index, edges);
        }
        _ => {}
    }

    if cursor.goto_first_child() {
        loop {
            walk(cursor, content, file, index, edges);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

fn handle_from_import(
    node: &Node,
    content: &str,
    file: &FileRecord,
    index: &PackageIndex,
    edges: &mut Vec<Edge>,
) {
    let module_node = node
        .child_by_field_name("module_name")
        .or_else(|| first_child_of_kinds(node, &["dotted_name", "relative_import"]));

    let (level, base) = match module_node {
        Some(n) if n.kind() == "relative_import" => {
            let dots = text(&n, content).chars().take_while(|c| *c == '.').count();
            let dotted = children_of_kind(&n, "dotted_name")
                .into_iter()
                .next()
                .map(|d| text(&d, content))
                .unwrap_or_default();
            (dots, dotted)
        }
        Some(n) => (0, text(&n, content)),
        None => (0, String::new()),
    };

    let names = import_names(node, content);

    if level > 0 {
        let Some(package) = package_for_level(&file.path, level) else {
            for name in &names {
                push_external(file, &qualify(&base, name), edges);
            }
            return;
        };
        let full_base = if base.is_empty() {
            package
        } else {
            format!("{package}.{base}")
        };
        for name in &names {
            resolve_from(file, &full_base, name, index, edges);
        }
    } else {
        if base.is_empty() {
            return;
        }
        for name in &names {
            resolve_from(file, &base, name, index, edges);
        }
    }
}

fn import_names(node: &Node, content: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let n = cursor.node();
            match n.kind() {
                "dotted_name" | "aliased_import" => {
                    // Skip the module-name dotted_name itself; only the
                    // names after `import` matter here. We approximate by
                    // taking every dotted_name that appears after the
                    // `import` keyword sibling.
                    if preceded_by_import_keyword(&n, node) {
                        names.push(first_dotted_or_self(&n, content));
                    }
                }
                "wildcard_import" => names.push("*".to_string()),
                _ => {}
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    names
}

fn first_dotted_or_self(n: &Node, content: &str) -> String {
    if n.kind() == "aliased_import" {
        n.child(0)
            .map(|c| text(&c, content))
            .unwrap_or_else(|| text(n, content))
    } else {
        text(n, content)
    }
}

fn preceded_by_import_keyword(n: &Node, parent: &Node) -> bool {
    let mut cursor = parent.walk();
    let mut seen_import = false;
    if cursor.goto_first_child() {
        loop {
            let sib = cursor.node();
            if sib.kind() == "import" {
                seen_import = true;
            }
            if sib.id() == n.id() {
                return seen_import;
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    false
}

fn package_for_level(file_path: &str, level: usize) -> Option<String> {
    let dir = match file_path.rfind('/') {
        Some(idx) => &file_path[..idx],
        None => "",
    };
    let mut parts: Vec<&str> = if dir.is_empty() {
        Vec::new()
    } else {
        dir.split('/').collect()
    };
    // level 1 means "current package" (no ascent); each extra dot ascends
    // one more package level.
    for _ in 1..level {
        if parts.pop().is_none() {
            return None;
        }
    }
    Some(parts.join("."))
}

fn qualify(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}.{name}")
    }
}

fn resolve_absolute(file: &FileRecord, module: &str, index: &PackageIndex, edges: &mut Vec<Edge>) {
    if module.is_empty() {
        return;
    }
    match index.resolve(module) {
        Some(path) => push_internal(file, path, edges),
        None => push_external(file, module, edges),
    }
}

fn resolve_from(
    file: &FileRecord,
    base: &str,
    name: &str,
    index: &PackageIndex,
    edges: &mut Vec<Edge>,
) {
    if name == "*" {
        if let Some(path) = index.resolve(base) {
            push_internal(file, path, edges);
        }
        return;
    }
    match index.resolve_from_import(base, name) {
        Some(path) => push_internal(file, path, edges),
        None => push_external(file, &qualify(base, name), edges),
    }
}

fn push_internal(file: &FileRecord, path: &str, edges: &mut Vec<Edge>) {
    if path == file.path {
        return;
    }
    edges.push(Edge {
        source: file.path.clone(),
        destination: path.to_string(),
        internal: true,
        extractor: ExtractorTag::PythonFallback,
    });
}

fn push_external(file: &FileRecord, module: &str, edges: &mut Vec<Edge>) {
    edges.push(Edge {
        source: file.path.clone(),
        destination: module.to_string(),
        internal: false,
        extractor: ExtractorTag::PythonFallback,
    });
}

fn text(node: &Node, content: &str) -> String {
    node.utf8_text(content.as_bytes()).unwrap_or("").to_string()
}

fn children_of_kind<'a>(node: &Node<'a>, kind: &str) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            if cursor.node().kind() == kind {
                out.push(cursor.node());
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

fn first_child_of_kinds<'a>(node: &Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            if kinds.contains(&cursor.node().kind()) {
                return Some(cursor.node());
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    None
}
