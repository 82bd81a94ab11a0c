use std::collections::HashSet;

use super::tsconfig::TsConfig;

const EXTENSION_CANDIDATES: &[&str] = &["", ".ts", ".tsx", ".js", ".jsx"];
const INDEX_CANDIDATES: &[&str] = &[
    "/index.ts",
    "/index.tsx",
    "/index.js",
    "/index.jsx",
];

/// Resolves an import specifier seen in `from_file` to an internal file path
/// present in `known_files`, or returns `None` if it should be treated as
/// external.
pub fn resolve(
    from_file: &str,
    specifier: &str,
    known_files: &HashSet<String>,
    tsconfig: Option<&TsConfig>,
) -> Option<String> {
    if specifier.starts_with('.') || specifier.starts_with('/') {
        let base = if specifier.starts_with('/') {
            specifier.trim_start_matches('/').to_string()
        } else {
            normalize(from_file, specifier)
        };
        return probe(&base, known_files);
    }

    if let Some(cfg) = tsconfig {
        for candidate in cfg.resolve_alias(specifier) {
            if let Some(found) = probe(&candidate, known_files) {
                return Some(found);
            }
        }
    }
    None
}

fn probe(base: &str, known_files: &HashSet<String>) -> Option<String> {
    for ext in EXTENSION_CANDIDATES {
        let candidate = format!("{base}{ext}");
        if known_files.contains(&candidate) {
            return Some(candidate);
        }
    }
    for suffix in INDEX_CANDIDATES {
        let candidate = format!("{base}{suffix}");
        if known_files.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Joins `specifier` (relative to the directory of `from_file`) and
/// normalizes `.`/`..` segments, forward-slash throughout.
fn normalize(from_file: &str, specifier: &str) -> String {
    let dir = match from_file.rfind('/') {
        Some(idx) => &from_file[..idx],
        None => "",
    };
    let mut stack: Vec<&str> = if dir.is_empty() {
        Vec::new()
    } else {
        dir.split('/').collect()
    };

    for segment in specifier.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    stack.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_with_extension_probing() {
        let mut known = HashSet::new();
        known.insert("src/util.ts".to_string());
        assert_eq!(
            resolve("src/app.ts", "./util", &known, None),
            Some("src/util.ts".to_string())
        );
    }

    #[test]
    fn resolves_index_variant() {
        let mut known = HashSet::new();
        known.insert("src/widgets/index.tsx".to_string());
        assert_eq!(
            resolve("src/app.ts", "./widgets", &known, None),
            Some("src/widgets/index.tsx".to_string())
        );
    }

    #[test]
    fn resolves_parent_traversal() {
        let mut known = HashSet::new();
        known.insert("util.ts".to_string());
        assert_eq!(
            resolve("src/app.ts", "../util", &known, None),
            Some("util.ts".to_string())
        );
    }
}
