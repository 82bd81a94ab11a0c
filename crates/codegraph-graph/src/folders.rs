use std::collections::{BTreeMap, BTreeSet};

/// Builds the deterministic folder-structure diagram: from
/// the set of file paths, build the directory tree and emit a `flowchart TD`
/// with one node per directory and an edge from each parent to each child.
/// Pure function of the path set; running it twice yields identical output.
pub fn folder_diagram(paths: &[String]) -> String {
    let mut dirs: BTreeSet<String> = BTreeSet::new();
    dirs.insert(String::new()); // repo root
    for path in paths {
        let mut acc = String::new();
        for segment in parent_segments(path) {
            if !acc.is_empty() {
                acc.push('/');
            }
            acc.push_str(segment);
            dirs.insert(acc.clone());
        }
    }

    let mut children: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for dir in &dirs {
        if dir.is_empty() {
            continue;
        }
        let parent = match dir.rfind('/') {
            Some(idx) => dir[..idx].to_string(),
            None => String::new(),
        };
        children.entry(parent).or_default().insert(dir.clone());
    }

    let mut out = String::from("flowchart TD\n");
    for dir in &dirs {
        out.push_str(&format!("    {}[\"{}\"]\n", node_id(dir), label(dir)));
    }
    for (parent, kids) in &children {
        for child in kids {
            out.push_str(&format!(
                "    {} --> {}\n",
                node_id(parent),
                node_id(child)
            ));
        }
    }
    out
}

fn parent_segments(path: &str) -> impl Iterator<Item = &str> {
    let dir = match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    };
    dir.split('/').filter(|s| !s.is_empty())
}

fn node_id(dir: &str) -> String {
    if dir.is_empty() {
        return "root".to_string();
    }
    let sanitized: String = dir
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("dir_{sanitized}")
}

fn label(dir: &str) -> String {
    if dir.is_empty() {
        return "/".to_string();
    }
    dir.rsplit('/').next().unwrap_or(dir).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_idempotent_and_pure() {
        let paths = vec!["src/app.ts".to_string(), "src/lib/util.ts".to_string()];
        let first = folder_diagram(&paths);
        let second = folder_diagram(&paths);
        assert_eq!(first, second);
        assert!(first.starts_with("flowchart TD"));
        assert!(first.contains("dir_src --> dir_src_lib"));
    }

    #[test]
    fn empty_repo_yields_trivial_diagram() {
        let diagram = folder_diagram(&[]);
        assert_eq!(diagram.trim(), "flowchart TD\n    root[\"/\"]".trim());
    }
}
