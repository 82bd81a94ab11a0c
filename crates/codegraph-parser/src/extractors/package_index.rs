use std::collections::HashMap;

use codegraph_core::FileRecord;

/// Maps dotted python module names to the repository-relative file that
/// defines them, built from `__init__.py` package markers.
pub struct PackageIndex {
    module_to_path: HashMap<String, String>,
}

impl PackageIndex {
    pub fn build(files: &[FileRecord]) -> Self {
        let mut module_to_path = HashMap::new();

        for file in files.iter().filter(|f| f.path.ends_with(".py")) {
            if let Some(module_name) = module_name_for(&file.path) {
                module_to_path.insert(module_name, file.path.clone());
            }
        }
        Self { module_to_path }
    }

    /// Resolves a dotted module name to an internal file path, if any.
    pub fn resolve(&self, module: &str) -> Option<&str> {
        self.module_to_path.get(module).map(|s| s.as_str())
    }

    /// Resolves `base.attr` preferring the submodule, falling back to the
    /// containing module (covers `from pkg import name` where `name` is an
    /// attribute of `pkg/__init__.py` rather than a submodule).
    pub fn resolve_from_import(&self, base: &str, name: &str) -> Option<&str> {
        let combined = format!("{base}.{name}");
        self.resolve(&combined).or_else(|| self.resolve(base))
    }
}

/// Derives the dotted module name for `path` (repo-relative, `__init__.py`
/// collapses to its containing directory).
fn module_name_for(path: &str) -> Option<String> {
    let without_ext = path.strip_suffix(".py")?;
    let is_init = without_ext.ends_with("/__init__") || without_ext == "__init__";

    let module_path = if is_init {
        without_ext.strip_suffix("/__init__").unwrap_or("").to_string()
    } else {
        without_ext.to_string()
    };

    if module_path.is_empty() {
        return None;
    }
    Some(module_path.replace('/', "."))
}
