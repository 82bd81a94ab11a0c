use std::collections::HashMap;
use std::path::Path;

use codegraph_core::{AnalyzerConfig, CodeGraphError, FileRecord, Language, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use tracing::{debug, info, warn};

/// Aggregate language statistics computed alongside the file list: total
/// lines, total file count, percentage per language.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub files: Vec<FileRecord>,
    pub loc_total: usize,
    pub language_stats: HashMap<String, f64>,
}

/// Walks `repo_root`, skipping hidden directories and the configured
/// dependency/build-output/VCS directories, keeping only files whose
/// extension is in `config.supported_extensions`.
pub fn scan_repository(repo_root: &Path, config: &AnalyzerConfig) -> Result<ScanResult> {
    info!(root = %repo_root.display(), "scanning repository");

    let exclude_set = build_exclusion_globset(&config.excluded_directories);

    let mut walker_builder = WalkBuilder::new(repo_root);
    walker_builder
        .hidden(true)
        .git_ignore(false)
        .git_exclude(false)
        .ignore(false)
        .standard_filters(false);

    let mut files = Vec::new();
    let mut totals_by_lang: HashMap<Language, usize> = HashMap::new();
    let mut loc_total = 0usize;

    for entry in walker_builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(%err, "walk error, skipping entry");
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        if is_excluded(path, repo_root, &exclude_set) {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !config.supported_extensions.contains(ext) {
            continue;
        }
        let Some(language) = Language::from_extension(ext) else {
            continue;
        };

        let relative = match path.strip_prefix(repo_root) {
            Ok(p) => p,
            Err(_) => continue,
        };
        let rel_str = to_forward_slash(relative);

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(err) => {
                debug!(path = %rel_str, %err, "skipping unreadable file");
                continue;
            }
        };

        let line_count = non_empty_line_count(&content);
        let excerpt: String = content.chars().take(config.excerpt_char_budget).collect();

        *totals_by_lang.entry(language).or_insert(0) += line_count;
        loc_total += line_count;

        files.push(FileRecord {
            path: rel_str,
            extension: ext.to_string(),
            language,
            line_count,
            excerpt,
        });
    }

    let language_stats = percentages(&totals_by_lang, loc_total);

    Ok(ScanResult {
        files,
        loc_total,
        language_stats,
    })
}

/// Non-empty-line count, pinned for reproducibility across line-ending
/// styles.
fn non_empty_line_count(content: &str) -> usize {
    content.lines().filter(|l| !l.trim().is_empty()).count()
}

fn to_forward_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn build_exclusion_globset(dirs: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for dir in dirs {
        if let Ok(glob) = Glob::new(&format!("**/{dir}/**")) {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

fn is_excluded(path: &Path, root: &Path, exclude_set: &GlobSet) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    if relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
    {
        return true;
    }
    exclude_set.is_match(relative)
}

fn percentages(totals: &HashMap<Language, usize>, loc_total: usize) -> HashMap<String, f64> {
    if loc_total == 0 {
        return HashMap::new();
    }
    totals
        .iter()
        .map(|(lang, lines)| {
            let pct = (*lines as f64 / loc_total as f64) * 100.0;
            (lang.label().to_string(), (pct * 10.0).round() / 10.0)
        })
        .collect()
}

/// Surfaces a scan failure as a fatal `ScanFailed` error.
pub fn fatal_scan_error(message: impl Into<String>) -> CodeGraphError {
    CodeGraphError::ScanFailed(message.into())
}
