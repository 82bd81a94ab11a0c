use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

/// Resolved `compilerOptions.baseUrl` + `paths` from a `tsconfig.json`, used
/// to resolve non-relative specifiers.
#[derive(Debug, Clone, Default)]
pub struct TsConfig {
    pub base_url: String,
    /// alias pattern -> replacement candidates, both possibly containing `*`.
    pub paths: Vec<(String, Vec<String>)>,
}

#[derive(Deserialize)]
struct RawTsConfig {
    #[serde(rename = "compilerOptions")]
    compiler_options: Option<RawCompilerOptions>,
}

#[derive(Deserialize)]
struct RawCompilerOptions {
    #[serde(rename = "baseUrl")]
    base_url: Option<String>,
    paths: Option<HashMap<String, Vec<String>>>,
}

impl TsConfig {
    pub fn load(repo_root: &Path) -> Option<Self> {
        let raw = std::fs::read_to_string(repo_root.join("tsconfig.json")).ok()?;
        let stripped = strip_jsonc_comments(&raw);
        let parsed: RawTsConfig = serde_json::from_str(&stripped).ok()?;
        let opts = parsed.compiler_options?;
        let base_url = opts.base_url.unwrap_or_else(|| ".".to_string());
        let mut paths: Vec<(String, Vec<String>)> = opts
            .paths
            .unwrap_or_default()
            .into_iter()
            .collect();
        paths.sort_by(|a, b| a.0.cmp(&b.0));
        Some(Self { base_url, paths })
    }

    /// Resolves a non-relative specifier against `paths`/`baseUrl`. Exact
    /// aliases are tried before wildcard aliases; wildcard matching
    /// substitutes the captured suffix into the replacement's `*`.
    pub fn resolve_alias(&self, specifier: &str) -> Vec<String> {
        for (pattern, replacements) in &self.paths {
            if !pattern.contains('*') {
                if pattern == specifier {
                    return replacements
                        .iter()
                        .map(|r| join(&self.base_url, r))
                        .collect();
                }
                continue;
            }
            let prefix = pattern.trim_end_matches('*');
            if let Some(suffix) = specifier.strip_prefix(prefix) {
                return replacements
                    .iter()
                    .map(|r| join(&self.base_url, &r.replace('*', suffix)))
                    .collect();
            }
        }
        Vec::new()
    }
}

fn join(base_url: &str, rel: &str) -> String {
    if base_url == "." || base_url.is_empty() {
        rel.to_string()
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), rel)
    }
}

/// Strips `//` and `/* */` comments so a JSONC tsconfig parses as plain JSON.
/// Does not attempt to handle comment markers inside string literals that
/// themselves contain `//`, which is rare enough in tsconfig files to accept.
fn strip_jsonc_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => out.push(c),
        }
    }
    out
}
