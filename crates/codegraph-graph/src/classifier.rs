use std::collections::HashMap;

use codegraph_core::{DependencyAnalysis, Edge, ExternalPackageUse, GraphEdgeRecord};

/// Case-insensitive substring token tables, checked in priority order (first
/// match wins); adding a token must not reorder categories.
const FRONTEND_FRAMEWORK_TOKENS: &[&str] =
    &["react", "vue", "svelte", "angular", "solid-js", "preact"];
const WEB_FRAMEWORK_TOKENS: &[&str] = &[
    "express", "fastify", "koa", "nestjs", "django", "flask", "fastapi", "next", "nuxt",
];
const DATABASE_TOKENS: &[&str] = &[
    "mongoose", "sequelize", "prisma", "typeorm", "sqlalchemy", "psycopg", "pymongo", "redis",
    "postgres", "mysql", "sqlite",
];
const TESTING_TOKENS: &[&str] = &[
    "jest", "mocha", "chai", "pytest", "unittest", "vitest", "cypress", "playwright", "testing-library",
];
const BUILD_TOOL_TOKENS: &[&str] = &[
    "webpack", "vite", "rollup", "esbuild", "babel", "tsc", "setuptools", "poetry", "parcel",
];
const UI_LIBRARY_TOKENS: &[&str] = &[
    "material-ui", "@mui", "antd", "bootstrap", "tailwind", "chakra", "styled-components",
];

/// Partitions all edges into internal and external-by-category, computing
/// the summary counts. The partition is total: every
/// edge lands in exactly one of {internal, one external category}.
pub fn classify(edges: &[Edge]) -> DependencyAnalysis {
    let mut internal_edges = Vec::new();
    let mut external_groups: HashMap<String, Vec<ExternalPackageUse>> = HashMap::new();
    let mut internal_count = 0usize;
    let mut external_count = 0usize;

    for edge in edges {
        if edge.internal {
            internal_count += 1;
            internal_edges.push(GraphEdgeRecord {
                source: edge.source.clone(),
                destination: edge.destination.clone(),
            });
        } else {
            external_count += 1;
            let category = categorize(&edge.destination);
            external_groups
                .entry(category.to_string())
                .or_default()
                .push(ExternalPackageUse {
                    source_file: edge.source.clone(),
                    package: edge.destination.clone(),
                });
        }
    }

    DependencyAnalysis {
        internal_edges,
        external_groups,
        internal_count,
        external_count,
    }
}

fn categorize(package: &str) -> &'static str {
    let lower = package.to_lowercase();
    if FRONTEND_FRAMEWORK_TOKENS.iter().any(|t| lower.contains(t)) {
        return "Frontend Frameworks";
    }
    if WEB_FRAMEWORK_TOKENS.iter().any(|t| lower.contains(t)) {
        return "Web Frameworks";
    }
    if DATABASE_TOKENS.iter().any(|t| lower.contains(t)) {
        return "Databases";
    }
    if TESTING_TOKENS.iter().any(|t| lower.contains(t)) {
        return "Testing";
    }
    if BUILD_TOOL_TOKENS.iter().any(|t| lower.contains(t)) {
        return "Build Tools";
    }
    if UI_LIBRARY_TOKENS.iter().any(|t| lower.contains(t)) {
        return "UI Libraries";
    }
    if lower.starts_with("@types/") {
        return "Type Definitions";
    }
    if lower.starts_with('@') {
        return "Scoped Packages";
    }
    "External Libraries"
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::ExtractorTag;

    fn ext_edge(dst: &str) -> Edge {
        Edge {
            source: "app.ts".to_string(),
            destination: dst.to_string(),
            internal: false,
            extractor: ExtractorTag::TsJsPrimary,
        }
    }

    #[test]
    fn react_classifies_as_frontend_framework() {
        let analysis = classify(&[ext_edge("react")]);
        assert!(analysis.external_groups.contains_key("Frontend Frameworks"));
    }

    #[test]
    fn types_prefix_wins_before_scoped() {
        let analysis = classify(&[ext_edge("@types/node")]);
        assert!(analysis.external_groups.contains_key("Type Definitions"));
        assert!(!analysis.external_groups.contains_key("Scoped Packages"));
    }

    #[test]
    fn partition_is_total() {
        let edges = vec![ext_edge("react"), ext_edge("left-pad")];
        let analysis = classify(&edges);
        let total: usize = analysis.external_groups.values().map(|v| v.len()).sum();
        assert_eq!(total, edges.len());
    }
}
