use codegraph_core::AnalyzerConfig;
use codegraph_parser::{extract_all, scan_repository};

/// Mixed JS/TS with a tsconfig path alias.
#[test]
fn tsconfig_alias_resolves_to_internal_edge_and_react_is_external() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("tsconfig.json"),
        r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "@/*": ["src/*"] } } }"#,
    )
    .unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(
        src.join("app.ts"),
        "import { x } from \"@/util\";\nimport React from \"react\";\n",
    )
    .unwrap();
    std::fs::write(src.join("util.ts"), "export const x = 1;\n").unwrap();

    let config = AnalyzerConfig::default();
    let scan = scan_repository(dir.path(), &config).unwrap();
    let edges = extract_all(dir.path(), &scan.files);

    let internal = edges
        .iter()
        .find(|e| e.internal && e.source == "src/app.ts")
        .expect("internal edge to src/util.ts");
    assert_eq!(internal.destination, "src/util.ts");

    let external = edges
        .iter()
        .find(|e| !e.internal && e.source == "src/app.ts")
        .expect("external edge to react");
    assert_eq!(external.destination, "react");
}
