use codegraph_core::AnalyzerConfig;
use codegraph_parser::{extract_all, scan_repository};

/// Minimal python package.
#[test]
fn minimal_python_package_produces_one_internal_edge() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = dir.path().join("pkg");
    std::fs::create_dir_all(&pkg).unwrap();
    std::fs::write(pkg.join("__init__.py"), "").unwrap();
    std::fs::write(pkg.join("a.py"), "from pkg import b\n").unwrap();
    std::fs::write(pkg.join("b.py"), "").unwrap();

    let config = AnalyzerConfig::default();
    let scan = scan_repository(dir.path(), &config).unwrap();
    assert_eq!(scan.files.len(), 3);
    assert_eq!(scan.language_stats.get("python"), Some(&100.0));

    let edges = extract_all(dir.path(), &scan.files);
    let internal: Vec<_> = edges.iter().filter(|e| e.internal).collect();
    let external: Vec<_> = edges.iter().filter(|e| !e.internal).collect();
    assert_eq!(internal.len(), 1);
    assert_eq!(external.len(), 0);
    assert_eq!(internal[0].source, "pkg/a.py");
    assert_eq!(internal[0].destination, "pkg/b.py");
}
