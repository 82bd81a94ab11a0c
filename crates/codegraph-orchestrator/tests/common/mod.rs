use git2::{Repository, Signature};
use tempfile::TempDir;

/// Initializes a local git repository with the given files and one commit,
/// so the workflow's shallow clone has something to fetch without touching
/// the network.
pub fn init_local_repo(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    let repo = Repository::init(dir.path()).expect("init repo");

    for (rel_path, content) in files {
        let full = dir.path().join(rel_path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&full, content).expect("write fixture file");
    }

    let mut index = repo.index().expect("repo index");
    index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None).expect("stage files");
    index.write().expect("write index");
    let tree_id = index.write_tree().expect("write tree");
    let tree = repo.find_tree(tree_id).expect("find tree");

    let signature = Signature::now("test", "test@example.com").expect("signature");
    repo.commit(Some("HEAD"), &signature, &signature, "initial commit", &tree, &[])
        .expect("commit");

    dir
}

pub fn repo_url(dir: &TempDir) -> String {
    dir.path().to_string_lossy().to_string()
}

pub async fn wait_for_terminal(
    service: &codegraph_orchestrator::AnalysisService,
    run_id: uuid::Uuid,
) -> codegraph_core::RunStatus {
    // The narrative stage (S2) is a sequential prerequisite and is not
    // subject to the per-run cancellation token (only the S3 fan-out is), so
    // a slow-provider fixture can legitimately take several seconds before
    // the run-level deadline even starts its clock. Budget generously.
    for _ in 0..500 {
        let (status, _, _) = service.status(run_id).await.expect("status lookup");
        if status.is_terminal() {
            return status;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    panic!("run {run_id} did not reach a terminal status in time");
}
