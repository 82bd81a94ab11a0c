use std::path::{Path, PathBuf};

use git2::{build::RepoBuilder, ErrorClass, ErrorCode, FetchOptions};
use tempfile::TempDir;
use tracing::{info, warn};

use crate::errors::{RepoFetchError, Result};

/// A repository snapshot: a local filesystem root plus the resolved commit.
/// The `TempDir` guard is held for the lifetime of the snapshot; dropping it
/// (or calling `close`) recursively deletes the work directory on every exit
/// path, including an early return or a panic unwind.
pub struct RepoSnapshot {
    dir: TempDir,
    commit_sha: String,
}

impl RepoSnapshot {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn commit_sha(&self) -> &str {
        &self.commit_sha
    }

    /// Explicit cleanup; also happens automatically on drop.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

/// Shallow-clones `repo_url` (single commit) into a scoped temporary
/// directory under `work_dir_root`.
#[tracing::instrument(skip(work_dir_root))]
pub fn shallow_clone(repo_url: &str, work_dir_root: &Path) -> Result<RepoSnapshot> {
    std::fs::create_dir_all(work_dir_root)?;
    let dir = TempDir::new_in(work_dir_root)?;
    info!(path = %dir.path().display(), "starting shallow clone");

    let mut fetch_opts = FetchOptions::new();
    fetch_opts.depth(1);

    let repo = RepoBuilder::new()
        .fetch_options(fetch_opts)
        .clone(repo_url, dir.path())
        .map_err(classify_clone_error)?;

    let head = repo.head().map_err(|_| RepoFetchError::NoHead)?;
    let commit = head.peel_to_commit().map_err(|_| RepoFetchError::NoHead)?;
    let commit_sha = commit.id().to_string();

    info!(commit_sha = %commit_sha, "shallow clone complete");
    Ok(RepoSnapshot {
        dir,
        commit_sha,
    })
}

fn classify_clone_error(err: git2::Error) -> RepoFetchError {
    match (err.class(), err.code()) {
        (ErrorClass::Net, _) => RepoFetchError::Unreachable(err.message().to_string()),
        (_, ErrorCode::Auth) => RepoFetchError::AuthRequired(err.message().to_string()),
        _ => {
            warn!(error = %err, "clone failed");
            RepoFetchError::Git(err)
        }
    }
}

/// Path prefix used for the scoped work directory when no override is given.
pub fn default_work_root() -> PathBuf {
    std::env::temp_dir().join("codegraph-analyzer")
}
