use thiserror::Error;

pub type Result<T> = std::result::Result<T, RepoFetchError>;

#[derive(Debug, Error)]
pub enum RepoFetchError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Remote unreachable: {0}")]
    Unreachable(String),

    #[error("Authentication required for {0}")]
    AuthRequired(String),

    #[error("Repository has no HEAD commit")]
    NoHead,
}
