use std::path::PathBuf;
use thiserror::Error;

/// Core error type for stowage operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read manifest at {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest at {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Workspace root not found from {start}")]
    WorkspaceNotFound { start: PathBuf },

    #[error("No workspaces declared in {path}")]
    NoWorkspaces { path: PathBuf },

    #[error("git failed: {message}")]
    Git { message: String },
}
