//! Errors that can occur during a sync run.

use crate::publish::PublishError;
use crate::state::StateError;
use mirror_core::{format_mib, ConfigError};
use mirror_remote::RemoteError;
use thiserror::Error;

/// Fatal errors of one sync run. All of them terminate the run; the scoped
/// temporary directory is cleaned up on every path.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The remote folder is not reachable with the run's credentials.
    /// Raised before any size computation.
    #[error(
        "cannot access remote folder {folder_id}: {message}. \
         Ensure the service account has at least \"Viewer\" permission on the folder"
    )]
    Access { folder_id: String, message: String },

    /// Projected size is over the memory budget. Raised before any content
    /// is fetched.
    #[error(
        "total remote size ({}) exceeds 90% of the memory limit ({})",
        format_mib(.total_bytes),
        format_mib(.effective_limit)
    )]
    SizeExceeded {
        total_bytes: u64,
        effective_limit: u64,
    },

    /// A listing, export, or download failed.
    #[error("fetch failed: {0}")]
    Fetch(RemoteError),

    /// The downstream publish step failed.
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),

    /// The persisted state store failed.
    #[error("state store error: {0}")]
    State(#[from] StateError),

    /// Run configuration is unusable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local filesystem error while materializing.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A spawned transfer or snapshot task panicked or was cancelled.
    #[error("background task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Access { folder_id, message } => SyncError::Access { folder_id, message },
            other => SyncError::Fetch(other),
        }
    }
}

/// Result type for sync engine operations.
pub type Result<T> = std::result::Result<T, SyncError>;
