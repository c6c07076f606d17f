//! Error types for remote store access.

use thiserror::Error;

/// Errors that can occur while talking to the remote file store.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// HTTP request failed before a response was obtained
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The folder is not reachable with the caller's credentials
    #[error(
        "cannot access remote folder {folder_id}: {message}. \
         Ensure the service account has at least \"Viewer\" permission on the folder"
    )]
    Access { folder_id: String, message: String },

    /// The remote store returned an error response
    #[error("remote store error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Failed to parse a listing response
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// IO error while consuming a content stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for remote store operations.
pub type Result<T> = std::result::Result<T, RemoteError>;
