//! Publish collaborator seam.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// What the publish collaborator receives: a flat static-asset root plus the
/// project/target it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub project_id: String,
    pub target: String,
    pub source_dir: PathBuf,
}

/// Failures of the downstream publish step.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("publish command exited with status {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },

    #[error("failed to launch publish command: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Makes a local directory publicly servable. The mirror engine never cares
/// how.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, request: &PublishRequest) -> Result<(), PublishError>;
}

/// Publisher that shells out to a deploy CLI.
///
/// The configured argv may contain the placeholders `{project}`, `{target}`
/// and `{dir}`, substituted per request. The command runs with the source
/// directory as its working directory.
pub struct CommandPublisher {
    argv: Vec<String>,
}

impl CommandPublisher {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    fn substituted(&self, request: &PublishRequest) -> Vec<String> {
        self.argv
            .iter()
            .map(|arg| {
                arg.replace("{project}", &request.project_id)
                    .replace("{target}", &request.target)
                    .replace("{dir}", &request.source_dir.to_string_lossy())
            })
            .collect()
    }
}

#[async_trait]
impl Publisher for CommandPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<(), PublishError> {
        let argv = self.substituted(request);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| PublishError::Other("publish command is empty".to_string()))?;

        debug!(command = ?argv, dir = %request.source_dir.display(), "Running publish command");

        let output = tokio::process::Command::new(program)
            .args(args)
            .current_dir(&request.source_dir)
            .output()
            .await?;

        if !output.status.success() {
            return Err(PublishError::CommandFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        info!(target = %request.target, "Publish complete");
        Ok(())
    }
}
