//! Sync orchestrator: one run per invocation, terminal on first error.

use crate::budget::check_budget;
use crate::change::has_changed;
use crate::error::{Result, SyncError};
use crate::fetch::materialize;
use crate::limit::TransferLimiter;
use crate::publish::{PublishRequest, Publisher};
use crate::snapshot::compute_folder_state;
use crate::state::StateStore;
use mirror_core::{parse_folder_id_from_url, ConfigError, SyncConfig, SyncOutcome, SyncSummary};
use mirror_remote::RemoteStore;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Sequences one sync cycle:
/// resolve remote folder → snapshot → compare → budget → materialize →
/// publish → persist fingerprint.
///
/// Every collaborator is held explicitly; no state survives between runs
/// except what the state store persists. There is no mid-run cancellation and
/// no partial-progress resume: a failure after materialization has begun
/// means a full re-run on the next trigger.
pub struct SyncManager {
    remote: Arc<dyn RemoteStore>,
    state: Arc<dyn StateStore>,
    publisher: Arc<dyn Publisher>,
    config: SyncConfig,
}

impl SyncManager {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        state: Arc<dyn StateStore>,
        publisher: Arc<dyn Publisher>,
        config: SyncConfig,
    ) -> Self {
        Self {
            remote,
            state,
            publisher,
            config,
        }
    }

    /// Run one sync cycle.
    pub async fn run_sync(&self) -> Result<SyncOutcome> {
        match self.run_inner().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(
                    target = %self.config.target,
                    error = %e,
                    "Sync run failed"
                );
                Err(e)
            }
        }
    }

    async fn run_inner(&self) -> Result<SyncOutcome> {
        let started = std::time::Instant::now();
        let target = self.config.target.clone();

        let folder_id = self.resolve_remote_folder(&target).await?;
        info!(target = %target, folder_id = %folder_id, "Starting sync run");

        let limiter = TransferLimiter::new(self.config.max_in_flight);
        let current =
            compute_folder_state(Arc::clone(&self.remote), limiter.clone(), &folder_id).await?;
        debug!(
            total_size = current.total_size,
            "Computed remote folder state"
        );

        if !has_changed(self.state.as_ref(), &target, &current).await? {
            info!(target = %target, "No changes detected; skipping publish");
            return Ok(SyncOutcome::Unchanged);
        }
        info!(target = %target, total_bytes = current.total_size, "Changes detected");

        // Pre-flight budget check: must complete before any content fetch.
        let memory_limit = self.config.memory_limit_bytes()?;
        check_budget(current.total_size, memory_limit)?;

        // Scoped temporary root for the whole mirrored tree; removed on every
        // exit path when dropped.
        let temp_root = tempfile::Builder::new()
            .prefix("drive-mirror-")
            .tempdir()?;
        debug!(path = %temp_root.path().display(), "Created temporary mirror root");

        materialize(
            Arc::clone(&self.remote),
            limiter,
            &folder_id,
            temp_root.path(),
        )
        .await?;
        info!(target = %target, "Mirrored remote tree; publishing");

        self.publisher
            .publish(&PublishRequest {
                project_id: self.config.project_id.clone(),
                target: target.clone(),
                source_dir: temp_root.path().to_path_buf(),
            })
            .await?;

        // Only after a successful publish does the new fingerprint become the
        // last-known-good state.
        self.state.put_record(&target, &current.fingerprint).await?;

        let summary = SyncSummary {
            target: target.clone(),
            fingerprint: current.fingerprint,
            total_bytes: current.total_size,
            duration_seconds: started.elapsed().as_secs(),
        };
        info!(
            target = %target,
            total_bytes = summary.total_bytes,
            duration_seconds = summary.duration_seconds,
            "Sync run complete"
        );

        Ok(SyncOutcome::Published(summary))
    }

    /// Resolve which remote folder this target mirrors.
    ///
    /// The persisted per-target config wins; on its absence the statically
    /// configured default is used and backfilled into the store.
    async fn resolve_remote_folder(&self, target: &str) -> Result<String> {
        if let Some(stored) = self.state.get_target_config(target).await? {
            return parse_folder_id_from_url(&stored.remote_folder).ok_or_else(|| {
                SyncError::Config(ConfigError::InvalidFolderUrl(stored.remote_folder))
            });
        }

        let folder_id = parse_folder_id_from_url(&self.config.folder_url).ok_or_else(|| {
            SyncError::Config(ConfigError::InvalidFolderUrl(self.config.folder_url.clone()))
        })?;

        debug!(target = %target, "Backfilling target config with default folder");
        self.state
            .put_target_config(target, &self.config.folder_url)
            .await?;

        Ok(folder_id)
    }
}
