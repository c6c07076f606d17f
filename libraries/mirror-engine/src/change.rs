//! Change detection against the persisted fingerprint.

use crate::error::Result;
use crate::state::StateStore;
use mirror_core::FolderState;
use tracing::debug;

/// Whether the remote tree differs from the last successfully synced state.
///
/// An absent record means "changed": the first run for a target always syncs.
/// Comparison is exact string equality on the fingerprint; no side effects.
pub async fn has_changed(
    state: &dyn StateStore,
    target: &str,
    current: &FolderState,
) -> Result<bool> {
    let previous = state.get_record(target).await?;

    let changed = match &previous {
        None => true,
        Some(record) => record.fingerprint != current.fingerprint,
    };

    debug!(
        target = %target,
        changed,
        first_run = previous.is_none(),
        "Compared fingerprint with persisted state"
    );

    Ok(changed)
}
