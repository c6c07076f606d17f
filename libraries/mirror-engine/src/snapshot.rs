//! Snapshot builder: recursive aggregation of subtree size and fingerprint.

use crate::error::Result;
use crate::limit::TransferLimiter;
use futures_util::future::BoxFuture;
use mirror_core::{FolderState, NodeKind};
use mirror_remote::{list_children, RemoteStore};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;

/// Delimiter joining fingerprint parts. Fixed: changing it would invalidate
/// every persisted fingerprint.
const PART_DELIMITER: &str = "|";

/// Compute the [`FolderState`] of a folder subtree.
///
/// Direct children are listed once; sub-folder states are computed in
/// parallel and combined commutatively, so fan-out order never affects the
/// result. Leaf nodes contribute their byte size (unknown size counts as 0,
/// e.g. un-materialized virtual documents) and one `"<id>:<modified_at>"`
/// part; each sub-folder contributes its whole fingerprint as one part. The
/// final lexicographic sort of the combined parts is what makes the
/// fingerprint independent of listing order and pagination boundaries.
pub async fn compute_folder_state(
    remote: Arc<dyn RemoteStore>,
    limiter: TransferLimiter,
    folder_id: &str,
) -> Result<FolderState> {
    compute_inner(remote, limiter, folder_id.to_string()).await
}

fn compute_inner(
    remote: Arc<dyn RemoteStore>,
    limiter: TransferLimiter,
    folder_id: String,
) -> BoxFuture<'static, Result<FolderState>> {
    Box::pin(async move {
        let children = {
            let _permit = limiter.acquire().await;
            list_children(remote.as_ref(), &folder_id).await?
        };

        let mut subtasks: JoinSet<Result<FolderState>> = JoinSet::new();
        for child in &children {
            if child.kind() == NodeKind::Folder {
                subtasks.spawn(compute_inner(
                    Arc::clone(&remote),
                    limiter.clone(),
                    child.id.clone(),
                ));
            }
        }

        let mut total_size: u64 = 0;
        let mut parts: Vec<String> = Vec::new();

        for leaf in children.iter().filter(|c| c.kind() != NodeKind::Folder) {
            total_size += leaf.size.unwrap_or(0);
            parts.push(leaf.fingerprint_part());
        }

        // Unordered join: sub-folder results combine commutatively.
        while let Some(joined) = subtasks.join_next().await {
            let state = joined??;
            total_size += state.total_size;
            parts.push(state.fingerprint);
        }

        parts.sort();
        let fingerprint = parts.join(PART_DELIMITER);

        debug!(folder_id = %folder_id, total_size, parts = parts.len(), "Computed folder state");

        Ok(FolderState {
            total_size,
            fingerprint,
        })
    })
}
