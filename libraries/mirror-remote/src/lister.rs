//! Complete listing of a folder's direct children.

use crate::error::Result;
use crate::store::RemoteStore;
use mirror_core::RemoteNode;
use tracing::debug;

/// List all direct children of a folder, following pagination cursors until
/// exhausted.
///
/// The caller always sees the complete child set, never a partial page.
/// Access to the folder is checked explicitly first, so an unreachable folder
/// surfaces as [`crate::RemoteError::Access`] instead of a generic listing
/// failure.
pub async fn list_children(store: &dyn RemoteStore, folder_id: &str) -> Result<Vec<RemoteNode>> {
    store.check_access(folder_id).await?;

    let mut children = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = store.list_page(folder_id, page_token.as_deref()).await?;
        children.extend(page.items);

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    debug!(
        folder_id = %folder_id,
        children = children.len(),
        "Listed folder children"
    );

    Ok(children)
}
