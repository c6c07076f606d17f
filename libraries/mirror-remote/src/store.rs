//! The [`RemoteStore`] trait: the engine's view of the remote file store.

use crate::error::{RemoteError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use mirror_core::RemoteNode;
use std::pin::Pin;

/// Maximum number of items requested per listing page.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Streamed content bytes from an export or download call.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::result::Result<Bytes, RemoteError>> + Send>>;

/// One page of a folder listing.
#[derive(Debug, Clone)]
pub struct ListPage {
    pub items: Vec<RemoteNode>,
    /// Cursor for the next page; `None` when the listing is exhausted.
    pub next_page_token: Option<String>,
}

/// Access to a remote hierarchical file store.
///
/// Implementations must filter logically-deleted (trashed) entries out of
/// listings and project the stable field set carried by [`RemoteNode`].
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Probe read access to a node. Maps a failed probe to
    /// [`RemoteError::Access`] with an actionable message.
    async fn check_access(&self, id: &str) -> Result<()>;

    /// List one page of a folder's direct children (not recursive).
    async fn list_page(&self, parent_id: &str, page_token: Option<&str>) -> Result<ListPage>;

    /// Export a virtual document in the given target format.
    async fn export(&self, id: &str, target_mime: &str) -> Result<ByteStream>;

    /// Fetch the raw content of an ordinary file.
    async fn download(&self, id: &str) -> Result<ByteStream>;
}
