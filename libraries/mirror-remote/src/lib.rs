//! Remote file-store access for drive-mirror.
//!
//! The [`RemoteStore`] trait is the seam between the sync engine and the
//! remote hierarchical store: an access probe, paginated listing of a
//! folder's direct children, virtual-document export, and raw content
//! download. [`DriveClient`] is the production HTTP implementation;
//! credential acquisition stays behind the [`TokenProvider`] seam.

mod error;
mod http;
mod lister;
mod store;

pub use error::{RemoteError, Result};
pub use http::{DriveClient, StaticTokenProvider, TokenProvider, DEFAULT_BASE_URL};
pub use lister::list_children;
pub use store::{ByteStream, ListPage, RemoteStore, MAX_PAGE_SIZE};
