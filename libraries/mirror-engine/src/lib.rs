//! Snapshot/diff engine and recursive fetch pipeline for drive-mirror.
//!
//! One sync run: compute a change-fingerprint for the whole remote tree,
//! compare it with the last persisted one, enforce the memory budget, mirror
//! the tree into a scoped temporary directory (normalizing legacy text
//! encodings on the way), hand the directory to the publish collaborator, and
//! persist the new fingerprint. [`SyncManager`] sequences the steps; every
//! collaborator is an explicit trait object, never ambient state.

mod budget;
mod change;
mod encoding;
mod error;
mod fetch;
mod limit;
mod manager;
mod publish;
mod snapshot;
mod state;

pub use budget::{check_budget, effective_limit, SAFETY_MARGIN_PERCENT};
pub use change::has_changed;
pub use encoding::{is_text_asset, normalize, EncodingError, Normalized, CONFIDENCE_THRESHOLD};
pub use error::{Result, SyncError};
pub use fetch::materialize;
pub use limit::TransferLimiter;
pub use manager::SyncManager;
pub use publish::{CommandPublisher, PublishError, PublishRequest, Publisher};
pub use snapshot::compute_folder_state;
pub use state::{SqliteStateStore, StateError, StateStore};
