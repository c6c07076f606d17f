//! Shared types for the drive-mirror sync engine.
//!
//! Everything here is plain data: the node model produced by remote listings,
//! the recursively computed folder state used for change detection, the
//! persisted record shapes, and the configuration values threaded through
//! every operation.

mod config;
mod types;

pub use config::{
    format_mib, parse_folder_id_from_url, parse_memory_to_bytes, ConfigError, SyncConfig,
};
pub use types::{
    export_rule_for, ExportRule, FolderState, NodeKind, RemoteNode, SyncOutcome, SyncRecord,
    SyncSummary, TargetConfig, EXPORT_RULES, FOLDER_MIME,
};
