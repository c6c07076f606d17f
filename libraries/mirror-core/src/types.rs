//! Data model for remote listings, folder snapshots, and persisted records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MIME type marking a remote entry as a folder.
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// One direct child of a remote folder, as projected by a listing call.
///
/// Never mutated after the listing produces it. `size` is `None` for
/// un-materialized virtual documents, which have no fixed byte size until
/// exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNode {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: Option<u64>,
    /// Modification timestamp as reported by the remote store (RFC 3339).
    /// Kept verbatim: the fingerprint is built from the raw string.
    pub modified_at: String,
}

impl RemoteNode {
    /// Classify this node for dispatch in the fetch pipeline.
    pub fn kind(&self) -> NodeKind {
        if self.mime_type == FOLDER_MIME {
            NodeKind::Folder
        } else if let Some(rule) = export_rule_for(&self.mime_type) {
            NodeKind::Exportable(rule)
        } else {
            NodeKind::File
        }
    }

    /// Fingerprint part for this leaf node: `"<id>:<modified_at>"`.
    ///
    /// Name and path are deliberately excluded, so a rename with an unchanged
    /// id and modification time does not change the fingerprint.
    pub fn fingerprint_part(&self) -> String {
        format!("{}:{}", self.id, self.modified_at)
    }
}

/// Node classification used by the snapshot builder and fetch pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    Exportable(&'static ExportRule),
    File,
}

/// Recursively computed summary of a folder subtree.
///
/// `total_size` is the sum of `size` over every non-folder descendant.
/// `fingerprint` is a pure, order-independent function of the multiset of
/// `(id, modified_at)` pairs across the whole subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderState {
    pub total_size: u64,
    pub fingerprint: String,
}

/// Last-known-good state for one sync target, persisted externally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub fingerprint: String,
    pub updated_at: DateTime<Utc>,
}

/// Persisted per-target configuration: which remote folder to mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub remote_folder: String,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of one orchestrated sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    /// Remote tree unchanged since the last successful run; nothing fetched.
    Unchanged,
    /// Remote tree changed; it was mirrored and published.
    Published(SyncSummary),
}

/// Summary of a completed mirror-and-publish cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub target: String,
    pub fingerprint: String,
    pub total_bytes: u64,
    pub duration_seconds: u64,
}

/// Mapping from a virtual-document MIME type to its export format.
#[derive(Debug, PartialEq, Eq)]
pub struct ExportRule {
    pub source_mime: &'static str,
    pub export_mime: &'static str,
    pub extension: &'static str,
}

/// Closed table of exportable virtual-document kinds.
///
/// Extending support for another kind (e.g. presentations as PDF) is a matter
/// of adding a row here; traversal logic never changes.
pub const EXPORT_RULES: &[ExportRule] = &[
    ExportRule {
        source_mime: "application/vnd.google-apps.document",
        export_mime: "text/html",
        extension: ".html",
    },
    ExportRule {
        source_mime: "application/vnd.google-apps.spreadsheet",
        export_mime: "text/csv",
        extension: ".csv",
    },
];

/// Look up the export rule for a virtual-document MIME type.
pub fn export_rule_for(mime_type: &str) -> Option<&'static ExportRule> {
    EXPORT_RULES.iter().find(|r| r.source_mime == mime_type)
}
