//! Fetch pipeline: recursively mirror a remote folder into a local directory.

use crate::encoding::{self, Normalized};
use crate::error::Result;
use crate::limit::TransferLimiter;
use futures_util::StreamExt;
use mirror_core::{ExportRule, NodeKind, RemoteNode};
use mirror_remote::{list_children, ByteStream, RemoteStore};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Mirror the remote folder `folder_id` into `dest`.
///
/// The walk is iterative: a work queue of `(folder_id, local_dir)` pairs
/// rather than call recursion, so arbitrarily deep trees cannot exhaust the
/// native stack. A folder's children are dispatched only after its own
/// listing completes. File and export transfers from all folders share one
/// task set, bounded by the transfer limiter.
///
/// Any single transfer failure aborts the whole call: remaining transfers are
/// cancelled and the error propagates to the orchestrator. There is no
/// partial-success bookkeeping.
pub async fn materialize(
    remote: Arc<dyn RemoteStore>,
    limiter: TransferLimiter,
    folder_id: &str,
    dest: &Path,
) -> Result<()> {
    let mut queue: VecDeque<(String, PathBuf)> = VecDeque::new();
    queue.push_back((folder_id.to_string(), dest.to_path_buf()));

    let mut transfers: JoinSet<Result<()>> = JoinSet::new();

    while let Some((fid, dir)) = queue.pop_front() {
        tokio::fs::create_dir_all(&dir).await?;

        let children = {
            let _permit = limiter.acquire().await;
            list_children(remote.as_ref(), &fid).await?
        };

        for child in children {
            match child.kind() {
                NodeKind::Folder => {
                    debug!(folder = %child.name, "Descending into sub-folder");
                    queue.push_back((child.id, dir.join(&child.name)));
                }
                NodeKind::Exportable(rule) => {
                    let path = dir.join(format!("{}{}", child.name, rule.extension));
                    transfers.spawn(fetch_export(
                        Arc::clone(&remote),
                        limiter.clone(),
                        child,
                        rule,
                        path,
                    ));
                }
                NodeKind::File => {
                    let path = dir.join(&child.name);
                    transfers.spawn(fetch_file(
                        Arc::clone(&remote),
                        limiter.clone(),
                        child,
                        path,
                    ));
                }
            }
        }
    }

    while let Some(joined) = transfers.join_next().await {
        // First failure wins; dropping the set cancels the rest.
        joined??;
    }

    Ok(())
}

/// Export a virtual document in its configured format and write it locally.
async fn fetch_export(
    remote: Arc<dyn RemoteStore>,
    limiter: TransferLimiter,
    node: RemoteNode,
    rule: &'static ExportRule,
    path: PathBuf,
) -> Result<()> {
    let _permit = limiter.acquire().await;
    debug!(name = %node.name, format = %rule.export_mime, "Exporting virtual document");

    let stream = remote.export(&node.id, rule.export_mime).await?;
    write_content(stream, &path).await
}

/// Download an ordinary file's raw content and write it locally.
async fn fetch_file(
    remote: Arc<dyn RemoteStore>,
    limiter: TransferLimiter,
    node: RemoteNode,
    path: PathBuf,
) -> Result<()> {
    let _permit = limiter.acquire().await;
    debug!(name = %node.name, "Downloading file");

    let stream = remote.download(&node.id).await?;
    write_content(stream, &path).await
}

/// Write fetched content to disk.
///
/// Text assets are buffered so the encoding normalizer can inspect the whole
/// file; everything else streams chunk-by-chunk.
async fn write_content(stream: ByteStream, path: &Path) -> Result<()> {
    if encoding::is_text_asset(path) {
        let bytes = collect(stream).await?;
        let bytes = normalize_best_effort(bytes, path);
        tokio::fs::write(path, &bytes).await?;
        return Ok(());
    }

    let mut file = File::create(path).await?;
    let mut stream = stream;
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;
    Ok(())
}

/// Normalize a text asset, falling back to the raw bytes on any failure.
///
/// Best effort per file: a detection or transcode failure must never abort
/// the run.
fn normalize_best_effort(bytes: Vec<u8>, path: &Path) -> Vec<u8> {
    match encoding::normalize(&bytes, encoding::is_markup(path)) {
        Ok(Normalized::Unchanged) => bytes,
        Ok(Normalized::Transcoded { bytes: out, from }) => {
            debug!(path = %path.display(), from, "Transcoded text asset to UTF-8");
            out
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Encoding normalization failed; writing raw bytes"
            );
            bytes
        }
    }
}

async fn collect(mut stream: ByteStream) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}
