//! Test doubles for engine integration tests: an in-memory remote tree, an
//! in-memory state store, and a recording publisher.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures_util::stream;
use mirror_core::{RemoteNode, SyncRecord, TargetConfig, FOLDER_MIME};
use mirror_engine::{PublishError, PublishRequest, Publisher, StateError, StateStore};
use mirror_remote::{ByteStream, ListPage, RemoteError, RemoteStore};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn folder(id: &str, name: &str) -> RemoteNode {
    RemoteNode {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: FOLDER_MIME.to_string(),
        size: None,
        modified_at: "T-folder".to_string(),
    }
}

pub fn file(id: &str, name: &str, size: u64, modified: &str) -> RemoteNode {
    RemoteNode {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: "application/octet-stream".to_string(),
        size: Some(size),
        modified_at: modified.to_string(),
    }
}

pub fn doc(id: &str, name: &str, modified: &str) -> RemoteNode {
    RemoteNode {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: "application/vnd.google-apps.document".to_string(),
        size: None,
        modified_at: modified.to_string(),
    }
}

/// In-memory remote store over a folder → children map, with configurable
/// pagination and per-call counters.
pub struct FakeRemote {
    folders: Mutex<HashMap<String, Vec<RemoteNode>>>,
    content: Mutex<HashMap<String, Vec<u8>>>,
    denied: HashSet<String>,
    page_size: usize,
    pub list_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
    pub export_calls: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            folders: Mutex::new(HashMap::new()),
            content: Mutex::new(HashMap::new()),
            denied: HashSet::new(),
            page_size: usize::MAX,
            list_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
            export_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_folder(self, id: &str, children: Vec<RemoteNode>) -> Self {
        self.folders
            .lock()
            .unwrap()
            .insert(id.to_string(), children);
        self
    }

    pub fn with_content(self, id: &str, bytes: &[u8]) -> Self {
        self.content
            .lock()
            .unwrap()
            .insert(id.to_string(), bytes.to_vec());
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn deny(mut self, id: &str) -> Self {
        self.denied.insert(id.to_string());
        self
    }

    /// Change one child's modification time in place (simulates a remote
    /// edit between two runs).
    pub fn set_modified(&self, folder_id: &str, node_id: &str, modified: &str) {
        let mut folders = self.folders.lock().unwrap();
        let children = folders.get_mut(folder_id).expect("folder exists");
        let child = children
            .iter_mut()
            .find(|c| c.id == node_id)
            .expect("node exists");
        child.modified_at = modified.to_string();
    }

    /// Reverse one folder's listing order (the fingerprint must not notice).
    pub fn reverse_children(&self, folder_id: &str) {
        let mut folders = self.folders.lock().unwrap();
        folders.get_mut(folder_id).expect("folder exists").reverse();
    }

    pub fn content_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst) + self.export_calls.load(Ordering::SeqCst)
    }

    fn stream_for(&self, id: &str) -> Result<ByteStream, RemoteError> {
        let content = self.content.lock().unwrap();
        let Some(data) = content.get(id).cloned() else {
            return Err(RemoteError::Server {
                status: 404,
                message: format!("no content registered for {id}"),
            });
        };
        let chunks: Vec<Result<Bytes, RemoteError>> = data
            .chunks(7)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn check_access(&self, id: &str) -> Result<(), RemoteError> {
        if self.denied.contains(id) {
            Err(RemoteError::Access {
                folder_id: id.to_string(),
                message: "simulated permission failure".to_string(),
            })
        } else {
            Ok(())
        }
    }

    async fn list_page(
        &self,
        parent_id: &str,
        page_token: Option<&str>,
    ) -> Result<ListPage, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let folders = self.folders.lock().unwrap();
        let children = folders.get(parent_id).cloned().unwrap_or_default();

        let start: usize = page_token.map(|t| t.parse().unwrap_or(0)).unwrap_or(0);
        let end = start.saturating_add(self.page_size).min(children.len());
        let next_page_token = (end < children.len()).then(|| end.to_string());

        Ok(ListPage {
            items: children[start..end].to_vec(),
            next_page_token,
        })
    }

    async fn export(&self, id: &str, _target_mime: &str) -> Result<ByteStream, RemoteError> {
        self.export_calls.fetch_add(1, Ordering::SeqCst);
        self.stream_for(id)
    }

    async fn download(&self, id: &str) -> Result<ByteStream, RemoteError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        self.stream_for(id)
    }
}

/// State store over two in-memory maps.
#[derive(Default)]
pub struct MemoryStateStore {
    records: Mutex<HashMap<String, SyncRecord>>,
    configs: Mutex<HashMap<String, TargetConfig>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target_config(self, target: &str, remote_folder: &str) -> Self {
        self.configs.lock().unwrap().insert(
            target.to_string(),
            TargetConfig {
                remote_folder: remote_folder.to_string(),
                updated_at: Utc::now(),
            },
        );
        self
    }

    pub fn fingerprint_for(&self, target: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .get(target)
            .map(|r| r.fingerprint.clone())
    }

    pub fn config_for(&self, target: &str) -> Option<String> {
        self.configs
            .lock()
            .unwrap()
            .get(target)
            .map(|c| c.remote_folder.clone())
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_record(&self, target: &str) -> Result<Option<SyncRecord>, StateError> {
        Ok(self.records.lock().unwrap().get(target).cloned())
    }

    async fn put_record(&self, target: &str, fingerprint: &str) -> Result<(), StateError> {
        self.records.lock().unwrap().insert(
            target.to_string(),
            SyncRecord {
                fingerprint: fingerprint.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get_target_config(&self, target: &str) -> Result<Option<TargetConfig>, StateError> {
        Ok(self.configs.lock().unwrap().get(target).cloned())
    }

    async fn put_target_config(
        &self,
        target: &str,
        remote_folder: &str,
    ) -> Result<(), StateError> {
        self.configs.lock().unwrap().insert(
            target.to_string(),
            TargetConfig {
                remote_folder: remote_folder.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }
}

/// Publisher that records every request and can be told to fail.
#[derive(Default)]
pub struct RecordingPublisher {
    pub calls: Mutex<Vec<PublishRequest>>,
    pub fail: bool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<PublishRequest> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<(), PublishError> {
        assert!(
            request.source_dir.is_dir(),
            "publish must receive an existing directory"
        );
        self.calls.lock().unwrap().push(request.clone());
        if self.fail {
            Err(PublishError::Other("simulated publish failure".to_string()))
        } else {
            Ok(())
        }
    }
}
