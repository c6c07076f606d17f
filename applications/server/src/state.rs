/// Shared application state
use mirror_engine::SyncManager;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SyncManager>,
    pub sync_secret: String,
    /// Serializes sync runs; a trigger arriving mid-run is rejected instead
    /// of queued.
    pub run_guard: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(manager: Arc<SyncManager>, sync_secret: String) -> Self {
        Self {
            manager,
            sync_secret,
            run_guard: Arc::new(Mutex::new(())),
        }
    }
}
