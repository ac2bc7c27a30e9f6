//! Shared state for the develop server.
//!
//! The server exists before the develop session does, so the live-update
//! notifier is filled in later through [`ServerAttachment`].

use kiln_core::{CompileStatus, LiveEvent, LiveUpdateNotifier, ServerAttachment, StateStore};
use parking_lot::RwLock;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Answer of the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub compile_status: CompileStatus,
    pub templates: usize,
    pub pages: usize,
    pub pending_writes: usize,
    pub live_updates: bool,
    pub connections: usize,
}

pub struct DevServerState {
    /// Directory served as the site root
    out_dir: PathBuf,
    store: Arc<dyn StateStore>,
    notifier: RwLock<Option<LiveUpdateNotifier>>,
    /// SSE connections opened so far
    connections: AtomicUsize,
}

impl DevServerState {
    pub fn new(out_dir: PathBuf, store: Arc<dyn StateStore>) -> Self {
        Self {
            out_dir,
            store,
            notifier: RwLock::new(None),
            connections: AtomicUsize::new(0),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn is_attached(&self) -> bool {
        self.notifier.read().is_some()
    }

    /// Subscribe a new client to live updates, if the session is attached.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<LiveEvent>> {
        let rx = self.notifier.read().as_ref()?.subscribe();
        self.connections.fetch_add(1, Ordering::Relaxed);
        Some(rx)
    }

    pub fn status(&self) -> StatusReport {
        let snapshot = self.store.snapshot();
        StatusReport {
            compile_status: snapshot.compile_status,
            templates: snapshot.components.len(),
            pages: snapshot.components.values().map(|pages| pages.len()).sum(),
            pending_writes: snapshot.pending_template_writes.len(),
            live_updates: self.is_attached(),
            connections: self.connections.load(Ordering::Relaxed),
        }
    }
}

impl ServerAttachment for DevServerState {
    fn attach(&self, notifier: LiveUpdateNotifier) {
        *self.notifier.write() = Some(notifier);
    }
}

/// Shared state handle for passing around the application.
pub type SharedState = Arc<DevServerState>;
