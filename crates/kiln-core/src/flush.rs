//! Page-data flush scheduling.
//!
//! A flush writes the artifacts of every template in the store's pending set.
//! Flushes are guarded by their own [`RunGate`]: at most one runs at a time,
//! and any number of requests made while one is running collapse into a
//! single follow-up flush.

use crate::error::Result;
use crate::gate::RunGate;
use crate::store::{StateStore, StoreAction};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Derived artifact for one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    /// Template the artifact belongs to
    pub component_path: String,
    /// Pages rendered by the template
    pub pages: Vec<String>,
    /// Static query hashes the template depends on
    pub static_query_hashes: BTreeSet<String>,
}

/// Durable sink for artifacts. Writes must be idempotent.
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    async fn write(&self, record: &ArtifactRecord) -> Result<()>;
}

/// Outcome of one flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub written: usize,
    pub failed: usize,
}

/// Coalescing page-data flusher.
pub struct FlushScheduler {
    lock: Arc<RunGate>,
    store: Arc<dyn StateStore>,
    writer: Arc<dyn ArtifactWriter>,
    workers: Handle,
    flushes: AtomicU64,
}

impl FlushScheduler {
    /// Create a scheduler guarded by `lock`.
    ///
    /// # Arguments
    ///
    /// * `lock` - Gate serializing flushes (owned by the coordinator)
    /// * `store` - Source of the pending set
    /// * `writer` - Artifact sink
    /// * `workers` - Runtime flushes run on
    pub fn new(
        lock: Arc<RunGate>,
        store: Arc<dyn StateStore>,
        writer: Arc<dyn ArtifactWriter>,
        workers: Handle,
    ) -> Self {
        Self {
            lock,
            store,
            writer,
            workers,
            flushes: AtomicU64::new(0),
        }
    }

    /// The gate guarding flushes.
    pub fn lock(&self) -> &Arc<RunGate> {
        &self.lock
    }

    /// Request a flush.
    ///
    /// Starts one right away when none is running; otherwise the request is
    /// folded into the single follow-up flush.
    pub fn enqueue(self: &Arc<Self>) {
        let this = Arc::clone(self);
        self.lock.run_or_enqueue(move || this.spawn_flush());
    }

    fn spawn_flush(self: Arc<Self>) {
        let workers = self.workers.clone();
        workers.spawn(async move {
            let _release = EndRunOnDrop(Arc::clone(&self.lock));
            let report = self.flush_now().await;
            if report.written > 0 || report.failed > 0 {
                info!(written = report.written, failed = report.failed, "flushed page data");
            }
        });
    }

    /// Write every pending template once.
    ///
    /// Successful writes are acknowledged to the store with the hashes they
    /// wrote; failures stay pending for the next flush.
    pub async fn flush_now(&self) -> FlushReport {
        let run = self.flushes.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = self.store.snapshot();
        let mut report = FlushReport::default();

        debug!(run, pending = snapshot.pending_template_writes.len(), "flush started");

        for component_path in &snapshot.pending_template_writes {
            let record = ArtifactRecord {
                component_path: component_path.clone(),
                pages: snapshot.pages_of(component_path),
                static_query_hashes: snapshot
                    .static_queries_by_template
                    .get(component_path)
                    .cloned()
                    .unwrap_or_default(),
            };

            match self.writer.write(&record).await {
                Ok(()) => {
                    self.store.dispatch(StoreAction::ClearPendingTemplateDataWrite {
                        component_path: record.component_path,
                        static_query_hashes: record.static_query_hashes,
                    });
                    report.written += 1;
                }
                Err(e) => {
                    warn!(component = %component_path, error = %e, "failed to write page data");
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Number of flushes started so far.
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Check whether no flush is running or queued.
    pub fn is_idle(&self) -> bool {
        self.lock.is_idle()
    }
}

/// Ends the flush run however the flush task finishes, a panicking writer
/// included, so queued flushes still get their turn.
struct EndRunOnDrop(Arc<RunGate>);

impl Drop for EndRunOnDrop {
    fn drop(&mut self) {
        if std::thread::panicking() {
            warn!(gate = self.0.name(), "flush panicked, releasing the gate");
        }
        self.0.mark_end_run();
    }
}
