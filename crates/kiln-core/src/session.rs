//! The develop build session.
//!
//! A [`BuildSession`] observes one compiler and turns its lifecycle events
//! into activity tracking, static query updates, page-data flushes and live
//! update notifications. It is registered with the compiler as a
//! [`CompilerObserver`] and never reaches into the compiler beyond
//! pause/resume.
//!
//! # Round lifecycle
//!
//! ```text
//! invalid ──► open activity, status Pending, debounce(resume)
//!             (activity already open: restart a resume still waiting)
//! watch_run ─► open activity if none is open
//! done ─────► first-build side effects (first successful round only)
//!             close activity (failed or not)
//!             diff static queries          (successful rounds only)
//!             pause compiler, end compile run, enqueue flush
//!             resolve readiness             (first done only)
//! ```

use crate::activity::{
    structure_errors, BuildActivity, Reporter, Stage, DEVELOP_ACTIVITY_ID,
};
use crate::compiler::{BuildStats, Compiler, CompilerObserver};
use crate::debounce::Debouncer;
use crate::differ::static_query_changes;
use crate::flush::FlushScheduler;
use crate::gate::RunGate;
use crate::notifier::{LiveEvent, LiveUpdateNotifier};
use crate::program::{BrowserLauncher, DevelopUrls};
use crate::store::{CompileStatus, StateStore, StoreAction};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Coarse state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No activity open and no compile run active
    Idle,
    /// The compiler has been resumed but no activity is open yet
    Watching,
    /// An activity is open
    Compiling,
}

/// Everything a session needs, handed over at construction.
pub struct SessionParts {
    pub compiler: Arc<dyn Compiler>,
    pub store: Arc<dyn StateStore>,
    pub run_lock: Arc<RunGate>,
    pub flush: Arc<FlushScheduler>,
    pub reporter: Arc<dyn Reporter>,
    pub browser: Arc<dyn BrowserLauncher>,
    pub notifier: LiveUpdateNotifier,
    pub urls: DevelopUrls,
    pub open_browser: bool,
    pub debounce: Duration,
    pub workers: Handle,
}

/// Observer driving one compiler's watch lifecycle.
pub struct BuildSession {
    store: Arc<dyn StateStore>,
    compiler: Arc<dyn Compiler>,
    run_lock: Arc<RunGate>,
    flush: Arc<FlushScheduler>,
    reporter: Arc<dyn Reporter>,
    browser: Arc<dyn BrowserLauncher>,
    notifier: LiveUpdateNotifier,
    urls: DevelopUrls,
    open_browser: bool,
    resume: Debouncer,
    activity: Mutex<Option<BuildActivity>>,
    first_build: AtomicBool,
    ready: Mutex<Option<oneshot::Sender<()>>>,
    activities_opened: AtomicU64,
    rounds: AtomicU64,
}

impl BuildSession {
    /// Build a session.
    ///
    /// The returned receiver resolves when the first `done` event has been
    /// processed. The caller still has to register the session with the
    /// compiler via [`Compiler::subscribe`].
    pub fn new(parts: SessionParts) -> (Arc<Self>, oneshot::Receiver<()>) {
        let (ready_tx, ready_rx) = oneshot::channel();

        let resume = {
            let run_lock = Arc::clone(&parts.run_lock);
            let compiler = Arc::clone(&parts.compiler);
            let workers = parts.workers.clone();
            Debouncer::new(parts.debounce, parts.workers.clone(), move || {
                let compiler = Arc::clone(&compiler);
                let workers = workers.clone();
                run_lock.run_or_enqueue(move || {
                    debug!("resuming compiler");
                    workers.spawn(async move { compiler.resume_watch().await });
                });
            })
        };

        let session = Arc::new(Self {
            store: parts.store,
            compiler: parts.compiler,
            run_lock: parts.run_lock,
            flush: parts.flush,
            reporter: parts.reporter,
            browser: parts.browser,
            notifier: parts.notifier,
            urls: parts.urls,
            open_browser: parts.open_browser,
            resume,
            activity: Mutex::new(None),
            first_build: AtomicBool::new(true),
            ready: Mutex::new(Some(ready_tx)),
            activities_opened: AtomicU64::new(0),
            rounds: AtomicU64::new(0),
        });

        (session, ready_rx)
    }

    /// Current coarse state.
    pub fn state(&self) -> SessionState {
        if self.activity.lock().is_some() {
            SessionState::Compiling
        } else if self.run_lock.is_idle() {
            SessionState::Idle
        } else {
            SessionState::Watching
        }
    }

    /// Check whether an activity is open.
    pub fn is_compiling(&self) -> bool {
        self.activity.lock().is_some()
    }

    /// Number of activities opened so far.
    pub fn activities_opened(&self) -> u64 {
        self.activities_opened.load(Ordering::SeqCst)
    }

    /// Number of `done` events processed so far.
    pub fn rounds_completed(&self) -> u64 {
        self.rounds.load(Ordering::SeqCst)
    }

    /// The gate guarding compiler resumes.
    pub fn run_lock(&self) -> &Arc<RunGate> {
        &self.run_lock
    }

    /// The page-data flush scheduler.
    pub fn flush(&self) -> &Arc<FlushScheduler> {
        &self.flush
    }

    /// Open an activity unless one is already open. Returns whether it did.
    fn open_activity(&self) -> bool {
        let mut slot = self.activity.lock();
        if slot.is_some() {
            return false;
        }
        let mut activity = BuildActivity::new(DEVELOP_ACTIVITY_ID);
        activity.start(self.reporter.as_ref());
        *slot = Some(activity);
        self.activities_opened.fetch_add(1, Ordering::SeqCst);
        true
    }

    async fn first_build_side_effects(&self) {
        if self.open_browser {
            if let Err(e) = self.browser.open(&self.urls.local_for_browser).await {
                warn!(error = %e, "could not open the browser, visit the URL manually");
            }
        }
        self.reporter.onboarding(&self.urls);
    }

    fn close_activity(&self, stats: &BuildStats, successful: bool) {
        let Some(mut activity) = self.activity.lock().take() else {
            return;
        };

        if stats.has_warnings() {
            self.reporter.warnings(&stats.warnings);
        }
        if !successful {
            let errors = structure_errors(Stage::Develop, &stats.errors);
            activity.panic_on_build(errors, self.reporter.as_ref());
        }
        activity.end(self.reporter.as_ref());
    }

    fn update_static_queries(&self, stats: &BuildStats) {
        let snapshot = self.store.snapshot();
        let changes = static_query_changes(&snapshot, &stats.graph);
        if changes.is_empty() {
            return;
        }

        let templates: Vec<String> = changes
            .iter()
            .filter_map(|action| match action {
                StoreAction::SetStaticQueriesByTemplate { component_path, .. } => {
                    Some(component_path.clone())
                }
                _ => None,
            })
            .collect();
        debug!(?templates, "static queries changed");

        for action in changes {
            self.store.dispatch(action);
        }
        self.notifier.send(LiveEvent::StaticQueriesChanged { templates });
    }
}

#[async_trait]
impl CompilerObserver for BuildSession {
    fn on_invalid(&self) {
        if !self.open_activity() {
            // Same burst: push the resume back while it is still waiting
            if self.resume.restart_pending() {
                debug!("invalidation extended the pending resume");
            }
            return;
        }
        self.store
            .dispatch(StoreAction::SetCompileStatus(CompileStatus::Pending));
        self.resume.trigger();
    }

    async fn on_watch_run(&self) {
        self.open_activity();
        self.store
            .dispatch(StoreAction::SetCompileStatus(CompileStatus::InProgress));
        self.notifier.send(LiveEvent::BuildStarted);
    }

    async fn on_done(&self, stats: &BuildStats) {
        let round = self.rounds.fetch_add(1, Ordering::SeqCst) + 1;
        let successful = !stats.has_errors();

        if successful && self.first_build.swap(false, Ordering::SeqCst) {
            self.first_build_side_effects().await;
        }

        self.close_activity(stats, successful);

        if successful {
            self.update_static_queries(stats);
            info!(round, duration_ms = stats.duration.as_millis() as u64, "build round succeeded");
        } else {
            warn!(round, errors = stats.errors.len(), "build round failed");
        }

        self.compiler.pause_watch().await;
        self.store
            .dispatch(StoreAction::SetCompileStatus(CompileStatus::Done));
        self.run_lock.mark_end_run();
        self.flush.enqueue();

        self.notifier.send(if successful {
            LiveEvent::BuildSucceeded {
                duration_ms: stats.duration.as_millis() as u64,
            }
        } else {
            LiveEvent::BuildFailed {
                errors: stats.errors.iter().map(|e| e.message.clone()).collect(),
            }
        });

        if let Some(ready) = self.ready.lock().take() {
            // The receiver may already be gone; that only means nobody waits.
            let _ = ready.send(());
        }
    }
}
