//! Watch-mode compiler backed by the source scanner.
//!
//! Each round rescans the source tree on the blocking pool and reports the
//! resulting module graph to subscribers. File changes arrive through
//! [`ScanCompiler::notify_change`] and become `invalid` events; a change
//! seen mid-round is replayed once the round finishes.

use crate::dev::scan::{is_source_file, scan_sources, ModuleScanner};
use crate::error::Result;
use async_trait::async_trait;
use kiln_core::{BuildStats, Compiler, CompilerDiagnostic, CompilerObserver, CompilerObservers};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct RoundState {
    compiling: bool,
    dirty: bool,
}

pub struct ScanCompiler {
    root: PathBuf,
    src_dir: PathBuf,
    scanner: Arc<ModuleScanner>,
    observers: CompilerObservers,
    /// Serializes rounds
    round_lock: tokio::sync::Mutex<()>,
    state: Mutex<RoundState>,
    watching: AtomicBool,
    rounds: AtomicU64,
}

impl ScanCompiler {
    /// Create a compiler for sources under `src_dir`. Module ids are
    /// relative to `root`.
    pub fn new(root: PathBuf, src_dir: PathBuf) -> Result<Self> {
        Ok(Self {
            root,
            src_dir,
            scanner: Arc::new(ModuleScanner::new()?),
            observers: CompilerObservers::new(),
            round_lock: tokio::sync::Mutex::new(()),
            state: Mutex::new(RoundState::default()),
            watching: AtomicBool::new(false),
            rounds: AtomicU64::new(0),
        })
    }

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    pub fn is_watching(&self) -> bool {
        self.watching.load(Ordering::SeqCst)
    }

    /// Rounds completed so far.
    pub fn rounds(&self) -> u64 {
        self.rounds.load(Ordering::SeqCst)
    }

    /// Tell the compiler a file changed.
    ///
    /// Returns `true` if the change was relevant. Changes outside the source
    /// directory or to non-module files are dropped.
    pub fn notify_change(&self, path: &Path) -> bool {
        if !path.starts_with(&self.src_dir) || !is_source_file(path) {
            trace!(path = %path.display(), "ignoring change");
            return false;
        }

        {
            let mut state = self.state.lock();
            if state.compiling {
                state.dirty = true;
                return true;
            }
        }

        debug!(path = %path.display(), "source changed");
        self.observers.emit_invalid();
        true
    }

    async fn compile_round(&self) -> BuildStats {
        let scanner = Arc::clone(&self.scanner);
        let root = self.root.clone();
        let src_dir = self.src_dir.clone();

        match tokio::task::spawn_blocking(move || scan_sources(&scanner, &root, &src_dir)).await {
            Ok(stats) => stats,
            Err(e) => BuildStats::failure(vec![CompilerDiagnostic::new(format!(
                "Compilation task failed: {}",
                e
            ))]),
        }
    }
}

#[async_trait]
impl Compiler for ScanCompiler {
    fn subscribe(&self, observer: Arc<dyn CompilerObserver>) {
        self.observers.subscribe(observer);
    }

    async fn pause_watch(&self) {
        // Called from inside `done`, so the round lock is still held here
        self.watching.store(false, Ordering::SeqCst);
    }

    async fn resume_watch(&self) {
        let _round = self.round_lock.lock().await;
        self.watching.store(true, Ordering::SeqCst);
        self.state.lock().compiling = true;

        self.observers.emit_watch_run().await;
        let stats = self.compile_round().await;
        self.rounds.fetch_add(1, Ordering::SeqCst);
        debug!(
            modules = stats.graph.len(),
            errors = stats.errors.len(),
            warnings = stats.warnings.len(),
            "compiled round"
        );
        self.observers.emit_done(&stats).await;

        let replay = {
            let mut state = self.state.lock();
            state.compiling = false;
            std::mem::take(&mut state.dirty)
        };
        if replay {
            debug!("replaying change seen during the round");
            self.observers.emit_invalid();
        }
    }
}
