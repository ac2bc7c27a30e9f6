//! Shared fakes for the kiln-core integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use kiln_core::{
    ActivityStatus, ArtifactRecord, ArtifactWriter, BrowserLauncher, BuildStats,
    CompilationGraph, Compiler, CompilerDiagnostic, CompilerObserver, CompilerObservers,
    CoreError, DevelopUrls, LiveUpdateNotifier, ModuleInfo, Program, Reporter, Result,
    ServerAttachment, StructuredError,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Compiler that runs one scripted round per resume.
///
/// Rounds run inline inside `resume_watch`: `watch_run` then `done`. Once
/// the script is exhausted the last outcome repeats.
#[derive(Default)]
pub struct ScriptedCompiler {
    observers: CompilerObservers,
    script: Mutex<VecDeque<BuildStats>>,
    last: Mutex<BuildStats>,
    resumes: AtomicUsize,
    pauses: AtomicUsize,
}

impl ScriptedCompiler {
    pub fn new(script: impl IntoIterator<Item = BuildStats>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        })
    }

    /// Simulate a source change.
    pub fn invalidate(&self) {
        self.observers.emit_invalid();
    }

    pub fn push(&self, stats: BuildStats) {
        self.script.lock().push_back(stats);
    }

    pub fn resumes(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }

    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    fn next_stats(&self) -> BuildStats {
        let next = self.script.lock().pop_front();
        match next {
            Some(stats) => {
                *self.last.lock() = stats.clone();
                stats
            }
            None => self.last.lock().clone(),
        }
    }
}

#[async_trait]
impl Compiler for ScriptedCompiler {
    fn subscribe(&self, observer: Arc<dyn CompilerObserver>) {
        self.observers.subscribe(observer);
    }

    async fn pause_watch(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }

    async fn resume_watch(&self) {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        let stats = self.next_stats();
        self.observers.emit_watch_run().await;
        self.observers.emit_done(&stats).await;
    }
}

/// Compiler that only counts calls; tests drive the observer by hand.
#[derive(Default)]
pub struct PassiveCompiler {
    pub resumes: AtomicUsize,
    pub pauses: AtomicUsize,
}

#[async_trait]
impl Compiler for PassiveCompiler {
    fn subscribe(&self, _observer: Arc<dyn CompilerObserver>) {}

    async fn pause_watch(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }

    async fn resume_watch(&self) {
        self.resumes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    pub started: AtomicUsize,
    pub ended: Mutex<Vec<ActivityStatus>>,
    pub failures: Mutex<Vec<Vec<StructuredError>>>,
    pub warnings: AtomicUsize,
    pub onboarding: AtomicUsize,
}

impl RecordingReporter {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn onboarded(&self) -> usize {
        self.onboarding.load(Ordering::SeqCst)
    }
}

impl Reporter for RecordingReporter {
    fn activity_started(&self, _id: &str) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn activity_ended(&self, _id: &str, status: ActivityStatus, _elapsed: Duration) {
        self.ended.lock().push(status);
    }

    fn warnings(&self, _warnings: &[CompilerDiagnostic]) {
        self.warnings.fetch_add(1, Ordering::SeqCst);
    }

    fn build_failed(&self, errors: &[StructuredError]) {
        self.failures.lock().push(errors.to_vec());
    }

    fn onboarding(&self, _urls: &DevelopUrls) {
        self.onboarding.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeBrowser {
    pub opened: Mutex<Vec<String>>,
    pub fail: bool,
}

#[async_trait]
impl BrowserLauncher for FakeBrowser {
    async fn open(&self, url: &str) -> Result<()> {
        self.opened.lock().push(url.to_string());
        if self.fail {
            return Err(CoreError::Browser {
                url: url.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no browser"),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingWriter {
    pub records: Mutex<Vec<ArtifactRecord>>,
}

#[async_trait]
impl ArtifactWriter for RecordingWriter {
    async fn write(&self, record: &ArtifactRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeServer {
    pub notifier: Mutex<Option<LiveUpdateNotifier>>,
}

impl ServerAttachment for FakeServer {
    fn attach(&self, notifier: LiveUpdateNotifier) {
        *self.notifier.lock() = Some(notifier);
    }
}

pub fn program(open: bool) -> Program {
    Program {
        directory: PathBuf::from("/site"),
        host: "localhost".to_string(),
        port: 8000,
        https: false,
        open,
    }
}

pub const BLOG: &str = "src/templates/blog.js";
pub const HEADER: &str = "src/components/header.js";

/// A graph where the blog template pulls `hash` in through its header.
pub fn blog_graph(hash: &str) -> CompilationGraph {
    let mut graph = CompilationGraph::new();
    graph.insert(BLOG, ModuleInfo::new([HEADER], Vec::<String>::new()));
    graph.insert(HEADER, ModuleInfo::new(Vec::<String>::new(), [hash]));
    graph
}

pub fn failure(message: &str) -> BuildStats {
    BuildStats::failure(vec![CompilerDiagnostic::new(message)])
}

/// Poll `condition` until it holds, failing after about a second.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition never became true");
}
