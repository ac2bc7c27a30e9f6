//! Develop entry point.
//!
//! [`DevelopCoordinator`] is the one public way into the core. It collects
//! the collaborators, wires the two gates, the flush scheduler and the build
//! session together, starts the compiler and returns once the first round has
//! been processed.
//!
//! # Example
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use kiln_core::{DevelopCoordinator, MemoryStore, Program, Result};
//! # async fn run(
//! #     program: Program,
//! #     server: Arc<dyn kiln_core::ServerAttachment>,
//! #     compiler: Arc<dyn kiln_core::Compiler>,
//! #     writer: Arc<dyn kiln_core::ArtifactWriter>,
//! # ) -> Result<()> {
//! let handles = DevelopCoordinator::new()
//!     .program(program)
//!     .server(server)
//!     .store(Arc::new(MemoryStore::new()))
//!     .compiler(compiler)
//!     .writer(writer)
//!     .start()
//!     .await?;
//!
//! let mut events = handles.notifier.subscribe();
//! # let _ = events.recv().await;
//! # Ok(())
//! # }
//! ```

use crate::activity::{Reporter, TracingReporter};
use crate::compiler::Compiler;
use crate::debounce::DEFAULT_DEBOUNCE;
use crate::error::{CoreError, Result};
use crate::flush::{ArtifactWriter, FlushScheduler};
use crate::gate::RunGate;
use crate::notifier::LiveUpdateNotifier;
use crate::program::{BrowserLauncher, Program, SystemBrowser};
use crate::session::{BuildSession, SessionParts};
use crate::store::StateStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::info;

/// Name of the gate guarding compiler resumes.
pub const COMPILE_GATE: &str = "develop-compile";
/// Name of the gate guarding page-data flushes.
pub const FLUSH_GATE: &str = "flush-page-data";

/// The server the live-update notifier is attached to.
pub trait ServerAttachment: Send + Sync {
    fn attach(&self, notifier: LiveUpdateNotifier);
}

/// Live handles returned once the first round completed.
#[derive(Clone)]
pub struct DevelopHandles {
    /// The running compiler
    pub compiler: Arc<dyn Compiler>,
    /// Live-update notifier attached to the server
    pub notifier: LiveUpdateNotifier,
    /// Session observing the compiler
    pub session: Arc<BuildSession>,
}

/// Builder and launcher for a develop session.
pub struct DevelopCoordinator {
    program: Option<Program>,
    server: Option<Arc<dyn ServerAttachment>>,
    workers: Option<Handle>,
    store: Option<Arc<dyn StateStore>>,
    compiler: Option<Arc<dyn Compiler>>,
    writer: Option<Arc<dyn ArtifactWriter>>,
    reporter: Arc<dyn Reporter>,
    browser: Arc<dyn BrowserLauncher>,
    debounce: Duration,
    notifier_capacity: usize,
}

impl Default for DevelopCoordinator {
    fn default() -> Self {
        Self {
            program: None,
            server: None,
            workers: None,
            store: None,
            compiler: None,
            writer: None,
            reporter: Arc::new(TracingReporter),
            browser: Arc::new(SystemBrowser),
            debounce: DEFAULT_DEBOUNCE,
            notifier_capacity: crate::notifier::DEFAULT_CAPACITY,
        }
    }
}

impl DevelopCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Running-program descriptor (required).
    pub fn program(mut self, program: Program) -> Self {
        self.program = Some(program);
        self
    }

    /// Server the notifier gets attached to (required).
    pub fn server(mut self, server: Arc<dyn ServerAttachment>) -> Self {
        self.server = Some(server);
        self
    }

    /// Runtime background work is spawned on. Defaults to the current one.
    pub fn workers(mut self, workers: Handle) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Persisted-state store (required).
    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Watch-mode compiler (required).
    pub fn compiler(mut self, compiler: Arc<dyn Compiler>) -> Self {
        self.compiler = Some(compiler);
        self
    }

    /// Page-data writer (required).
    pub fn writer(mut self, writer: Arc<dyn ArtifactWriter>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn browser(mut self, browser: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = browser;
        self
    }

    /// Quiet period between the last invalidation and the compiler resume.
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn notifier_capacity(mut self, capacity: usize) -> Self {
        self.notifier_capacity = capacity;
        self
    }

    /// Wire everything up and run the first round.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingInput`] before anything starts if a
    /// required collaborator is missing, and [`CoreError::Shutdown`] if the
    /// session is dropped before the first `done` event.
    pub async fn start(self) -> Result<DevelopHandles> {
        let program = self.program.ok_or(CoreError::MissingInput("program"))?;
        let server = self.server.ok_or(CoreError::MissingInput("server"))?;
        let store = self.store.ok_or(CoreError::MissingInput("store"))?;
        let compiler = self.compiler.ok_or(CoreError::MissingInput("compiler"))?;
        let writer = self.writer.ok_or(CoreError::MissingInput("writer"))?;
        let workers = self.workers.unwrap_or_else(Handle::current);

        let run_lock = Arc::new(RunGate::new(COMPILE_GATE));
        let flush_lock = Arc::new(RunGate::new(FLUSH_GATE));

        let notifier = LiveUpdateNotifier::new(self.notifier_capacity);
        server.attach(notifier.clone());

        let flush = Arc::new(FlushScheduler::new(
            flush_lock,
            Arc::clone(&store),
            writer,
            workers.clone(),
        ));

        let urls = program.urls();
        let (session, ready) = BuildSession::new(SessionParts {
            compiler: Arc::clone(&compiler),
            store,
            run_lock: Arc::clone(&run_lock),
            flush,
            reporter: self.reporter,
            browser: self.browser,
            notifier: notifier.clone(),
            urls,
            open_browser: program.open,
            debounce: self.debounce,
            workers,
        });
        compiler.subscribe(session.clone());

        info!(directory = %program.directory.display(), "starting develop compiler");
        run_lock.mark_start_run();
        compiler.resume_watch().await;

        ready.await.map_err(|_| CoreError::Shutdown)?;

        Ok(DevelopHandles {
            compiler,
            notifier,
            session,
        })
    }
}
