//! Compiler collaborator seam.
//!
//! The compiler is a black box that watches the source tree. The core only
//! sees three lifecycle hooks and two controls:
//!
//! - `invalid` - inputs changed, output is stale (synchronous)
//! - `watch_run` - a round is starting (awaited by the compiler)
//! - `done` - a round finished with [`BuildStats`] (awaited by the compiler)
//! - [`Compiler::pause_watch`] / [`Compiler::resume_watch`]
//!
//! Handlers are attached by explicit observer registration through
//! [`Compiler::subscribe`]. [`CompilerObservers`] is a small helper compiler
//! implementations can use to fan events out to every subscriber.

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Identifier of a module in the compilation graph (its source path).
pub type ModuleId = String;

/// Per-module facts the compiler extracted during a round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Modules this module imports
    pub imports: Vec<ModuleId>,
    /// Static query hashes referenced directly by this module
    pub static_queries: Vec<String>,
}

impl ModuleInfo {
    /// Create module info from imports and static query hashes.
    pub fn new(
        imports: impl IntoIterator<Item = impl Into<ModuleId>>,
        static_queries: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            imports: imports.into_iter().map(Into::into).collect(),
            static_queries: static_queries.into_iter().map(Into::into).collect(),
        }
    }
}

/// Module graph of one completed compilation.
#[derive(Debug, Clone, Default)]
pub struct CompilationGraph {
    modules: FxHashMap<ModuleId, ModuleInfo>,
}

impl CompilationGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a module.
    pub fn insert(&mut self, id: impl Into<ModuleId>, info: ModuleInfo) {
        self.modules.insert(id.into(), info);
    }

    /// Look up a module.
    pub fn get(&self, id: &str) -> Option<&ModuleInfo> {
        self.modules.get(id)
    }

    /// Check whether a module took part in the compilation.
    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Iterate over all modules.
    pub fn iter(&self) -> impl Iterator<Item = (&ModuleId, &ModuleInfo)> {
        self.modules.iter()
    }
}

/// Line/column position inside a source file (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// Raw error or warning reported by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerDiagnostic {
    /// Human-readable message
    pub message: String,
    /// File the diagnostic points at, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Position inside `file`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl CompilerDiagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
            location: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_location(mut self, line: u32, column: u32) -> Self {
        self.location = Some(Location { line, column });
        self
    }
}

/// Outcome of one build round.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Errors that make the round unsuccessful
    pub errors: Vec<CompilerDiagnostic>,
    /// Non-fatal warnings
    pub warnings: Vec<CompilerDiagnostic>,
    /// Module graph of the compilation
    pub graph: CompilationGraph,
    /// Wall time of the round
    pub duration: Duration,
}

impl BuildStats {
    /// Successful stats over `graph`.
    pub fn success(graph: CompilationGraph) -> Self {
        Self {
            graph,
            ..Self::default()
        }
    }

    /// Failed stats carrying `errors`.
    pub fn failure(errors: Vec<CompilerDiagnostic>) -> Self {
        Self {
            errors,
            ..Self::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Lifecycle hooks a compiler invokes on its subscribers.
#[async_trait]
pub trait CompilerObserver: Send + Sync {
    /// Watched inputs changed. Must not block.
    fn on_invalid(&self);

    /// A round is about to compile. The compiler waits for this to return.
    async fn on_watch_run(&self);

    /// A round completed. The compiler waits for this to return.
    async fn on_done(&self, stats: &BuildStats);
}

/// A watch-mode compiler.
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Register an observer for lifecycle events.
    fn subscribe(&self, observer: Arc<dyn CompilerObserver>);

    /// Stop compiling until the next resume.
    async fn pause_watch(&self);

    /// Start (or continue) watching and compile a round.
    async fn resume_watch(&self);
}

/// Subscriber list for compiler implementations.
#[derive(Default)]
pub struct CompilerObservers {
    observers: RwLock<Vec<Arc<dyn CompilerObserver>>>,
}

impl CompilerObservers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn CompilerObserver>) {
        self.observers.write().push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Deliver `invalid` to every observer.
    pub fn emit_invalid(&self) {
        for observer in self.snapshot() {
            observer.on_invalid();
        }
    }

    /// Deliver `watch_run` to every observer, one after another.
    pub async fn emit_watch_run(&self) {
        for observer in self.snapshot() {
            observer.on_watch_run().await;
        }
    }

    /// Deliver `done` to every observer, one after another.
    pub async fn emit_done(&self, stats: &BuildStats) {
        for observer in self.snapshot() {
            observer.on_done(stats).await;
        }
    }

    // Cloned so no lock is held across an await point.
    fn snapshot(&self) -> Vec<Arc<dyn CompilerObserver>> {
        self.observers.read().clone()
    }
}
