//! # kiln-core
//!
//! Coordination core of `kiln develop`.
//!
//! A long-running compiler watches the source tree and reports `invalid`,
//! `watch_run` and `done` events. This crate keeps everything downstream of
//! it consistent with the last completed round:
//!
//! - [`gate`] - run/pending gates with a single coalescing continuation
//! - [`debounce`] - trailing-edge debounce of invalidation bursts
//! - [`session`] - the build session state machine
//! - [`differ`] - static query diffing against the stored state
//! - [`flush`] - coalesced page-data flushing
//! - [`develop`] - the [`DevelopCoordinator`] entry point
//!
//! The compiler, the state store, the artifact writer, the server and the
//! browser are collaborators behind traits.

pub mod activity;
pub mod compiler;
pub mod debounce;
pub mod develop;
pub mod differ;
pub mod error;
pub mod flush;
pub mod gate;
pub mod notifier;
pub mod program;
pub mod session;
pub mod store;

pub use activity::{
    ActivityStatus, BuildActivity, Reporter, Stage, StructuredError, TracingReporter,
    DEVELOP_ACTIVITY_ID,
};
pub use compiler::{
    BuildStats, CompilationGraph, Compiler, CompilerDiagnostic, CompilerObserver,
    CompilerObservers, ModuleId, ModuleInfo,
};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use develop::{DevelopCoordinator, DevelopHandles, ServerAttachment};
pub use differ::{diff_static_queries, map_templates_to_static_queries};
pub use error::{CoreError, Result};
pub use flush::{ArtifactRecord, ArtifactWriter, FlushReport, FlushScheduler};
pub use gate::{GateState, RunGate};
pub use notifier::{LiveEvent, LiveUpdateNotifier};
pub use program::{BrowserLauncher, DevelopUrls, Program, SystemBrowser};
pub use session::{BuildSession, SessionParts, SessionState};
pub use store::{CompileStatus, MemoryStore, StateStore, StaticQueryMap, StoreAction, StoreSnapshot};
