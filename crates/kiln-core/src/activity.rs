//! Build activities and the reporter seam.
//!
//! An activity is the core's "a build is in progress" marker. The session
//! keeps at most one open; it is closed by the `done` of the round that opened
//! it, either as a success or as a failure carrying [`StructuredError`]s.
//!
//! Rendering activities for humans is somebody else's job: everything goes
//! through the [`Reporter`] trait. [`TracingReporter`] emits plain `tracing`
//! events and is what the coordinator uses when nothing else is supplied.

use crate::compiler::{CompilerDiagnostic, Location};
use crate::program::DevelopUrls;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Identifier of the develop compile activity.
pub const DEVELOP_ACTIVITY_ID: &str = "develop-compile";

/// Terminal or current status of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityStatus {
    InProgress,
    Success,
    Failed,
}

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Develop,
}

/// Compiler error normalized for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredError {
    /// Stable error code
    pub id: String,
    pub stage: Stage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Error code for generic compilation failures.
pub const GENERIC_COMPILE_ERROR: &str = "98123";
/// Error code for unresolvable imports.
pub const MODULE_NOT_FOUND_ERROR: &str = "98124";

/// Convert raw compiler errors into structured errors.
pub fn structure_errors(stage: Stage, diagnostics: &[CompilerDiagnostic]) -> Vec<StructuredError> {
    diagnostics
        .iter()
        .map(|diagnostic| {
            let id = if diagnostic.message.starts_with("Module not found") {
                MODULE_NOT_FOUND_ERROR
            } else {
                GENERIC_COMPILE_ERROR
            };
            StructuredError {
                id: id.to_string(),
                stage,
                message: diagnostic.message.clone(),
                file: diagnostic.file.clone(),
                location: diagnostic.location,
            }
        })
        .collect()
}

/// Sink for build progress, warnings, failures and onboarding output.
pub trait Reporter: Send + Sync {
    fn activity_started(&self, id: &str);
    fn activity_ended(&self, id: &str, status: ActivityStatus, elapsed: Duration);
    fn warnings(&self, warnings: &[CompilerDiagnostic]);
    fn build_failed(&self, errors: &[StructuredError]);
    /// One-time output after the first successful build.
    fn onboarding(&self, urls: &DevelopUrls);
}

/// Reporter that logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn activity_started(&self, id: &str) {
        info!(activity = id, "building development bundle");
    }

    fn activity_ended(&self, id: &str, status: ActivityStatus, elapsed: Duration) {
        info!(activity = id, ?status, elapsed_ms = elapsed.as_millis() as u64, "activity ended");
    }

    fn warnings(&self, warnings: &[CompilerDiagnostic]) {
        for warning in warnings {
            warn!(file = ?warning.file, "{}", warning.message);
        }
    }

    fn build_failed(&self, errors: &[StructuredError]) {
        for err in errors {
            error!(id = %err.id, file = ?err.file, "{}", err.message);
        }
    }

    fn onboarding(&self, urls: &DevelopUrls) {
        info!(local = %urls.local_for_terminal, lan = ?urls.lan_for_terminal, "site is running");
    }
}

/// One open "compiling" unit of work.
#[derive(Debug)]
pub struct BuildActivity {
    id: String,
    started: bool,
    started_at: Instant,
    status: ActivityStatus,
    errors: Vec<StructuredError>,
}

impl BuildActivity {
    /// Create an activity that has not been started yet.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            started: false,
            started_at: Instant::now(),
            status: ActivityStatus::InProgress,
            errors: Vec::new(),
        }
    }

    /// Start the activity and report it.
    pub fn start(&mut self, reporter: &dyn Reporter) {
        self.started = true;
        self.started_at = Instant::now();
        reporter.activity_started(&self.id);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn status(&self) -> ActivityStatus {
        self.status
    }

    /// Errors attached by [`BuildActivity::panic_on_build`].
    pub fn errors(&self) -> &[StructuredError] {
        &self.errors
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Mark the activity as a failed build.
    ///
    /// Does not end the activity and does not propagate anything.
    pub fn panic_on_build(&mut self, errors: Vec<StructuredError>, reporter: &dyn Reporter) {
        reporter.build_failed(&errors);
        self.status = ActivityStatus::Failed;
        self.errors = errors;
    }

    /// Close the activity, returning its final status.
    pub fn end(mut self, reporter: &dyn Reporter) -> ActivityStatus {
        if self.status == ActivityStatus::InProgress {
            self.status = ActivityStatus::Success;
        }
        reporter.activity_ended(&self.id, self.status, self.elapsed());
        self.status
    }
}
