//! Terminal reporter for develop rounds.

use crate::ui;
use kiln_core::{ActivityStatus, CompilerDiagnostic, DevelopUrls, Reporter, StructuredError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Prints build progress through [`ui`], leaving structured detail to
/// `tracing`.
pub struct CliReporter {
    site_name: String,
    /// Set once the first round has ended
    settled: AtomicBool,
}

impl CliReporter {
    pub fn new(site_name: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            settled: AtomicBool::new(false),
        }
    }
}

fn describe(message: &str, file: Option<&std::path::Path>, line: Option<u32>, column: Option<u32>) -> String {
    match ui::format_location(file, line, column) {
        Some(location) => format!("{}\n  at {}", message, location),
        None => message.to_string(),
    }
}

impl Reporter for CliReporter {
    fn activity_started(&self, _id: &str) {
        if self.settled.load(Ordering::SeqCst) {
            ui::info("Rebuilding...");
        } else {
            ui::info("Building development bundle...");
        }
    }

    fn activity_ended(&self, _id: &str, status: ActivityStatus, elapsed: Duration) {
        self.settled.store(true, Ordering::SeqCst);
        match status {
            ActivityStatus::Success => ui::success(&format!(
                "Built development bundle in {}",
                ui::format_duration(elapsed)
            )),
            ActivityStatus::Failed => ui::error(&format!(
                "Failed to build development bundle after {}",
                ui::format_duration(elapsed)
            )),
            ActivityStatus::InProgress => {}
        }
    }

    fn warnings(&self, warnings: &[CompilerDiagnostic]) {
        for warning in warnings {
            let location = warning.location;
            ui::warning(&describe(
                &warning.message,
                warning.file.as_deref(),
                location.map(|l| l.line),
                location.map(|l| l.column),
            ));
        }
    }

    fn build_failed(&self, errors: &[StructuredError]) {
        for err in errors {
            let location = err.location;
            ui::error(&describe(
                &format!("[{}] {}", err.id, err.message),
                err.file.as_deref(),
                location.map(|l| l.line),
                location.map(|l| l.column),
            ));
        }
    }

    fn onboarding(&self, urls: &DevelopUrls) {
        ui::print_onboarding(&self.site_name, urls);
    }
}
