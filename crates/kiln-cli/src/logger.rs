//! Logging setup for the Kiln CLI.
//!
//! Structured logs come from `tracing` in both crates; this module installs
//! the subscriber.
//!
//! # Verbosity
//!
//! 1. `--verbose`: DEBUG for kiln crates
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`: custom filter
//! 4. Default: INFO for kiln crates
//!
//! # Example
//!
//! ```rust,no_run
//! use kiln_cli::logger::init_logger;
//! use tracing::info;
//!
//! init_logger(false, false, false);
//! info!("Starting develop server");
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERBOSE_FILTER: &str = "kiln=debug,kiln_core=debug,kiln_cli=debug";
const QUIET_FILTER: &str = "kiln=error,kiln_core=error,kiln_cli=error";
const DEFAULT_FILTER: &str = "kiln=info,kiln_core=info,kiln_cli=info";

/// Build the filter for the given flags.
///
/// `verbose` wins over `quiet`; without either, `RUST_LOG` is honored.
pub fn build_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Initialize the global tracing subscriber. Call once, early in `main`.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(build_filter(verbose, quiet), no_color);
}

/// Initialize the global subscriber with a custom filter.
///
/// ANSI output follows the same `NO_COLOR`/`FORCE_COLOR` rules as the rest of
/// the terminal UI.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && crate::ui::should_use_color())
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_filter_enables_debug() {
        let filter = build_filter(true, false);
        assert!(filter.to_string().contains("kiln_core=debug"));
    }

    #[test]
    fn test_verbose_wins_over_quiet() {
        let filter = build_filter(true, true);
        assert!(filter.to_string().contains("debug"));
    }

    #[test]
    fn test_quiet_filter_only_errors() {
        let filter = build_filter(false, true);
        assert!(filter.to_string().contains("kiln_cli=error"));
    }
}
