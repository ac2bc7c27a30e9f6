//! Error handling for the Kiln CLI.
//!
//! - [`CliError`] is what commands return
//! - [`ConfigError`] comes out of loading and validating `kiln.config.json`
//! - `kiln_core::CoreError` comes out of the develop coordinator and converts
//!   via `#[from]`
//!
//! `main` renders whatever reaches it through [`cli_error_to_miette`].
//!
//! # Example
//!
//! ```rust,no_run
//! use kiln_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn write_schema(path: &Path, schema: &str) -> Result<()> {
//!     std::fs::write(path, schema)
//!         .with_path(path)
//!         .with_hint("Create the parent directory first")
//! }
//! ```

use kiln_core::CoreError;
use miette::Report;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Raised by the develop coordinator
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binding or serving HTTP failed
    #[error("Server error: {0}")]
    Server(String),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Source scanning patterns failed to compile
    #[error("Invalid source pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Message already carrying its context
    #[error("{0}")]
    Custom(String),
}

/// Problems with `kiln.config.json`, `KILN_*` variables or flags.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Explicit `--config` path that doesn't exist
    #[error("Config file not found: {}\n\nHint: Create a kiln.config.json file or drop the --config flag", .0.display())]
    NotFound(PathBuf),

    #[error("Missing value for '{field}'\n\nHint: {hint}")]
    MissingField { field: String, hint: String },

    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Context helpers for fallible calls.
pub trait ResultExt<T> {
    /// Report a not-found I/O error as [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<Path>) -> Result<T>;

    /// Append a hint line.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| CliError::Custom(format!("{}\n\nHint: {}", e.into(), hint)))
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| CliError::Custom(format!("{}: {}", msg, e.into())))
    }
}

/// Render a `CliError` for `main`, attaching help where there is some to give.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        CliError::Core(CoreError::Store { path, message }) => miette::miette!(
            help = "Delete the cache directory to start from a clean state",
            "Could not load develop state from {}: {}",
            path.display(),
            message
        ),
        CliError::Core(e) => miette::miette!("Develop session error: {}", e),
        CliError::Server(msg) => miette::miette!(
            help = "Is another process using the port? Pick a different one with --port",
            "Server error: {}",
            msg
        ),
        CliError::Watch(e) => miette::miette!(
            help = "Check that the project directory exists and is readable",
            "File watcher error: {}",
            e
        ),
        other => miette::miette!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_mentions_path_and_hint() {
        let msg = ConfigError::NotFound(PathBuf::from("site/kiln.config.json")).to_string();
        assert!(msg.contains("site/kiln.config.json"));
        assert!(msg.contains("Hint:"));
    }

    #[test]
    fn test_invalid_value_message() {
        let err = ConfigError::InvalidValue {
            field: "debounceMs".to_string(),
            value: "60000".to_string(),
            hint: "Keep it at or below 10000".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for 'debounceMs': 60000\n\nHint: Keep it at or below 10000"
        );
    }

    #[test]
    fn test_core_errors_convert() {
        let cli_err: CliError = CoreError::MissingInput("compiler").into();
        assert!(matches!(cli_err, CliError::Core(CoreError::MissingInput("compiler"))));
        assert!(cli_err.to_string().contains("compiler"));
    }

    #[test]
    fn test_with_path_maps_not_found() {
        let result: std::io::Result<()> =
            Err(std::io::Error::from(std::io::ErrorKind::NotFound));

        let err = result.with_path("/site/out/schema.json").unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(p) if p == Path::new("/site/out/schema.json")));
    }

    #[test]
    fn test_with_path_keeps_other_errors() {
        let result: std::io::Result<()> =
            Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied));

        assert!(matches!(result.with_path("/site").unwrap_err(), CliError::Io(_)));
    }

    #[test]
    fn test_with_hint_appends() {
        let result: Result<(), ConfigError> = Err(ConfigError::NotFound(PathBuf::from("a.json")));

        let err = result.with_hint("Run from the project root").unwrap_err();
        assert!(err.to_string().ends_with("Hint: Run from the project root"));
    }

    #[test]
    fn test_context_prefixes() {
        let result: Result<()> = Err(CliError::Server("bind".into()));

        let err = result.context("Failed to start").unwrap_err();
        assert_eq!(err.to_string(), "Failed to start: Server error: bind");
    }

    #[test]
    fn test_store_errors_get_help() {
        let report = cli_error_to_miette(CliError::Core(CoreError::Store {
            path: PathBuf::from(".cache/state.json"),
            message: "expected value".to_string(),
        }));
        assert!(report.to_string().contains(".cache/state.json"));
        assert!(report.help().is_some());
    }
}
