//! Kiln CLI - incremental develop server for static sites.
//!
//! Supplies the collaborators `kiln-core` coordinates: a scanning compiler,
//! a page-data writer, an HTTP server with live updates, a file watcher and a
//! terminal reporter.
//!
//! # Architecture
//!
//! - [`error`] - error types with actionable messages
//! - [`logger`] - structured logging with tracing
//! - [`ui`] - terminal output
//! - [`config`] - `kiln.config.json` loading and validation
//! - [`dev`] - develop mode collaborators
//! - [`commands`] - CLI command implementations
//!
//! # Example
//!
//! ```rust
//! use kiln_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, ConfigError, Result, ResultExt};
