//! Command-line interface definition.
//!
//! - `kiln develop` - watch the site, keep page data current and serve it
//! - `kiln schema` - print the JSON Schema of `kiln.config.json`

mod commands;

use clap::Parser;

pub use commands::{Command, DevelopArgs, SchemaArgs};

/// Kiln - incremental develop server for static sites
#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    version,
    about = "Incremental develop server for static sites",
    long_about = "Kiln watches your site's sources, recompiles on change and keeps the\n\
                  page data of every affected page up to date while serving it locally."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
