use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Available Kiln subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the develop server
    ///
    /// Compiles the site, writes page data for every page and serves the
    /// output directory. Source changes trigger an incremental rebuild and
    /// only the page data whose static queries changed is rewritten.
    Develop(DevelopArgs),

    /// Print the JSON Schema for kiln.config.json
    Schema(SchemaArgs),
}

/// Arguments for the develop command
#[derive(Args, Debug, Default)]
pub struct DevelopArgs {
    /// Port to listen on
    ///
    /// Overrides `port` from kiln.config.json and KILN_PORT.
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Host to listen on
    ///
    /// Use 0.0.0.0 to make the site reachable from other devices on your
    /// network.
    #[arg(short = 'H', long, value_name = "HOST")]
    pub host: Option<String>,

    /// Open the site in the default browser after the first successful build
    #[arg(short, long)]
    pub open: bool,

    /// Print https URLs
    ///
    /// TLS is expected to be terminated by a proxy in front of the server.
    #[arg(long)]
    pub https: bool,

    /// Project directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Path to kiln.config.json
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for the schema command
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Write the schema to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}
