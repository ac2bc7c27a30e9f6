//! Develop mode collaborators.
//!
//! The coordination core lives in `kiln-core`; this module supplies what it
//! drives:
//! - [`ScanCompiler`] - watch-mode compiler over the source tree
//! - [`PageDataWriter`] - writes `page-data.json` files
//! - [`DevServer`] - serves the output directory and streams live updates
//! - [`FileWatcher`] - forwards file system changes
//! - [`CliReporter`] - terminal output for build rounds

pub mod compiler;
pub mod pages;
pub mod reporter;
pub mod scan;
pub mod server;
pub mod state;
pub mod watcher;
pub mod writer;

pub use compiler::ScanCompiler;
pub use pages::{page_data_path, page_path, sync_pages, PageSync};
pub use reporter::CliReporter;
pub use scan::ModuleScanner;
pub use server::DevServer;
pub use state::{DevServerState, SharedState, StatusReport};
pub use watcher::{FileChange, FileWatcher};
pub use writer::{PageData, PageDataWriter};
