//! Error types for the coordination core.
//!
//! Only [`CoreError::MissingInput`] is fatal: it aborts
//! [`DevelopCoordinator::start`](crate::DevelopCoordinator::start) before any
//! compiler round runs. Everything else is contained inside the build session
//! or the flush scheduler and surfaces as a log line.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for `kiln-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required collaborator was not supplied to the coordinator
    #[error("Missing required input: {0}\n\nHint: The develop coordinator needs a program descriptor, a server attachment, a state store, a compiler and an artifact writer")]
    MissingInput(&'static str),

    /// Writing a derived artifact failed
    #[error("Failed to write artifact for {component_path}: {message}")]
    ArtifactWrite {
        /// Template whose artifacts could not be written
        component_path: String,
        /// Underlying failure
        message: String,
    },

    /// The platform browser opener could not be spawned
    #[error("Failed to open browser at {url}: {source}")]
    Browser {
        /// URL that was being opened
        url: String,
        /// Spawn failure
        #[source]
        source: std::io::Error,
    },

    /// The persisted state file could not be read or written
    #[error("State store error at {}: {message}", .path.display())]
    Store {
        /// Location of the state file
        path: PathBuf,
        /// Description of the failure
        message: String,
    },

    /// The session went away before the first build round completed
    #[error("Build session shut down before the first build completed")]
    Shutdown,

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using `CoreError` as the default error type.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
