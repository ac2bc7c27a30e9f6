//! File system watcher for develop mode.
//!
//! Watches the whole project and filters out changes under ignored paths.
//! Bursts are not collapsed here; the build session debounces invalidations.

use crate::error::{CliError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

const CHANNEL_CAPACITY: usize = 256;

/// File change event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    /// Get the path affected by this change.
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }

    /// Whether the change adds or removes a file rather than editing one.
    pub fn is_structural(&self) -> bool {
        !matches!(self, FileChange::Modified(_))
    }

    fn from_event(kind: &EventKind, path: PathBuf) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(FileChange::Created(path)),
            EventKind::Modify(notify::event::ModifyKind::Name(_)) => {
                // Renames arrive as one event per side
                if path.exists() {
                    Some(FileChange::Created(path))
                } else {
                    Some(FileChange::Removed(path))
                }
            }
            EventKind::Modify(_) => Some(FileChange::Modified(path)),
            EventKind::Remove(_) => Some(FileChange::Removed(path)),
            _ => None,
        }
    }
}

/// Recursive project watcher that forwards filtered changes through a channel.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching `root`.
    ///
    /// `ignore_patterns` are either extension patterns (`*.log`) or path
    /// prefixes relative to the root (`node_modules`, `public`).
    ///
    /// # Errors
    ///
    /// Returns error if the root doesn't exist or the OS watcher can't start.
    pub fn new(
        root: PathBuf,
        ignore_patterns: Vec<String>,
    ) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        if !root.exists() {
            return Err(CliError::FileNotFound(root));
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let watch_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("File watcher error: {}", e);
                    return;
                }
            };

            for path in event.paths {
                if Self::should_ignore(&path, &watch_root, &ignore_patterns) {
                    continue;
                }
                if let Some(change) = FileChange::from_event(&event.kind, path) {
                    // Receiver gone means develop is shutting down
                    if tx.blocking_send(change).is_err() {
                        return;
                    }
                }
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    /// Check if a path should be ignored.
    ///
    /// Paths outside the root and hidden entries are always ignored.
    pub fn should_ignore(path: &Path, root: &Path, ignore_patterns: &[String]) -> bool {
        let rel_path = match path.strip_prefix(root) {
            Ok(p) => p,
            Err(_) => return true,
        };

        let path_str = rel_path.to_string_lossy();

        for pattern in ignore_patterns {
            if let Some(suffix) = pattern.strip_prefix('*') {
                if path_str.ends_with(suffix) {
                    return true;
                }
            } else if rel_path.starts_with(pattern)
                || path_str.contains(&format!("/{}/", pattern))
            {
                return true;
            }
        }

        rel_path.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
        })
    }

    /// Get the root directory being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
