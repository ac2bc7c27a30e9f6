//! Process-wide develop state and its mutation messages.
//!
//! The coordination core never mutates state directly. It reads a
//! [`StoreSnapshot`] and proposes [`StoreAction`]s; the store applies them in
//! dispatch order. Because the snapshot may be one round stale by the time an
//! action lands, every action is written to be safe against that.

use crate::error::{CoreError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

/// Template path to the set of static query hashes it depends on.
pub type StaticQueryMap = BTreeMap<String, BTreeSet<String>>;

/// Compiler status as tracked by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompileStatus {
    /// Inputs changed, a round is expected
    Pending,
    /// A round is compiling
    InProgress,
    /// The last round finished
    #[default]
    Done,
}

/// Read-only view of the develop state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Registered page templates and the page paths they render
    pub components: BTreeMap<String, BTreeSet<String>>,
    /// Static query hashes per template from the last successful round
    pub static_queries_by_template: StaticQueryMap,
    /// Templates whose page data has to be rewritten
    pub pending_template_writes: BTreeSet<String>,
    /// Not persisted; a restarted process always starts from `Done`
    #[serde(skip)]
    pub compile_status: CompileStatus,
}

/// Mutation proposed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreAction {
    /// Register `path` as a page rendered by `component_path`
    CreatePage {
        component_path: String,
        path: String,
    },
    /// Remove a page; the template and its static queries are dropped once
    /// it has no pages left
    DeletePage {
        component_path: String,
        path: String,
    },
    /// Mark a template's page data as needing a rewrite
    AddPendingTemplateDataWrite { component_path: String },
    /// Replace a template's static query hashes
    SetStaticQueriesByTemplate {
        component_path: String,
        static_query_hashes: BTreeSet<String>,
    },
    /// Page data for a template was written with `static_query_hashes`.
    ///
    /// Only clears the pending mark if the stored hashes still match, so a
    /// change that landed while the write was in flight stays pending.
    ClearPendingTemplateDataWrite {
        component_path: String,
        static_query_hashes: BTreeSet<String>,
    },
    /// Track the compiler status
    SetCompileStatus(CompileStatus),
}

impl StoreSnapshot {
    /// Apply one action.
    pub fn apply(&mut self, action: StoreAction) {
        match action {
            StoreAction::CreatePage {
                component_path,
                path,
            } => {
                self.components
                    .entry(component_path)
                    .or_default()
                    .insert(path);
            }
            StoreAction::DeletePage {
                component_path,
                path,
            } => {
                if let Some(pages) = self.components.get_mut(&component_path) {
                    pages.remove(&path);
                    if pages.is_empty() {
                        self.components.remove(&component_path);
                        self.pending_template_writes.remove(&component_path);
                        self.static_queries_by_template.remove(&component_path);
                    }
                }
            }
            StoreAction::AddPendingTemplateDataWrite { component_path } => {
                self.pending_template_writes.insert(component_path);
            }
            StoreAction::SetStaticQueriesByTemplate {
                component_path,
                static_query_hashes,
            } => {
                self.static_queries_by_template
                    .insert(component_path, static_query_hashes);
            }
            StoreAction::ClearPendingTemplateDataWrite {
                component_path,
                static_query_hashes,
            } => {
                let current = self.static_queries_by_template.get(&component_path);
                if current.map_or(static_query_hashes.is_empty(), |c| *c == static_query_hashes)
                {
                    self.pending_template_writes.remove(&component_path);
                } else {
                    debug!(
                        component = %component_path,
                        "static queries changed during write, keeping pending"
                    );
                }
            }
            StoreAction::SetCompileStatus(status) => {
                self.compile_status = status;
            }
        }
    }

    /// Pages rendered by a template, sorted.
    pub fn pages_of(&self, component_path: &str) -> Vec<String> {
        self.components
            .get(component_path)
            .map(|pages| pages.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// The persisted-state collaborator.
pub trait StateStore: Send + Sync {
    /// Current state.
    fn snapshot(&self) -> StoreSnapshot;

    /// Propose a mutation. Fire-and-forget; actions apply in dispatch order.
    fn dispatch(&self, action: StoreAction);
}

/// In-memory store, optionally backed by a JSON file between runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreSnapshot>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with `state`.
    pub fn with_state(state: StoreSnapshot) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Load a store previously saved with [`MemoryStore::persist`].
    ///
    /// A missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] if the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => {
                return Err(CoreError::Store {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };

        let state: StoreSnapshot =
            serde_json::from_str(&content).map_err(|e| CoreError::Store {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        debug!(
            path = %path.display(),
            templates = state.static_queries_by_template.len(),
            "loaded develop state"
        );
        Ok(Self::with_state(state))
    }

    /// Save the current state as JSON, replacing `path` atomically.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&*self.state.read())?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl StateStore for MemoryStore {
    fn snapshot(&self) -> StoreSnapshot {
        self.state.read().clone()
    }

    fn dispatch(&self, action: StoreAction) {
        self.state.write().apply(action);
    }
}
