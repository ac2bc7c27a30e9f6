//! Configuration for `kiln develop`.
//!
//! Merges settings from CLI args, environment variables and
//! `kiln.config.json`. Priority: CLI > Environment > File > Defaults

mod defaults;
mod loading;
mod validation;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use defaults::*;
pub use loading::CONFIG_FILE_NAME;

/// Kiln configuration - loaded from kiln.config.json, `KILN_*` and CLI args.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KilnConfig {
    /// Directory scanned for source modules
    #[serde(default = "default_src_dir")]
    pub src_dir: PathBuf,

    /// Directory whose modules become pages (must be inside srcDir)
    #[serde(default = "default_pages_dir")]
    pub pages_dir: PathBuf,

    /// Directory page data is written to and served from
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// Directory holding persisted develop state
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Host the develop server listens on
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the develop server listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Print https URLs
    #[serde(default)]
    pub https: bool,

    /// Open a browser after the first successful build
    #[serde(default)]
    pub open: bool,

    /// Quiet period between a change and the rebuild, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Additional paths ignored by the file watcher
    #[serde(default = "default_watch_ignore")]
    pub watch_ignore: Vec<String>,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            pages_dir: default_pages_dir(),
            out_dir: default_out_dir(),
            cache_dir: default_cache_dir(),
            host: default_host(),
            port: default_port(),
            https: false,
            open: false,
            debounce_ms: default_debounce_ms(),
            watch_ignore: default_watch_ignore(),
        }
    }
}

impl KilnConfig {
    /// JSON Schema for kiln.config.json.
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(KilnConfig)).unwrap_or_default()
    }

    /// Resolve a configured directory against the project root.
    pub fn resolve(&self, root: &Path, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            path_clean::clean(root.join(dir))
        }
    }

    /// Location of the persisted state file.
    pub fn state_file(&self, root: &Path) -> PathBuf {
        self.resolve(root, &self.cache_dir).join("state.json")
    }

    /// Watcher ignore list with the output and cache directories added.
    ///
    /// Anything written by the develop server itself must never trigger a
    /// rebuild.
    pub fn effective_watch_ignore(&self) -> Vec<String> {
        let mut ignore = self.watch_ignore.clone();
        for dir in [&self.out_dir, &self.cache_dir] {
            if dir.is_relative() {
                let entry = dir.to_string_lossy().trim_end_matches('/').to_string();
                if !entry.is_empty() && !ignore.contains(&entry) {
                    ignore.push(entry);
                }
            }
        }
        ignore
    }
}
