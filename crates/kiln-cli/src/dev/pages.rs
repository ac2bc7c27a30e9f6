//! Page registration from the pages directory.
//!
//! Every module under the pages directory is a template rendering exactly one
//! page, whose path follows the file path.

use crate::dev::scan::{is_source_file, module_id};
use kiln_core::{StateStore, StoreAction};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// What a sync changed in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageSync {
    pub created: usize,
    pub deleted: usize,
    pub pending: usize,
}

impl PageSync {
    pub fn is_empty(&self) -> bool {
        self.created == 0 && self.deleted == 0 && self.pending == 0
    }
}

/// Page path for a file under `pages_dir`, or `None` if the file is not a page.
///
/// `index.js` maps to `/`, `blog/index.js` to `/blog/`, `about.tsx` to
/// `/about/`. Files and directories starting with `_` or `.`, test files and
/// `__tests__` directories are skipped.
pub fn page_path(pages_dir: &Path, file: &Path) -> Option<String> {
    if !is_source_file(file) {
        return None;
    }
    let relative = file.strip_prefix(pages_dir).ok()?;

    let mut segments = Vec::new();
    for component in relative.components() {
        let Component::Normal(part) = component else {
            return None;
        };
        let part = part.to_str()?;
        if part.starts_with('_') || part.starts_with('.') {
            return None;
        }
        segments.push(part);
    }

    let file_name = segments.pop()?;
    let stem = file_name.split('.').next()?;
    if file_name.contains(".test.") || file_name.contains(".spec.") {
        return None;
    }
    if stem != "index" {
        segments.push(stem);
    }

    if segments.is_empty() {
        Some("/".to_string())
    } else {
        Some(format!("/{}/", segments.join("/")))
    }
}

/// Templates under `pages_dir`, keyed by module id.
pub fn discover_pages(root: &Path, pages_dir: &Path) -> BTreeMap<String, String> {
    WalkDir::new(pages_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let page = page_path(pages_dir, entry.path())?;
            Some((module_id(root, entry.path()), page))
        })
        .collect()
}

/// Location of a page's page-data file.
pub fn page_data_path(out_dir: &Path, page: &str) -> PathBuf {
    let trimmed = page.trim_matches('/');
    let dir = if trimmed.is_empty() { "index" } else { trimmed };
    out_dir.join("page-data").join(dir).join("page-data.json")
}

fn remove_page_data(out_dir: &Path, page: &str) {
    let path = page_data_path(out_dir, page);
    match std::fs::remove_file(&path) {
        Ok(()) => debug!(page, "removed page data"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(page, path = %path.display(), error = %e, "failed to remove page data"),
    }
}

/// Bring the store's pages in line with the pages directory.
///
/// New page files get `CreatePage`, vanished ones `DeletePage` and lose
/// their page-data file. Templates
/// whose page data is missing on disk are marked pending so the next flush
/// writes them.
pub fn sync_pages(
    store: &dyn StateStore,
    root: &Path,
    pages_dir: &Path,
    out_dir: &Path,
) -> PageSync {
    let discovered = discover_pages(root, pages_dir);
    let snapshot = store.snapshot();
    let pages_prefix = format!("{}/", module_id(root, pages_dir));
    let mut sync = PageSync::default();

    for (component_path, pages) in &snapshot.components {
        if !component_path.starts_with(&pages_prefix) {
            continue;
        }
        for page in pages {
            if discovered.get(component_path) != Some(page) {
                store.dispatch(StoreAction::DeletePage {
                    component_path: component_path.clone(),
                    path: page.clone(),
                });
                sync.deleted += 1;

                // A renamed page file keeps its path and its page data
                if !discovered.values().any(|p| p == page) {
                    remove_page_data(out_dir, page);
                }
            }
        }
    }

    for (component_path, page) in &discovered {
        let known = snapshot
            .components
            .get(component_path)
            .is_some_and(|pages| pages.contains(page));
        if !known {
            store.dispatch(StoreAction::CreatePage {
                component_path: component_path.clone(),
                path: page.clone(),
            });
            sync.created += 1;
        }

        if !page_data_path(out_dir, page).is_file()
            && !snapshot.pending_template_writes.contains(component_path)
        {
            store.dispatch(StoreAction::AddPendingTemplateDataWrite {
                component_path: component_path.clone(),
            });
            sync.pending += 1;
        }
    }

    if !sync.is_empty() {
        debug!(
            created = sync.created,
            deleted = sync.deleted,
            pending = sync.pending,
            "synced pages"
        );
    }
    sync
}
