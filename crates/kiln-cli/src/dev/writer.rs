//! Page-data artifact writer.

use crate::dev::pages::page_data_path;
use async_trait::async_trait;
use kiln_core::{ArtifactRecord, ArtifactWriter, CoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of one `page-data.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub component_chunk_name: String,
    pub path: String,
    pub static_query_hashes: Vec<String>,
}

/// Chunk name for a template: `src/pages/index.js` becomes
/// `component---src-pages-index-js`.
pub fn component_chunk_name(component_path: &str) -> String {
    let sanitized: String = component_path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("component---{}", sanitized)
}

/// Writes `<outDir>/page-data/<page>/page-data.json` for every page of a
/// template.
pub struct PageDataWriter {
    out_dir: PathBuf,
}

impl PageDataWriter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    async fn write_page(&self, data: &PageData) -> std::io::Result<()> {
        let target = page_data_path(&self.out_dir, &data.path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(data)?;
        let tmp = target.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &target).await
    }
}

#[async_trait]
impl ArtifactWriter for PageDataWriter {
    async fn write(&self, record: &ArtifactRecord) -> kiln_core::Result<()> {
        let chunk_name = component_chunk_name(&record.component_path);
        let static_query_hashes: Vec<String> =
            record.static_query_hashes.iter().cloned().collect();

        for page in &record.pages {
            let data = PageData {
                component_chunk_name: chunk_name.clone(),
                path: page.clone(),
                static_query_hashes: static_query_hashes.clone(),
            };
            self.write_page(&data)
                .await
                .map_err(|e| CoreError::ArtifactWrite {
                    component_path: record.component_path.clone(),
                    message: format!("{}: {}", page, e),
                })?;
        }

        tracing::trace!(
            component = %record.component_path,
            pages = record.pages.len(),
            "wrote page data"
        );
        Ok(())
    }
}
