//! File-per-node persistence. The existence of `<output_dir>/<sanitized id>.json`
//! is the only record of which nodes are complete.

use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use crate::contract::NodeStore;
use crate::error::StoreError;

/// File stem used for the empty identifier (the release root).
pub const ROOT_STEM: &str = "_root";

/// Maps an identifier to its file name: `.` and `/` become `_`, plus `.json`.
pub fn file_name_for(node_id: &str) -> String {
    if node_id.is_empty() {
        return format!("{ROOT_STEM}.json");
    }
    let stem = node_id.replace(['.', '/'], "_");
    format!("{stem}.json")
}

#[derive(Debug, Clone)]
pub struct FileStore {
    output_dir: PathBuf,
}

impl FileStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, node_id: &str) -> PathBuf {
        self.output_dir.join(file_name_for(node_id))
    }

    fn ensure_output_dir(&self) -> Result<(), StoreError> {
        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir).map_err(|e| {
                error!(error = ?e, path = %self.output_dir.display(), "Failed to create output directory");
                StoreError::Io {
                    path: self.output_dir.clone(),
                    source: e,
                }
            })?;
            debug!(path = %self.output_dir.display(), "Created output directory");
        }
        Ok(())
    }
}

impl NodeStore for FileStore {
    fn exists(&self, node_id: &str) -> bool {
        self.path_for(node_id).is_file()
    }

    fn save(&self, node_id: &str, payload: &Value) -> Result<PathBuf, StoreError> {
        self.ensure_output_dir()?;
        let path = self.path_for(node_id);

        let text = serde_json::to_string_pretty(payload).map_err(|e| StoreError::Serialize {
            node_id: node_id.to_string(),
            source: e,
        })?;

        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.clone(),
            source,
        };

        // Written beside the target and renamed, so a half-written file never
        // looks like a completed node.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.output_dir).map_err(io_err)?;
        tmp.write_all(text.as_bytes()).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        debug!(node_id, path = %path.display(), "Wrote node payload");
        Ok(path)
    }

    fn load(&self, node_id: &str) -> Result<Value, StoreError> {
        let path = self.path_for(node_id);
        let text = fs::read_to_string(&path).map_err(|e| StoreError::Io {
            path: path.clone(),
            source: e,
        })?;
        serde_json::from_str(&text).map_err(|e| StoreError::Corrupt { path, source: e })
    }
}
