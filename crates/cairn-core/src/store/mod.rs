//! File-per-flow persistence.
//!
//! Every flow is one pretty-printed JSON document named `<flow_id>.json` in
//! the storage root. Writes go through [`atomic::StagedWrite`], and the
//! previous version of a document is preserved as `<flow_id>.json.backup`
//! before it is overwritten. Older document shapes are upgraded once at load
//! time by [`migrations::upgrade`].

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, info, warn};

use crate::{
    error::{FlowError, Result},
    models::Flow,
};

pub mod atomic;
pub mod migrations;

pub use atomic::StagedWrite;

/// Extension of flow documents.
pub const DOCUMENT_EXTENSION: &str = "json";

/// Suffix appended to a document name for its backup copy.
pub const BACKUP_SUFFIX: &str = ".backup";

/// Durable storage of one JSON document per flow id.
#[derive(Debug, Clone)]
pub struct FlowRepository {
    root: PathBuf,
}

impl FlowRepository {
    /// Opens a repository rooted at `root`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| FlowError::file_system(&root, e))?;
        Ok(Self { root })
    }

    /// The storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for `id`.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.{DOCUMENT_EXTENSION}"))
    }

    /// Path of the backup copy for `id`.
    pub fn backup_path_for(&self, id: &str) -> PathBuf {
        self.root
            .join(format!("{id}.{DOCUMENT_EXTENSION}{BACKUP_SUFFIX}"))
    }

    /// Whether a document for `id` exists.
    pub fn exists(&self, id: &str) -> bool {
        validate_id(id).is_ok() && self.path_for(id).is_file()
    }

    /// Modification time of the document for `id`, or `None` if absent.
    pub fn modified(&self, id: &str) -> Result<Option<SystemTime>> {
        validate_id(id)?;
        let path = self.path_for(id);
        match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(mtime) => Ok(Some(mtime)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FlowError::file_system(path, e)),
        }
    }

    /// Ids of every document in the storage root, sorted.
    ///
    /// Backups, staged temporary files and hidden files are ignored.
    pub fn list_ids(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| FlowError::file_system(&self.root, e))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FlowError::file_system(&self.root, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_id(stem).is_ok() && path.is_file() {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Loads the flow stored under `id`, or `None` if there is no document.
    ///
    /// A document in an older shape is upgraded in memory; the file itself is
    /// rewritten only by the next save.
    pub fn load(&self, id: &str) -> Result<Option<Flow>> {
        validate_id(id)?;
        let path = self.path_for(id);
        // Raw bytes so that invalid UTF-8 surfaces as a parse error.
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FlowError::file_system(path, e)),
        };

        let parse_error = |source| FlowError::Serialization {
            path: path.clone(),
            source,
        };
        let mut doc: serde_json::Value = serde_json::from_slice(&bytes).map_err(parse_error)?;
        if migrations::upgrade(&mut doc, id) {
            info!("Upgraded legacy document '{}'", path.display());
        }
        let flow: Flow = serde_json::from_value(doc).map_err(parse_error)?;

        if flow.id != id {
            warn!(
                "Document '{}' carries id '{}'; using the file name",
                path.display(),
                flow.id
            );
            return Ok(Some(Flow {
                id: id.to_string(),
                ..flow
            }));
        }
        Ok(Some(flow))
    }

    /// Loads every flow in the storage root.
    ///
    /// A document that fails to parse is skipped with a warning; I/O errors
    /// on the directory itself are returned.
    pub fn load_all(&self) -> Result<BTreeMap<String, Flow>> {
        let mut flows = BTreeMap::new();
        for id in self.list_ids()? {
            match self.load(&id) {
                Ok(Some(flow)) => {
                    flows.insert(id, flow);
                }
                Ok(None) => debug!("Flow '{id}' disappeared while loading"),
                Err(e @ FlowError::Serialization { .. }) => {
                    warn!("Skipping unreadable flow document: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(flows)
    }

    /// Stages `flow` for writing without touching its document.
    pub fn stage(&self, flow: &Flow) -> Result<StagedWrite> {
        validate_id(&flow.id)?;
        Ok(StagedWrite::json(&self.path_for(&flow.id), flow)?
            .with_backup(self.backup_path_for(&flow.id)))
    }

    /// Atomically writes `flow`, backing up the previous version.
    pub fn save(&self, flow: &Flow) -> Result<()> {
        self.stage(flow)?.commit()?;
        debug!("Saved flow '{}'", flow.id);
        Ok(())
    }

    /// Atomically writes each flow; the guarantee is per document.
    pub fn save_all(&self, flows: &BTreeMap<String, Flow>) -> Result<()> {
        for flow in flows.values() {
            self.save(flow)?;
        }
        Ok(())
    }

    /// Removes the document for `id` and its backup.
    ///
    /// Returns whether a document was removed; deleting an absent id is not
    /// an error.
    pub fn delete(&self, id: &str) -> Result<bool> {
        validate_id(id)?;
        let path = self.path_for(id);
        let removed = remove_if_present(&path)?;
        remove_if_present(&self.backup_path_for(id))?;
        if removed {
            debug!("Deleted flow document '{}'", path.display());
        }
        Ok(removed)
    }
}

fn remove_if_present(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FlowError::file_system(path, e)),
    }
}

/// Ids double as file names, so they are restricted to a safe alphabet.
fn validate_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(FlowError::invalid_input("id").with_reason(format!("'{id}' is not a valid flow id")))
    }
}
