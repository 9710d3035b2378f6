//! Crash-safe document writes.
//!
//! A write is staged into a temporary file in the target's directory, synced,
//! and only then renamed over the target. Readers observe the old document or
//! the new one, never a prefix of either. Dropping a [`StagedWrite`] without
//! committing it removes the temporary file and leaves the target untouched.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use tempfile::{Builder, NamedTempFile};

use crate::error::{FlowError, Result};

/// Suffix of staged temporary files; never matches a document name.
pub const TEMP_SUFFIX: &str = ".tmp";

/// A fully written and synced temporary file waiting to replace its target.
#[derive(Debug)]
pub struct StagedWrite {
    temp: NamedTempFile,
    target: PathBuf,
    backup: Option<PathBuf>,
}

impl StagedWrite {
    /// Serializes `value` as pretty JSON into a synced temporary file next to
    /// `target`.
    pub fn json<T: Serialize>(target: &Path, value: &T) -> Result<Self> {
        let dir = target.parent().ok_or_else(|| {
            FlowError::invalid_input("path").with_reason(format!(
                "'{}' has no parent directory",
                target.display()
            ))
        })?;
        let stem = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut temp = Builder::new()
            .prefix(&format!(".{stem}."))
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)
            .map_err(|e| FlowError::file_system(dir, e))?;

        let body = serde_json::to_vec_pretty(value).map_err(|e| FlowError::Serialization {
            path: target.to_path_buf(),
            source: e,
        })?;
        temp.write_all(&body)
            .and_then(|()| temp.flush())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| FlowError::file_system(temp.path(), e))?;

        Ok(Self {
            temp,
            target: target.to_path_buf(),
            backup: None,
        })
    }

    /// Copies the current target to `backup` before it is replaced.
    pub fn with_backup(mut self, backup: PathBuf) -> Self {
        self.backup = Some(backup);
        self
    }

    /// Path of the document this write will replace.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Path of the staged temporary file.
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Backs up the existing target, then atomically renames the staged file
    /// over it.
    pub fn commit(self) -> Result<()> {
        if let Some(backup) = &self.backup {
            if self.target.exists() {
                if let Err(e) = fs::copy(&self.target, backup) {
                    warn!(
                        "Failed to back up '{}' to '{}': {e}",
                        self.target.display(),
                        backup.display()
                    );
                }
            }
        }

        self.temp
            .persist(&self.target)
            .map_err(|e| FlowError::file_system(&self.target, e.error))?;
        sync_parent(&self.target);
        debug!("Committed '{}'", self.target.display());
        Ok(())
    }
}

/// Makes the rename itself durable where the platform allows it.
#[cfg(unix)]
fn sync_parent(path: &Path) {
    if let Some(dir) = path.parent() {
        if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
            debug!("Directory sync skipped for '{}': {e}", dir.display());
        }
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) {}
