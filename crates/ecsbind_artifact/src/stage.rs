//! All-or-nothing publishing of artifacts
//!
//! Artifacts are first written into a `<output>.staging` directory next to the output directory.
//! [`Stage::commit`] then moves them into place with renames, putting replaced files aside in
//! `<output>.previous` so they can be restored if any rename fails.

use crate::{emit::Artifact, error::ArtifactError};
use log::*;
use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

/// `path` with `suffix` appended to its final component.
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut sibling: OsString = path.as_os_str().to_os_string();
    sibling.push(suffix);
    PathBuf::from(sibling)
}

pub struct Stage {
    target: PathBuf,
    staging: PathBuf,
    staged: Vec<String>,
    committed: bool,
}

impl Stage {
    /// Prepares an empty staging directory for the given output directory. Leftovers of an
    /// interrupted run are cleared.
    pub fn new(target: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let target = target.into();
        let staging = sibling_path(&target, ".staging");

        if staging.exists() {
            debug!("Removing stale staging directory {}", staging.display());
            fs::remove_dir_all(&staging).map_err(|e| ArtifactError::io(&staging, e))?;
        }
        fs::create_dir_all(&staging).map_err(|e| ArtifactError::io(&staging, e))?;

        Ok(Self {
            target,
            staging,
            staged: Vec::new(),
            committed: false,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn write(&mut self, artifact: &Artifact) -> Result<(), ArtifactError> {
        let path = self.staging.join(&artifact.file_name);
        fs::write(&path, &artifact.bytes).map_err(|e| ArtifactError::io(&path, e))?;
        self.staged.push(artifact.file_name.clone());
        Ok(())
    }

    /// Publishes every staged artifact into the output directory. On error, the output
    /// directory is left as it was before the call.
    pub fn commit(mut self) -> Result<Vec<PathBuf>, ArtifactError> {
        fs::create_dir_all(&self.target).map_err(|e| ArtifactError::io(&self.target, e))?;

        let backup = sibling_path(&self.target, ".previous");
        if backup.exists() {
            fs::remove_dir_all(&backup).map_err(|e| ArtifactError::io(&backup, e))?;
        }
        fs::create_dir_all(&backup).map_err(|e| ArtifactError::io(&backup, e))?;

        let mut replaced = Vec::new();
        let mut published = Vec::new();
        let result = self.publish(&backup, &mut replaced, &mut published);

        if let Err(err) = &result {
            error!("Publishing into {} failed: {err}", self.target.display());
            for path in &published {
                if let Err(e) = fs::remove_file(path) {
                    warn!("Couldn't remove partially published {}: {e}", path.display());
                }
            }
            for name in &replaced {
                let from = backup.join(name);
                let to = self.target.join(name);
                if let Err(e) = fs::rename(&from, &to) {
                    error!("Couldn't restore {}: {e}", to.display());
                }
            }
        }

        if let Err(e) = fs::remove_dir_all(&backup) {
            warn!("Couldn't remove {}: {e}", backup.display());
        }
        result?;

        self.committed = true;
        if let Err(e) = fs::remove_dir_all(&self.staging) {
            warn!("Couldn't remove {}: {e}", self.staging.display());
        }
        Ok(published)
    }

    fn publish(
        &self,
        backup: &Path,
        replaced: &mut Vec<String>,
        published: &mut Vec<PathBuf>,
    ) -> Result<(), ArtifactError> {
        for name in &self.staged {
            let destination = self.target.join(name);
            if destination.exists() {
                let aside = backup.join(name);
                fs::rename(&destination, &aside).map_err(|e| ArtifactError::io(&destination, e))?;
                replaced.push(name.clone());
            }

            let source = self.staging.join(name);
            fs::rename(&source, &destination).map_err(|e| ArtifactError::io(&source, e))?;
            published.push(destination);
        }
        Ok(())
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        if !self.committed && self.staging.exists() {
            debug!("Discarding staged artifacts in {}", self.staging.display());
            let _ = fs::remove_dir_all(&self.staging);
        }
    }
}

/// Replaces the file at `path` with `bytes` through a temporary sibling and a rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ArtifactError::io(parent, e))?;
    }

    let temporary = sibling_path(path, ".tmp");
    fs::write(&temporary, bytes).map_err(|e| ArtifactError::io(&temporary, e))?;
    fs::rename(&temporary, path).map_err(|e| {
        let _ = fs::remove_file(&temporary);
        ArtifactError::io(path, e)
    })
}
