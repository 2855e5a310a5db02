//! Filesystem cache backend
//!
//! Layout: `<root>/<state id>/<stage>/<name>`.

use super::{ArtifactKey, ArtifactStore};
use crate::types::*;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where an artifact lives on disk
    pub fn path_for(&self, key: &ArtifactKey) -> Result<PathBuf> {
        for part in [key.state_id.as_str(), key.name.as_str()] {
            if part.is_empty() || part.contains(['/', '\\']) || part == "." || part == ".." {
                return Err(PipelineError::Cache(format!(
                    "Invalid cache key component: {:?}",
                    part
                )));
            }
        }
        Ok(self
            .root
            .join(&key.state_id)
            .join(key.stage.dir_name())
            .join(&key.name))
    }
}

impl ArtifactStore for FsStore {
    fn read(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>> {
        match std::fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Rename into place so an interrupted run never leaves a partial artifact
        let partial = path.with_file_name(format!("{}.partial", key.name));
        std::fs::write(&partial, bytes)?;
        std::fs::rename(&partial, &path)?;
        Ok(())
    }

    fn contains(&self, key: &ArtifactKey) -> Result<bool> {
        Ok(self.path_for(key)?.is_file())
    }
}
