//! Artifact cache
//!
//! Intermediate artifacts are keyed by historical state, stage and file
//! name. The cache is read-through: an artifact that exists is returned
//! as is and never rebuilt. Nothing is ever invalidated.

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Pipeline stage an artifact belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Compiled document
    Document,
    /// Rasterized pages and their manifest
    Pages,
    /// Composited flatplans
    Composite,
}

impl Stage {
    pub fn dir_name(self) -> &'static str {
        match self {
            Stage::Document => "document",
            Stage::Pages => "pages",
            Stage::Composite => "composite",
        }
    }
}

/// Location of one artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub state_id: String,
    pub stage: Stage,
    pub name: String,
}

impl ArtifactKey {
    pub fn new(state_id: impl Into<String>, stage: Stage, name: impl Into<String>) -> Self {
        Self {
            state_id: state_id.into(),
            stage,
            name: name.into(),
        }
    }

    /// Compiled document of a state
    pub fn document(state_id: &str) -> Self {
        Self::new(state_id, Stage::Document, "document.pdf")
    }

    /// Rasterized page `index` of a state, e.g. `page-007.png`
    pub fn page(state_id: &str, index: usize) -> Self {
        Self::new(state_id, Stage::Pages, format!("page-{:03}.png", index))
    }

    /// Marker written once every page of a state is rasterized
    pub fn manifest(state_id: &str) -> Self {
        Self::new(state_id, Stage::Pages, "manifest.json")
    }

    /// Flatplan of a state for a layout fingerprint and background colour
    pub fn composite(state_id: &str, fingerprint: &str, background: [u8; 4]) -> Self {
        let [r, g, b, a] = background;
        Self::new(
            state_id,
            Stage::Composite,
            format!(
                "flatplan-{}-{:02x}{:02x}{:02x}{:02x}.png",
                fingerprint, r, g, b, a
            ),
        )
    }
}

/// Storage backend for cached artifacts
pub trait ArtifactStore: Send + Sync {
    /// Bytes of an artifact, or `None` when it has not been stored
    fn read(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>>;

    /// Store an artifact, replacing any previous bytes
    fn write(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()>;

    fn contains(&self, key: &ArtifactKey) -> Result<bool> {
        Ok(self.read(key)?.is_some())
    }
}

impl<S: ArtifactStore + ?Sized> ArtifactStore for Arc<S> {
    fn read(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>> {
        (**self).read(key)
    }

    fn write(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()> {
        (**self).write(key, bytes)
    }

    fn contains(&self, key: &ArtifactKey) -> Result<bool> {
        (**self).contains(key)
    }
}

/// Page count and page shape of a fully rasterized state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageManifest {
    pub page_count: usize,
    /// Pixel size of the first page; zero when there are no pages
    pub page_width: u32,
    pub page_height: u32,
}

impl PageManifest {
    /// Width over height of the pages, if there are any
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.page_width > 0 && self.page_height > 0)
            .then(|| self.page_width as f64 / self.page_height as f64)
    }
}

/// Read-through cache over a storage backend
pub struct ArtifactCache<S> {
    store: S,
}

impl<S: ArtifactStore> ArtifactCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn read(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>> {
        self.store.read(key)
    }

    pub fn write(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()> {
        self.store.write(key, bytes)
    }

    /// Return the cached artifact, or build, store and return it.
    ///
    /// The flag is `true` when the bytes came from the cache.
    pub fn get_or_insert_with(
        &self,
        key: &ArtifactKey,
        build: impl FnOnce() -> Result<Vec<u8>>,
    ) -> Result<(Vec<u8>, bool)> {
        if let Some(bytes) = self.store.read(key)? {
            log::debug!("Cache hit: {}/{}/{}", key.state_id, key.stage.dir_name(), key.name);
            return Ok((bytes, true));
        }

        let bytes = build()?;
        self.store.write(key, &bytes)?;
        Ok((bytes, false))
    }

    pub fn read_manifest(&self, state_id: &str) -> Result<Option<PageManifest>> {
        let Some(bytes) = self.store.read(&ArtifactKey::manifest(state_id))? else {
            return Ok(None);
        };
        let manifest = serde_json::from_slice(&bytes).map_err(|e| {
            PipelineError::Cache(format!("Corrupt page manifest for {}: {}", state_id, e))
        })?;
        Ok(Some(manifest))
    }

    pub fn write_manifest(&self, state_id: &str, manifest: &PageManifest) -> Result<()> {
        let json = serde_json::to_vec_pretty(manifest)
            .map_err(|e| PipelineError::Cache(format!("Failed to serialize manifest: {}", e)))?;
        self.store.write(&ArtifactKey::manifest(state_id), &json)
    }
}
