//! In-memory cache backend

use super::{ArtifactKey, ArtifactStore};
use crate::types::*;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct MemoryStore {
    artifacts: Mutex<HashMap<ArtifactKey, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts
    pub fn len(&self) -> usize {
        self.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<ArtifactKey, Vec<u8>>>> {
        self.artifacts
            .lock()
            .map_err(|_| PipelineError::Cache("memory store lock poisoned".to_string()))
    }
}

impl ArtifactStore for MemoryStore {
    fn read(&self, key: &ArtifactKey) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<()> {
        self.lock()?.insert(key.clone(), bytes.to_vec());
        Ok(())
    }

    fn contains(&self, key: &ArtifactKey) -> Result<bool> {
        Ok(self.lock()?.contains_key(key))
    }
}
