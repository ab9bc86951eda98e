//! Caches values loaded from files using the canonical file path as the key.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;

/// Cache of values computed from files.
///
/// The cache is an explicit value passed to the loaders that use it
/// so that callers decide its lifetime and can invalidate entries
/// when a file changes.
pub struct ModuleCache<T> {
    entries: DashMap<PathBuf, Arc<T>>,
}

impl<T> Default for ModuleCache<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T> ModuleCache<T> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Default::default()
    }

    fn key(file: &Path) -> PathBuf {
        std::fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf())
    }

    /// Get a cached value or load it and insert it into the cache.
    ///
    /// The cache is not locked while `load` runs so loaders may
    /// use the cache for other files.
    pub fn get_or_load<P, F>(&self, file: P, load: F) -> Result<Arc<T>>
    where
        P: AsRef<Path>,
        F: FnOnce(&Path) -> Result<T>,
    {
        let key = Self::key(file.as_ref());
        if let Some(entry) = self.entries.get(&key) {
            return Ok(Arc::clone(entry.value()));
        }
        let value = Arc::new(load(&key)?);
        let entry = self.entries.entry(key).or_insert(value);
        Ok(Arc::clone(entry.value()))
    }

    /// Determine if a file has a cached value.
    pub fn contains<P: AsRef<Path>>(&self, file: P) -> bool {
        self.entries.contains_key(&Self::key(file.as_ref()))
    }

    /// Remove the cached value for a file.
    pub fn invalidate<P: AsRef<Path>>(&self, file: P) -> Option<Arc<T>> {
        self.entries
            .remove(&Self::key(file.as_ref()))
            .map(|(_, value)| value)
    }

    /// Remove all cached values.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cached values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Determine if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
