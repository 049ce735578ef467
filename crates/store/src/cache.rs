//! Cache invalidation for the generated registry.
//!
//! Hosts that keep a parsed registry in memory register a [`CacheInvalidator`]
//! with the installer; it is called before every read and after every
//! successful write of the registry file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use luya_types::Registry;
use tracing::debug;

use crate::error::Result;
use crate::registry::{JsonRegistryStore, RegistryStore};

/// Best-effort eviction of anything derived from a registry file.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, path: &Path);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInvalidator;

impl CacheInvalidator for NoopInvalidator {
    fn invalidate(&self, _path: &Path) {}
}

impl<T: CacheInvalidator + ?Sized> CacheInvalidator for Arc<T> {
    fn invalidate(&self, path: &Path) {
        (**self).invalidate(path)
    }
}

/// In-process cache of parsed registry files, keyed by path.
#[derive(Debug, Default)]
pub struct RegistryCache {
    entries: DashMap<PathBuf, Arc<Registry>>,
}

impl RegistryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached registry for `path`, reading it on a miss.
    pub async fn get<P: AsRef<Path>>(&self, path: P) -> Result<Arc<Registry>> {
        let path = path.as_ref();
        if let Some(hit) = self.entries.get(path) {
            return Ok(Arc::clone(hit.value()));
        }

        let snapshot = JsonRegistryStore::new(path).load().await?;
        let registry = Arc::new(snapshot.registry);
        self.entries.insert(path.to_path_buf(), Arc::clone(&registry));
        Ok(registry)
    }

    pub fn is_cached(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheInvalidator for RegistryCache {
    fn invalidate(&self, path: &Path) {
        if self.entries.remove(path).is_some() {
            debug!("Evicted cached registry {}", path.display());
        }
    }
}
