//! Named cache instances, owned by the host application.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::error::{SdkError, SdkResult};

/// A mapping from instance name to [`Cache`].
///
/// Caches created through the registry start from its default
/// configuration. Removing a name only drops the registry's handle; callers
/// holding the `Arc` keep a working cache.
#[derive(Debug, Default)]
pub struct CacheRegistry {
    caches: RwLock<BTreeMap<String, Arc<Cache>>>,
    defaults: CacheConfig,
}

impl CacheRegistry {
    /// Create an empty registry with default cache settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose new caches use `defaults`.
    pub fn with_defaults(defaults: CacheConfig) -> SdkResult<Self> {
        defaults.validate()?;
        Ok(Self {
            caches: RwLock::new(BTreeMap::new()),
            defaults,
        })
    }

    /// The cache called `name`, created on first use.
    pub fn get_or_create(&self, name: &str) -> SdkResult<Arc<Cache>> {
        if let Some(cache) = self.get(name)? {
            return Ok(cache);
        }
        let mut caches = self.caches.write().map_err(|e| {
            SdkError::LockPoisoned(format!("registry: {e}"))
        })?;
        if let Some(cache) = caches.get(name) {
            return Ok(Arc::clone(cache));
        }
        let cache = Arc::new(Cache::with_config(self.defaults.clone())?);
        caches.insert(name.to_string(), Arc::clone(&cache));
        debug!(name, "created cache instance");
        Ok(cache)
    }

    /// The cache registered as `name`.
    pub fn get(&self, name: &str) -> SdkResult<Option<Arc<Cache>>> {
        let caches = self.caches.read().map_err(|e| {
            SdkError::LockPoisoned(format!("registry: {e}"))
        })?;
        Ok(caches.get(name).cloned())
    }

    /// Forget `name`. Returns `true` if it was registered.
    pub fn remove(&self, name: &str) -> SdkResult<bool> {
        let mut caches = self.caches.write().map_err(|e| {
            SdkError::LockPoisoned(format!("registry: {e}"))
        })?;
        let removed = caches.remove(name).is_some();
        if removed {
            debug!(name, "removed cache instance");
        }
        Ok(removed)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> SdkResult<Vec<String>> {
        let caches = self.caches.read().map_err(|e| {
            SdkError::LockPoisoned(format!("registry: {e}"))
        })?;
        Ok(caches.keys().cloned().collect())
    }
}
