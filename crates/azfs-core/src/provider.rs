//! Store provisioning
//!
//! A [`StoreProvider`] hands out the long-lived `ObjectStore` handle for an
//! `(account, container)` pair. Backends never build network clients themselves.

use crate::config::StorageConfig;
use crate::path::DecodedPath;
use crate::Result;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Source of object store handles
pub trait StoreProvider: Send + Sync + fmt::Debug {
    /// Return the store serving the account and container of `path`
    fn store(&self, path: &DecodedPath) -> Result<Arc<dyn ObjectStore>>;
}

type StoreKey = (String, String);

/// Shared handle cache keyed by account and container
#[derive(Default)]
struct StoreCache {
    stores: Mutex<HashMap<StoreKey, Arc<dyn ObjectStore>>>,
}

impl StoreCache {
    fn get_or_try_insert(
        &self,
        path: &DecodedPath,
        build: impl FnOnce() -> Result<Arc<dyn ObjectStore>>,
    ) -> Result<Arc<dyn ObjectStore>> {
        let key = (path.account.clone(), path.container.clone());
        let mut stores = self.stores.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(store) = stores.get(&key) {
            return Ok(store.clone());
        }
        let store = build()?;
        stores.insert(key, store.clone());
        Ok(store)
    }

    fn len(&self) -> usize {
        self.stores.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Builds `MicrosoftAzure` stores from the environment
///
/// Credentials come from the `AZURE_STORAGE_*` variables understood by
/// `MicrosoftAzureBuilder::from_env`.
pub struct AzureStoreProvider {
    settings: StorageConfig,
    cache: StoreCache,
}

impl AzureStoreProvider {
    /// Create a provider with the given connection settings
    pub fn new(settings: StorageConfig) -> Self {
        Self {
            settings,
            cache: StoreCache::default(),
        }
    }
}

impl fmt::Debug for AzureStoreProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureStoreProvider")
            .field("settings", &self.settings)
            .field("stores", &self.cache.len())
            .finish()
    }
}

impl StoreProvider for AzureStoreProvider {
    fn store(&self, path: &DecodedPath) -> Result<Arc<dyn ObjectStore>> {
        self.cache.get_or_try_insert(path, || {
            debug!(
                "Creating Azure store for account '{}' container '{}'",
                path.account, path.container
            );
            let mut builder = MicrosoftAzureBuilder::from_env()
                .with_account(&path.account)
                .with_container_name(&path.container)
                .with_use_emulator(self.settings.use_emulator)
                .with_allow_http(self.settings.allow_http);
            if let Some(endpoint) = &self.settings.endpoint {
                builder = builder.with_endpoint(endpoint.clone());
            }
            Ok(Arc::new(builder.build()?))
        })
    }
}

/// Keeps one in-memory store per account and container
///
/// Blob and dfs URLs of the same account share data, as the two endpoints of
/// a hierarchical-namespace account do.
#[derive(Default)]
pub struct InMemoryStoreProvider {
    cache: StoreCache,
}

impl InMemoryStoreProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for InMemoryStoreProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryStoreProvider")
            .field("stores", &self.cache.len())
            .finish()
    }
}

impl StoreProvider for InMemoryStoreProvider {
    fn store(&self, path: &DecodedPath) -> Result<Arc<dyn ObjectStore>> {
        self.cache
            .get_or_try_insert(path, || Ok(Arc::new(InMemory::new())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_stores_are_shared_per_container() {
        let provider = InMemoryStoreProvider::new();
        let blob = DecodedPath::decode("https://acct.blob.core.windows.net/c/a.csv").unwrap();
        let dfs = DecodedPath::decode("https://acct.dfs.core.windows.net/c/b.csv").unwrap();
        let other = DecodedPath::decode("https://acct.blob.core.windows.net/other/a.csv").unwrap();

        let first = provider.store(&blob).unwrap();
        let second = provider.store(&dfs).unwrap();
        let third = provider.store(&other).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &third));
    }
}
