//! Backend dispatch

use crate::backend::{FlatBlobBackend, HierarchicalBackend, StorageBackend};
use crate::path::BackendKind;
use crate::provider::StoreProvider;
use crate::{Error, Result};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Maps a [`BackendKind`] to its backend.
///
/// Each backend is created on first use and shared for the lifetime of the
/// registry. Queue storage is recognized by the path decoder but has no
/// backend.
#[derive(Debug)]
pub struct BackendRegistry {
    provider: Arc<dyn StoreProvider>,
    flat: OnceLock<Arc<FlatBlobBackend>>,
    hierarchical: OnceLock<Arc<HierarchicalBackend>>,
}

impl BackendRegistry {
    /// Create a registry whose backends share `provider`
    pub fn new(provider: Arc<dyn StoreProvider>) -> Self {
        Self {
            provider,
            flat: OnceLock::new(),
            hierarchical: OnceLock::new(),
        }
    }

    /// The backend serving `kind`
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedBackend`] for [`BackendKind::Queue`].
    pub fn get_backend(&self, kind: BackendKind) -> Result<Arc<dyn StorageBackend>> {
        match kind {
            BackendKind::Flat => {
                let backend = self.flat.get_or_init(|| {
                    debug!("Initializing blob backend");
                    Arc::new(FlatBlobBackend::new(self.provider.clone()))
                });
                Ok(backend.clone())
            }
            BackendKind::Hierarchical => {
                let backend = self.hierarchical.get_or_init(|| {
                    debug!("Initializing dfs backend");
                    Arc::new(HierarchicalBackend::new(self.provider.clone()))
                });
                Ok(backend.clone())
            }
            BackendKind::Queue => Err(Error::UnsupportedBackend(
                "queue storage does not support file operations".to_string(),
            )),
        }
    }
}
