//! Testing utilities and fixtures for azfs
//!
//! [`TestStorage`] wires an [`AzFileClient`] to in-memory stores, so tests run
//! the real path decoding, dispatch and backend code without a network.

use anyhow::Result;
use azfs_core::{AzFileClient, Config, InMemoryStoreProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub mod assertions;
pub mod fixtures;

/// Storage account used by every test URL
pub const ACCOUNT: &str = "testazfs";

/// Container used by every test URL
pub const CONTAINER: &str = "test_container";

/// A client backed by in-memory stores
pub struct TestStorage {
    client: AzFileClient,
}

impl TestStorage {
    /// Storage with the default configuration
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Storage with a custom configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            client: AzFileClient::with_provider(Arc::new(InMemoryStoreProvider::new()), config),
        }
    }

    /// The client under test
    pub fn client(&self) -> &AzFileClient {
        &self.client
    }

    /// Blob URL for `path` inside the test container
    pub fn blob_url(&self, path: &str) -> String {
        format!(
            "https://{}.blob.core.windows.net/{}/{}",
            ACCOUNT, CONTAINER, path
        )
    }

    /// Data Lake URL for `path` inside the test container
    ///
    /// Blob and Data Lake URLs of the same path address the same object.
    pub fn dfs_url(&self, path: &str) -> String {
        format!(
            "https://{}.dfs.core.windows.net/{}/{}",
            ACCOUNT, CONTAINER, path
        )
    }

    /// Store `content` at a full URL
    pub fn seed(&self, url: &str, content: &[u8]) -> Result<()> {
        self.client.put(url, content.to_vec())?;
        Ok(())
    }
}

impl Default for TestStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates a temporary local directory with cleanup on drop
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    /// Creates a new temporary test directory
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// Returns the path to the temporary directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Creates a file with the given name and content in the test directory
    pub fn create_file(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }
}
