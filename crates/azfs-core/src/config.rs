//! Configuration module

use crate::{Error, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "AZFS_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Settings applied when building Azure stores
    #[serde(default)]
    pub storage: StorageConfig,
    /// Buffer sizes for streamed reads and writes
    #[serde(default)]
    pub io: IoConfig,
    /// Codec behavior
    #[serde(default)]
    pub codec: CodecConfig,
    /// Multi-object read behavior
    #[serde(default)]
    pub read: ReadConfig,
}

/// Storage connection settings
///
/// Credentials are not part of the configuration; the storage SDK reads
/// them from its own `AZURE_STORAGE_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Talk to the local Azurite emulator
    #[serde(default)]
    pub use_emulator: bool,
    /// Allow plain HTTP endpoints
    #[serde(default)]
    pub allow_http: bool,
    /// Override the service endpoint
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// I/O buffer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Bytes fetched per ranged read (default: 8MB)
    pub read_buffer_size: usize,
    /// Bytes held by a writer before it is committed (default: 8MB)
    pub write_buffer_size: usize,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 8 * 1024 * 1024,
            write_buffer_size: 8 * 1024 * 1024,
        }
    }
}

/// Codec configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Gunzip full reads of paths ending in `.gz`
    pub decompress_gz_suffix: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            decompress_gz_suffix: true,
        }
    }
}

/// Batch read configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadConfig {
    /// Read multiple objects in parallel
    #[serde(default)]
    pub parallel: bool,
}

impl Config {
    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| Error::Config("Unable to determine config directory".to_string()))?;

        Ok(config_dir.join("azfs").join("config.toml"))
    }

    /// Load configuration from the first available source.
    ///
    /// Order: `explicit` path, then `AZFS_CONFIG`, then the default path if
    /// that file exists, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load_from(Path::new(&path));
        }

        match Self::config_path() {
            Ok(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get default configuration content with comments
    pub fn default_config_content() -> String {
        r#"# azfs configuration file

[storage]
# Use the local Azurite emulator instead of *.core.windows.net
use_emulator = false
# Allow plain HTTP endpoints
allow_http = false
# endpoint = "http://127.0.0.1:10000/devstoreaccount1"

[io]
# Bytes fetched per ranged read
read_buffer_size = 8388608
# Bytes buffered by a writer before upload
write_buffer_size = 8388608

[codec]
# Decompress full reads of paths ending in .gz
decompress_gz_suffix = true

[read]
# Read files matched by a pattern in parallel
parallel = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_content_parses_to_defaults() {
        let parsed = Config::from_toml(&Config::default_config_content()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed = Config::from_toml("[read]\nparallel = true\n").unwrap();
        assert!(parsed.read.parallel);
        assert!(parsed.codec.decompress_gz_suffix);
        assert_eq!(parsed.io.read_buffer_size, 8 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let err = Config::from_toml("[io]\nread_buffer_size = \"big\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_save_and_load_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.storage.use_emulator = true;
        config.io.read_buffer_size = 1024;
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }
}
