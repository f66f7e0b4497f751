//! The path-based storage client

use crate::backend::{ByteRange, ObjectInfo, ObjectKind, StorageBackend};
use crate::batch::{BatchReader, PathSpec};
use crate::codec::{self, Compression, CsvChunks, Delimiter, Lines};
use crate::config::Config;
use crate::glob::GlobEngine;
use crate::listing;
use crate::path::DecodedPath;
use crate::provider::{AzureStoreProvider, StoreProvider};
use crate::reader::ObjectReader;
use crate::registry::BackendRegistry;
use crate::writer::ObjectWriter;
use crate::{Error, Result};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::BufReader;
use std::sync::Arc;
use tracing::{debug, info};

/// Single entry point for Blob and Data Lake storage URLs.
///
/// Every method takes a full URL such as
/// `https://<account>.blob.core.windows.net/<container>/<path>`; the host picks
/// the backend. URLs are decoded before any request is sent, so malformed paths
/// fail without side effects.
///
/// The client is synchronous and must not be called from inside an async
/// runtime.
#[derive(Debug)]
pub struct AzFileClient {
    registry: BackendRegistry,
    config: Config,
}

impl AzFileClient {
    /// Create a client talking to Azure Storage
    pub fn new(config: Config) -> Self {
        let provider = Arc::new(AzureStoreProvider::new(config.storage.clone()));
        Self::with_provider(provider, config)
    }

    /// Create a client whose stores come from `provider`
    pub fn with_provider(provider: Arc<dyn StoreProvider>, config: Config) -> Self {
        Self {
            registry: BackendRegistry::new(provider),
            config,
        }
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn resolve(&self, path: &str) -> Result<(Arc<dyn StorageBackend>, DecodedPath)> {
        let decoded = DecodedPath::decode(path)?;
        let backend = self.registry.get_backend(decoded.backend_kind)?;
        Ok((backend, decoded))
    }

    /// Whether `path` exists; only a not-found answer maps to `false`
    pub fn exists(&self, path: &str) -> Result<bool> {
        match self.stat(path) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// List the entries directly below `path`.
    ///
    /// Files are returned by name and sub-directories as `name/`. With
    /// `attach_prefix` every entry is turned into a full URL.
    pub fn ls(&self, path: &str, attach_prefix: bool) -> Result<Vec<String>> {
        let (backend, decoded) = self.resolve(path)?;
        let raw = backend.list(&decoded)?;
        let names = listing::filter(&raw, &decoded.object_path);
        debug!("ls {}: {} entries", path, names.len());

        if !attach_prefix {
            return Ok(names);
        }
        let mut base = decoded.url_for(&decoded.object_path);
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(names.into_iter().map(|name| format!("{}{}", base, name)).collect())
    }

    /// Full URLs of the objects matching `pattern`
    ///
    /// See [`GlobEngine::glob`] for the pattern rules.
    pub fn glob(&self, pattern: &str) -> Result<Vec<String>> {
        GlobEngine::new(&self.registry).glob(pattern)
    }

    /// Read a whole object.
    ///
    /// Paths ending in `.gz` are gunzipped unless `codec.decompress_gz_suffix`
    /// is turned off.
    pub fn get(&self, path: &str) -> Result<Bytes> {
        let (backend, decoded) = self.resolve(path)?;
        let data = backend.get(&decoded, ByteRange::full())?;
        if self.config.codec.decompress_gz_suffix {
            codec::decompress_gz_suffix(&decoded.object_path, data)
        } else {
            Ok(data)
        }
    }

    /// Read raw bytes, optionally limited to `length` bytes from `offset`
    pub fn get_range(
        &self,
        path: &str,
        offset: Option<usize>,
        length: Option<usize>,
    ) -> Result<Bytes> {
        let (backend, decoded) = self.resolve(path)?;
        backend.get(&decoded, ByteRange::new(offset, length))
    }

    /// Write an object, replacing any existing content
    pub fn put(&self, path: &str, data: impl Into<Bytes>) -> Result<()> {
        let (backend, decoded) = self.resolve(path)?;
        backend.put(&decoded, data.into())
    }

    /// Delete an object
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] when nothing is stored at `path`.
    pub fn remove(&self, path: &str) -> Result<()> {
        let (backend, decoded) = self.resolve(path)?;
        backend.remove(&decoded)
    }

    /// Object metadata
    pub fn stat(&self, path: &str) -> Result<ObjectInfo> {
        let (backend, decoded) = self.resolve(path)?;
        backend.stat(&decoded)
    }

    /// Copy the raw bytes of `src` to `dst`, possibly across backends.
    ///
    /// # Errors
    /// - [`Error::InvalidArgument`] when `src` and `dst` are the same object
    /// - [`Error::AlreadyExists`] when `dst` exists and `overwrite` is false
    pub fn copy(&self, src: &str, dst: &str, overwrite: bool) -> Result<()> {
        let (src_backend, src_path) = self.resolve(src)?;
        let (dst_backend, dst_path) = self.resolve(dst)?;

        if src_path == dst_path {
            return Err(Error::InvalidArgument(format!(
                "source and destination must differ: {}",
                src
            )));
        }
        if !overwrite && self.exists(dst)? {
            return Err(Error::AlreadyExists(format!(
                "{} (set overwrite to replace it)",
                dst
            )));
        }

        let data = src_backend.get(&src_path, ByteRange::full())?;
        info!("Copying {} bytes from {} to {}", data.len(), src, dst);
        dst_backend.put(&dst_path, data)
    }

    /// Entity tag of the object, when the service reports one
    pub fn checksum(&self, path: &str) -> Result<Option<String>> {
        Ok(self.stat(path)?.etag)
    }

    /// Size of the object in bytes
    pub fn size(&self, path: &str) -> Result<u64> {
        Ok(self.stat(path)?.size)
    }

    /// Whether `path` is a Data Lake directory
    pub fn isdir(&self, path: &str) -> Result<bool> {
        self.is_kind(path, ObjectKind::Directory)
    }

    /// Whether `path` is a file
    pub fn isfile(&self, path: &str) -> Result<bool> {
        self.is_kind(path, ObjectKind::File)
    }

    fn is_kind(&self, path: &str, kind: ObjectKind) -> Result<bool> {
        match self.stat(path) {
            Ok(info) => Ok(info.kind == kind),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create a directory (Data Lake only)
    pub fn mkdir(&self, path: &str) -> Result<()> {
        let (backend, decoded) = self.resolve(path)?;
        backend.create_dir(&decoded)
    }

    /// Open an object for buffered, seekable reading
    pub fn open(&self, path: &str) -> Result<ObjectReader> {
        let (backend, decoded) = self.resolve(path)?;
        ObjectReader::new(backend, decoded, self.config.io.read_buffer_size)
    }

    /// Create an object through a writer; content is committed on finalize
    pub fn create(&self, path: &str) -> Result<ObjectWriter> {
        let (backend, decoded) = self.resolve(path)?;
        Ok(ObjectWriter::new(
            backend,
            decoded,
            self.config.io.write_buffer_size,
        ))
    }

    /// Iterate over the lines of a text object
    pub fn read_line_iter(&self, path: &str) -> Result<Lines<BufReader<ObjectReader>>> {
        Ok(Lines::new(BufReader::new(self.open(path)?)))
    }

    /// Deserialize the records of a CSV object with a header line
    pub fn read_csv<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        codec::read_records(&self.get(path)?, Delimiter::Comma)
    }

    /// Deserialize the records of a tab-separated object with a header line
    pub fn read_table<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        codec::read_records(&self.get(path)?, Delimiter::Tab)
    }

    /// Stream a CSV object in groups of at most `chunk_size` records
    pub fn read_csv_chunks<T: DeserializeOwned>(
        &self,
        path: &str,
        chunk_size: usize,
    ) -> Result<CsvChunks<ObjectReader, T>> {
        CsvChunks::new(self.open(path)?, chunk_size)
    }

    /// Write records as CSV with a header line
    pub fn write_csv<T: Serialize>(&self, path: &str, records: &[T]) -> Result<()> {
        self.put(path, codec::write_records(records, Delimiter::Comma)?)
    }

    /// Write records as tab-separated text with a header line
    pub fn write_table<T: Serialize>(&self, path: &str, records: &[T]) -> Result<()> {
        self.put(path, codec::write_records(records, Delimiter::Tab)?)
    }

    /// Deserialize a JSON object
    pub fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(serde_json::from_slice(&self.get(path)?)?)
    }

    /// Serialize `value` as JSON
    pub fn write_json<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> Result<()> {
        self.put(path, serde_json::to_vec(value)?)
    }

    /// Read a binary payload stored with `compression`
    ///
    /// The suffix-driven `.gz` handling of [`AzFileClient::get`] does not apply.
    pub fn read_compressed(&self, path: &str, compression: Compression) -> Result<Vec<u8>> {
        let data = self.get_range(path, None, None)?;
        compression.decompress(&data)
    }

    /// Store a binary payload with `compression`
    pub fn write_compressed(&self, path: &str, data: &[u8], compression: Compression) -> Result<()> {
        self.put(path, compression.compress(data)?)
    }

    /// Read several objects as one collection.
    ///
    /// `paths` is either a single URL, expanded with [`AzFileClient::glob`]
    /// when it contains `*`, or an explicit list.
    pub fn read(&self, paths: impl Into<PathSpec>) -> Result<BatchReader<'_>> {
        let paths = match paths.into() {
            PathSpec::One(path) if path.contains('*') => self.glob(&path)?,
            PathSpec::One(path) => vec![path],
            PathSpec::Many(paths) => paths,
        };
        Ok(BatchReader::new(self, paths).parallel(self.config.read.parallel))
    }
}
