//! Storage backends
//!
//! One [`StorageBackend`] implementation per backend kind:
//! - [`FlatBlobBackend`] for Blob storage, where "directories" are key prefixes
//! - [`HierarchicalBackend`] for Data Lake storage, with real directory objects
//!
//! Both are thin wrappers over a thread-safe `ObjectStore` handle obtained from a
//! [`StoreProvider`](crate::provider::StoreProvider).

mod blob;
mod datalake;

pub use blob::FlatBlobBackend;
pub use datalake::HierarchicalBackend;

use crate::path::{BackendKind, DecodedPath};
use crate::runtime::block_on;
use crate::{Error, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, GetRange, ObjectMeta, ObjectStore,
};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Metadata key that marks an object as a Data Lake directory
pub const DIRECTORY_MARKER: &str = "hdi_isfolder";

/// Capability set shared by every backend kind
pub trait StorageBackend: Send + Sync + fmt::Debug {
    /// The kind this backend serves
    fn kind(&self) -> BackendKind;

    /// List object names under `path.object_path`, relative to the container.
    ///
    /// Flat storage scans by raw name prefix; hierarchical storage walks the
    /// directory tree, reports directories with a trailing `/` and fails with
    /// [`Error::NotFound`] when the directory does not exist.
    fn list(&self, path: &DecodedPath) -> Result<Vec<String>>;

    /// Read an object, optionally restricted to a byte range
    fn get(&self, path: &DecodedPath, range: ByteRange) -> Result<Bytes>;

    /// Write an object, replacing any previous content
    fn put(&self, path: &DecodedPath, data: Bytes) -> Result<()>;

    /// Delete an object; fails with [`Error::NotFound`] when it is absent
    fn remove(&self, path: &DecodedPath) -> Result<()>;

    /// Fetch object metadata
    fn stat(&self, path: &DecodedPath) -> Result<ObjectInfo>;

    /// Create a directory object
    fn create_dir(&self, path: &DecodedPath) -> Result<()> {
        Err(Error::UnsupportedBackend(format!(
            "{} storage has no directories: {}",
            self.kind(),
            path.object_path
        )))
    }
}

/// Optional byte window for partial reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte to return
    pub offset: Option<usize>,
    /// Number of bytes to return
    pub length: Option<usize>,
}

impl ByteRange {
    /// The whole object
    pub fn full() -> Self {
        Self::default()
    }

    /// `length` bytes starting at `offset`
    pub fn new(offset: Option<usize>, length: Option<usize>) -> Self {
        Self { offset, length }
    }

    /// True when no window was requested
    pub fn is_full(&self) -> bool {
        self.offset.is_none() && self.length.is_none()
    }

    fn to_get_range(self) -> Result<Option<GetRange>> {
        match (self.offset, self.length) {
            (None, None) => Ok(None),
            (Some(offset), None) => Ok(Some(GetRange::Offset(offset))),
            (offset, Some(length)) => {
                let start = offset.unwrap_or(0);
                let end = start.checked_add(length).ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "byte range {}+{} exceeds the addressable size",
                        start, length
                    ))
                })?;
                Ok(Some(GetRange::Bounded(start..end)))
            }
        }
    }
}

/// Classification of a stat result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// A regular file
    File,
    /// A Data Lake directory
    Directory,
    /// Neither marker nor content type was present
    Unknown,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::File => f.write_str("file"),
            ObjectKind::Directory => f.write_str("directory"),
            ObjectKind::Unknown => f.write_str(""),
        }
    }
}

/// Object metadata returned by `stat`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectInfo {
    /// Object path inside the container
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Creation time, when the service reports one
    pub creation_time: Option<DateTime<Utc>>,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
    /// Entity tag
    pub etag: Option<String>,
    /// Declared content type
    pub content_type: Option<String>,
    /// File / directory classification
    pub kind: ObjectKind,
}

impl ObjectInfo {
    fn from_meta(meta: ObjectMeta, content_type: Option<String>, kind: ObjectKind) -> Self {
        Self {
            name: object_name(&meta.location),
            size: meta.size as u64,
            creation_time: None,
            last_modified: meta.last_modified,
            etag: meta.e_tag,
            content_type,
            kind,
        }
    }
}

/// The stored name of `location`, with the store's percent-encoding undone.
///
/// `ObjectPath::from` escapes characters such as `[` or `%` in every part; this
/// is its inverse, so a listed name can be passed back to any operation.
pub(crate) fn object_name(location: &ObjectPath) -> String {
    location
        .parts()
        .map(|part| percent_decode_str(part.as_ref()).decode_utf8_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Object location for single-object operations; the container root is rejected
pub(crate) fn object_location(path: &DecodedPath) -> Result<ObjectPath> {
    let trimmed = path.object_path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidPath(format!(
            "{}: an object path is required after the container",
            path.container_url()
        )));
    }
    if trimmed.contains('*') {
        return Err(Error::InvalidPath(format!(
            "{}: wildcards are only accepted by glob",
            trimmed
        )));
    }
    Ok(ObjectPath::from(trimmed))
}

/// Listing prefix for a directory-like path; `None` means the whole container
pub(crate) fn prefix_location(prefix: &str) -> Option<ObjectPath> {
    let trimmed = prefix.trim_matches('/');
    (!trimmed.is_empty()).then(|| ObjectPath::from(trimmed))
}

/// Recursively list every object below `prefix`
pub(crate) fn list_objects(
    store: &Arc<dyn ObjectStore>,
    prefix: Option<&ObjectPath>,
) -> Result<Vec<ObjectMeta>> {
    let entries: Vec<ObjectMeta> =
        block_on(async { store.list(prefix).try_collect::<Vec<_>>().await })??;
    trace!("Listed {} objects under {:?}", entries.len(), prefix);
    Ok(entries)
}

pub(crate) fn get_object(
    store: &Arc<dyn ObjectStore>,
    location: &ObjectPath,
    range: ByteRange,
) -> Result<Bytes> {
    if range.length == Some(0) {
        head_object(store, location)?;
        return Ok(Bytes::new());
    }

    let options = GetOptions {
        range: range.to_get_range()?,
        ..Default::default()
    };
    let bytes = block_on(async {
        let result = store.get_opts(location, options).await?;
        result.bytes().await
    })??;
    Ok(bytes)
}

pub(crate) fn head_object(store: &Arc<dyn ObjectStore>, location: &ObjectPath) -> Result<ObjectMeta> {
    Ok(block_on(store.head(location))??)
}

/// Metadata plus stored attributes, without transferring the body
pub(crate) fn head_with_attributes(
    store: &Arc<dyn ObjectStore>,
    location: &ObjectPath,
) -> Result<(ObjectMeta, Attributes)> {
    let options = GetOptions {
        head: true,
        ..Default::default()
    };
    let result = block_on(store.get_opts(location, options))??;
    Ok((result.meta, result.attributes))
}

pub(crate) fn remove_object(store: &Arc<dyn ObjectStore>, location: &ObjectPath) -> Result<()> {
    // Stores may treat deleting a missing key as success; absence must surface.
    head_object(store, location)?;
    block_on(store.delete(location))??;
    Ok(())
}

pub(crate) fn content_type_of(attributes: &Attributes) -> Option<String> {
    attributes
        .get(&Attribute::ContentType)
        .map(|value| value.to_string())
}

pub(crate) fn has_directory_marker(attributes: &Attributes) -> bool {
    attributes
        .get(&Attribute::Metadata(DIRECTORY_MARKER.into()))
        .is_some()
}

/// Attributes written with every file
pub(crate) fn file_attributes(location: &ObjectPath) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(
        Attribute::ContentType,
        AttributeValue::from(content_type_for(location.as_ref())),
    );
    attributes
}

/// Content type guessed from the file extension
pub(crate) fn content_type_for(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "json" => "application/json",
        "txt" | "log" => "text/plain",
        "gz" => "application/gzip",
        "xz" => "application/x-xz",
        "zst" => "application/zstd",
        _ => "application/octet-stream",
    }
}
