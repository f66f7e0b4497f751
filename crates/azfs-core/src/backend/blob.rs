//! Blob storage backend

use super::{
    content_type_of, file_attributes, get_object, head_with_attributes, list_objects,
    object_location, object_name, prefix_location, remove_object, ByteRange, ObjectInfo,
    ObjectKind, StorageBackend,
};
use crate::path::{BackendKind, DecodedPath};
use crate::provider::StoreProvider;
use crate::runtime::block_on;
use crate::Result;
use bytes::Bytes;
use object_store::PutOptions;
use std::sync::Arc;
use tracing::debug;

/// Backend for flat Blob storage
///
/// Keys form a flat namespace: listing is a raw name-prefix scan and there are
/// no directory objects.
#[derive(Debug)]
pub struct FlatBlobBackend {
    provider: Arc<dyn StoreProvider>,
}

impl FlatBlobBackend {
    /// Create a backend that obtains stores from `provider`
    pub fn new(provider: Arc<dyn StoreProvider>) -> Self {
        Self { provider }
    }
}

impl StorageBackend for FlatBlobBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Flat
    }

    fn list(&self, path: &DecodedPath) -> Result<Vec<String>> {
        debug!("blob list {}/{}", path.container, path.object_path);
        let store = self.provider.store(path)?;

        // The store lists by whole segments, so start at the last complete segment
        // and apply the raw prefix afterwards: `dir/te` must match `dir/test1.csv`.
        let prefix = path.object_path.as_str();
        let segment_prefix = prefix.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        let location = prefix_location(segment_prefix);

        let names = list_objects(&store, location.as_ref())?
            .into_iter()
            .map(|meta| object_name(&meta.location))
            .filter(|name| name.starts_with(prefix))
            .collect();
        Ok(names)
    }

    fn get(&self, path: &DecodedPath, range: ByteRange) -> Result<Bytes> {
        debug!("blob get {}/{} {:?}", path.container, path.object_path, range);
        let store = self.provider.store(path)?;
        let location = object_location(path)?;
        get_object(&store, &location, range)
    }

    fn put(&self, path: &DecodedPath, data: Bytes) -> Result<()> {
        debug!(
            "blob put {}/{} ({} bytes)",
            path.container,
            path.object_path,
            data.len()
        );
        let store = self.provider.store(path)?;
        let location = object_location(path)?;
        let options = PutOptions {
            attributes: file_attributes(&location),
            ..Default::default()
        };
        block_on(store.put_opts(&location, data.into(), options))??;
        Ok(())
    }

    fn remove(&self, path: &DecodedPath) -> Result<()> {
        debug!("blob remove {}/{}", path.container, path.object_path);
        let store = self.provider.store(path)?;
        let location = object_location(path)?;
        remove_object(&store, &location)
    }

    fn stat(&self, path: &DecodedPath) -> Result<ObjectInfo> {
        debug!("blob stat {}/{}", path.container, path.object_path);
        let store = self.provider.store(path)?;
        let location = object_location(path)?;
        let (meta, attributes) = head_with_attributes(&store, &location)?;

        let content_type = content_type_of(&attributes);
        let kind = if content_type.is_some() {
            ObjectKind::File
        } else {
            ObjectKind::Unknown
        };
        Ok(ObjectInfo::from_meta(meta, content_type, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::InMemoryStoreProvider;
    use crate::Error;

    fn backend() -> FlatBlobBackend {
        FlatBlobBackend::new(Arc::new(InMemoryStoreProvider::new()))
    }

    fn url(path: &str) -> DecodedPath {
        DecodedPath::decode(&format!("https://acct.blob.core.windows.net/c/{}", path)).unwrap()
    }

    #[test]
    fn test_put_get_round_trip() {
        let backend = backend();
        backend
            .put(&url("dir/a.csv"), Bytes::from_static(b"name,age\n"))
            .unwrap();
        let data = backend.get(&url("dir/a.csv"), ByteRange::full()).unwrap();
        assert_eq!(data.as_ref(), b"name,age\n");
    }

    #[test]
    fn test_put_overwrites() {
        let backend = backend();
        backend.put(&url("a.txt"), Bytes::from_static(b"one")).unwrap();
        backend.put(&url("a.txt"), Bytes::from_static(b"two")).unwrap();
        let data = backend.get(&url("a.txt"), ByteRange::full()).unwrap();
        assert_eq!(data.as_ref(), b"two");
    }

    #[test]
    fn test_partial_reads() {
        let backend = backend();
        backend
            .put(&url("digits.txt"), Bytes::from_static(b"0123456789"))
            .unwrap();
        let window = backend
            .get(&url("digits.txt"), ByteRange::new(Some(2), Some(3)))
            .unwrap();
        assert_eq!(window.as_ref(), b"234");
        let tail = backend
            .get(&url("digits.txt"), ByteRange::new(Some(7), None))
            .unwrap();
        assert_eq!(tail.as_ref(), b"789");
    }

    #[test]
    fn test_list_is_a_raw_name_prefix_scan() {
        let backend = backend();
        for name in ["dir/test1.csv", "dir/test2.csv", "dir/other.json", "dir2/x.csv"] {
            backend.put(&url(name), Bytes::from_static(b"x")).unwrap();
        }

        let mut names = backend.list(&url("dir/test")).unwrap();
        names.sort();
        assert_eq!(names, vec!["dir/test1.csv", "dir/test2.csv"]);

        let mut names = backend.list(&url("dir")).unwrap();
        names.sort();
        assert_eq!(
            names,
            vec!["dir/other.json", "dir/test1.csv", "dir/test2.csv", "dir2/x.csv"]
        );
    }

    #[test]
    fn test_list_returns_stored_names() {
        let backend = backend();
        backend
            .put(&url("root/data[1].csv"), Bytes::from_static(b"x"))
            .unwrap();

        let names = backend.list(&url("root/data[")).unwrap();
        assert_eq!(names, vec!["root/data[1].csv"]);

        let info = backend.stat(&url(&names[0])).unwrap();
        assert_eq!(info.name, "root/data[1].csv");
        backend.remove(&url(&names[0])).unwrap();
    }

    #[test]
    fn test_stat_reports_file_never_directory() {
        let backend = backend();
        backend.put(&url("dir/a.csv"), Bytes::from_static(b"abc")).unwrap();

        let info = backend.stat(&url("dir/a.csv")).unwrap();
        assert_eq!(info.name, "dir/a.csv");
        assert_eq!(info.size, 3);
        assert_eq!(info.kind, ObjectKind::File);
        assert_eq!(info.content_type.as_deref(), Some("text/csv"));

        assert!(matches!(backend.stat(&url("dir")), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let backend = backend();
        backend.put(&url("a.txt"), Bytes::from_static(b"x")).unwrap();
        backend.remove(&url("a.txt")).unwrap();
        assert!(matches!(backend.remove(&url("a.txt")), Err(Error::NotFound(_))));
        assert!(matches!(
            backend.get(&url("a.txt"), ByteRange::full()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_create_dir_is_unsupported() {
        assert!(matches!(
            backend().create_dir(&url("dir")),
            Err(Error::UnsupportedBackend(_))
        ));
    }
}
