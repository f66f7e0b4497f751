//! Data Lake storage backend

use super::{
    content_type_of, file_attributes, get_object, has_directory_marker, head_object,
    head_with_attributes, list_objects, object_location, object_name, prefix_location,
    remove_object,
    ByteRange, ObjectInfo, ObjectKind, StorageBackend, DIRECTORY_MARKER,
};
use crate::path::{BackendKind, DecodedPath};
use crate::provider::StoreProvider;
use crate::runtime::block_on;
use crate::{Error, Result};
use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectMeta, ObjectStore, PutMultipartOpts, PutOptions,
    PutPayload,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Backend for hierarchical Data Lake storage
///
/// Files are committed with the create, append, flush sequence, and
/// directories are objects carrying the `hdi_isfolder` metadata marker.
#[derive(Debug)]
pub struct HierarchicalBackend {
    provider: Arc<dyn StoreProvider>,
}

impl HierarchicalBackend {
    /// Create a backend that obtains stores from `provider`
    pub fn new(provider: Arc<dyn StoreProvider>) -> Self {
        Self { provider }
    }

    /// Whether a zero-length entry is a directory object
    fn is_directory_object(store: &Arc<dyn ObjectStore>, meta: &ObjectMeta) -> Result<bool> {
        if meta.size != 0 {
            return Ok(false);
        }
        match head_with_attributes(store, &meta.location) {
            Ok((_, attributes)) => Ok(has_directory_marker(&attributes)),
            // Removed between list and head.
            Err(Error::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Stat fallback for directories that exist only through their children
    fn implicit_directory(
        store: &Arc<dyn ObjectStore>,
        location: &ObjectPath,
    ) -> Result<Option<ObjectInfo>> {
        let children = list_objects(store, Some(location))?;
        let Some(latest) = children.iter().map(|meta| meta.last_modified).max() else {
            return Ok(None);
        };
        Ok(Some(ObjectInfo {
            name: object_name(location),
            size: 0,
            creation_time: None,
            last_modified: latest,
            etag: None,
            content_type: None,
            kind: ObjectKind::Directory,
        }))
    }
}

impl StorageBackend for HierarchicalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Hierarchical
    }

    fn list(&self, path: &DecodedPath) -> Result<Vec<String>> {
        debug!("dfs list {}/{}", path.container, path.object_path);
        let store = self.provider.store(path)?;
        let location = prefix_location(&path.object_path);

        let mut names = Vec::new();
        for meta in list_objects(&store, location.as_ref())? {
            let mut name = object_name(&meta.location);
            if Self::is_directory_object(&store, &meta)? {
                name.push('/');
            }
            names.push(name);
        }

        // Nothing below the path: fine for an empty directory, not for a missing one.
        if names.is_empty() {
            if let Some(location) = &location {
                head_object(&store, location).map_err(|e| match e {
                    Error::NotFound(_) => {
                        Error::NotFound(format!("no such directory: {}", path.object_path))
                    }
                    other => other,
                })?;
            }
        }
        Ok(names)
    }

    fn get(&self, path: &DecodedPath, range: ByteRange) -> Result<Bytes> {
        debug!("dfs get {}/{} {:?}", path.container, path.object_path, range);
        let store = self.provider.store(path)?;
        let location = object_location(path)?;
        get_object(&store, &location, range)
    }

    fn put(&self, path: &DecodedPath, data: Bytes) -> Result<()> {
        debug!(
            "dfs put {}/{} ({} bytes)",
            path.container,
            path.object_path,
            data.len()
        );
        let store = self.provider.store(path)?;
        let location = object_location(path)?;
        let expected = data.len();

        // create: an empty file replaces whatever was there
        let create = PutOptions {
            attributes: file_attributes(&location),
            ..Default::default()
        };
        block_on(store.put_opts(&location, PutPayload::new(), create))??;
        if data.is_empty() {
            return Ok(());
        }

        // append at offset 0, then flush exactly `expected` bytes
        let append = PutMultipartOpts {
            attributes: file_attributes(&location),
            ..Default::default()
        };
        block_on(async {
            let mut upload = store.put_multipart_opts(&location, append).await?;
            if let Err(e) = upload.put_part(data.into()).await {
                warn!("dfs append to {} failed, aborting upload", location);
                let _ = upload.abort().await;
                return Err(e);
            }
            upload.complete().await
        })??;

        let committed = head_object(&store, &location)?.size;
        if committed != expected {
            return Err(Error::IncompleteWrite {
                path: object_name(&location),
                expected,
                committed,
            });
        }
        Ok(())
    }

    fn remove(&self, path: &DecodedPath) -> Result<()> {
        debug!("dfs remove {}/{}", path.container, path.object_path);
        let store = self.provider.store(path)?;
        let location = object_location(path)?;
        remove_object(&store, &location)
    }

    fn stat(&self, path: &DecodedPath) -> Result<ObjectInfo> {
        debug!("dfs stat {}/{}", path.container, path.object_path);
        let store = self.provider.store(path)?;
        let location = object_location(path)?;

        let (meta, attributes) = match head_with_attributes(&store, &location) {
            Ok(found) => found,
            Err(Error::NotFound(missing)) => {
                return Self::implicit_directory(&store, &location)?
                    .ok_or(Error::NotFound(missing));
            }
            Err(e) => return Err(e),
        };

        let content_type = content_type_of(&attributes);
        let kind = if has_directory_marker(&attributes) {
            ObjectKind::Directory
        } else if content_type.is_some() {
            ObjectKind::File
        } else {
            ObjectKind::Unknown
        };
        Ok(ObjectInfo::from_meta(meta, content_type, kind))
    }

    fn create_dir(&self, path: &DecodedPath) -> Result<()> {
        debug!("dfs mkdir {}/{}", path.container, path.object_path);
        let store = self.provider.store(path)?;
        let location = object_location(path)?;

        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::Metadata(DIRECTORY_MARKER.into()),
            AttributeValue::from("true"),
        );
        let options = PutOptions {
            attributes,
            ..Default::default()
        };
        block_on(store.put_opts(&location, PutPayload::new(), options))??;
        Ok(())
    }
}
