//! ObjectWriter - synchronous `Write` access to a stored object

use crate::backend::StorageBackend;
use crate::path::DecodedPath;
use crate::Result;
use bytes::Bytes;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, warn};

/// A writer that buffers its content and commits it as one object.
///
/// Nothing is visible in storage until [`ObjectWriter::finalize`] runs. A writer
/// dropped without finalizing, for example on an early `?` return, discards its
/// buffer so a truncated payload is never published.
#[derive(Debug)]
pub struct ObjectWriter {
    backend: Arc<dyn StorageBackend>,
    path: DecodedPath,
    buffer: Vec<u8>,
    committed: bool,
}

impl ObjectWriter {
    /// Create a writer for `path`, reserving `capacity` bytes up front
    pub fn new(backend: Arc<dyn StorageBackend>, path: DecodedPath, capacity: usize) -> Self {
        Self {
            backend,
            path,
            buffer: Vec::with_capacity(capacity),
            committed: false,
        }
    }

    /// Bytes written so far
    pub fn bytes_written(&self) -> u64 {
        self.buffer.len() as u64
    }

    /// Upload the buffered content.
    ///
    /// Without this call nothing is written.
    pub fn finalize(mut self) -> Result<()> {
        self.committed = true;
        let data = Bytes::from(std::mem::take(&mut self.buffer));
        debug!("Committing {} bytes to {}", data.len(), self.path.object_path);
        self.backend.put(&self.path, data)
    }
}

impl Write for ObjectWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        // Content is only uploaded by finalize.
        Ok(())
    }
}

impl Drop for ObjectWriter {
    fn drop(&mut self) {
        if !self.committed {
            warn!(
                "Discarding {} unfinalized bytes for {}",
                self.buffer.len(),
                self.path.object_path
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ByteRange, HierarchicalBackend};
    use crate::provider::InMemoryStoreProvider;

    fn setup() -> (Arc<dyn StorageBackend>, DecodedPath) {
        let backend: Arc<dyn StorageBackend> =
            Arc::new(HierarchicalBackend::new(Arc::new(InMemoryStoreProvider::new())));
        let path = DecodedPath::decode("https://acct.dfs.core.windows.net/fs/out.txt").unwrap();
        (backend, path)
    }

    #[test]
    fn test_finalize_commits_once() {
        let (backend, path) = setup();
        let mut writer = ObjectWriter::new(backend.clone(), path.clone(), 16);
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();
        assert_eq!(writer.bytes_written(), 11);
        assert!(backend.stat(&path).is_err());

        writer.finalize().unwrap();
        let data = backend.get(&path, ByteRange::full()).unwrap();
        assert_eq!(data.as_ref(), b"hello world");
    }

    #[test]
    fn test_drop_without_finalize_writes_nothing() {
        let (backend, path) = setup();
        {
            let mut writer = ObjectWriter::new(backend.clone(), path.clone(), 0);
            writeln!(writer, "line").unwrap();
        }
        assert!(backend.stat(&path).unwrap_err().is_not_found());
    }

    #[test]
    fn test_error_before_finalize_keeps_previous_content() {
        let (backend, path) = setup();
        backend.put(&path, Bytes::from_static(b"complete\n")).unwrap();

        let write_rows = || -> std::io::Result<()> {
            let mut writer = ObjectWriter::new(backend.clone(), path.clone(), 0);
            writer.write_all(b"header\nrow1\n")?;
            let row2: std::io::Result<&[u8]> =
                Err(std::io::Error::new(std::io::ErrorKind::Other, "row2 failed"));
            writer.write_all(row2?)?;
            writer.finalize()?;
            Ok(())
        };
        assert!(write_rows().is_err());

        let data = backend.get(&path, ByteRange::full()).unwrap();
        assert_eq!(data.as_ref(), b"complete\n");
    }
}
