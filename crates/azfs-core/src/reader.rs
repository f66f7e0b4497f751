//! Synchronous `Read + Seek` access to a stored object

use crate::backend::{ByteRange, StorageBackend};
use crate::path::DecodedPath;
use crate::Result;
use bytes::Bytes;
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;
use tracing::trace;

/// A reader that serves an object through buffered ranged reads
#[derive(Debug)]
pub struct ObjectReader {
    backend: Arc<dyn StorageBackend>,
    path: DecodedPath,
    /// Current position in the object
    position: u64,
    /// Total size of the object
    size: u64,
    /// Bytes fetched per ranged read
    chunk_size: usize,
    buffer: Option<Buffer>,
}

#[derive(Debug)]
struct Buffer {
    data: Bytes,
    /// Start position of this buffer in the object
    start: u64,
}

impl ObjectReader {
    /// Open `path` for reading
    ///
    /// # Errors
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if the object does not exist
    pub fn new(backend: Arc<dyn StorageBackend>, path: DecodedPath, chunk_size: usize) -> Result<Self> {
        let size = backend.stat(&path)?.size;
        Ok(ObjectReader {
            backend,
            path,
            position: 0,
            size,
            chunk_size: chunk_size.max(1),
            buffer: None,
        })
    }

    /// Total size of the object in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    fn fetch_chunk(&self, start: u64, len: usize) -> Result<Bytes> {
        trace!("Fetching {} bytes at {} from {}", len, start, self.path.object_path);
        self.backend
            .get(&self.path, ByteRange::new(Some(start as usize), Some(len)))
    }

    /// Ensure the buffer covers the current position
    fn ensure_buffer(&mut self) -> Result<()> {
        if let Some(ref buffer) = self.buffer {
            let buffer_end = buffer.start + buffer.data.len() as u64;
            if self.position >= buffer.start && self.position < buffer_end {
                return Ok(());
            }
        }

        if self.position >= self.size {
            return Ok(());
        }

        let len = self.chunk_size.min((self.size - self.position) as usize);
        let data = self.fetch_chunk(self.position, len)?;
        self.buffer = Some(Buffer {
            data,
            start: self.position,
        });
        Ok(())
    }
}

impl Read for ObjectReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.position >= self.size || buf.is_empty() {
            return Ok(0);
        }

        self.ensure_buffer()?;

        if let Some(ref buffer) = self.buffer {
            let offset = (self.position - buffer.start) as usize;
            let available = buffer.data.len().saturating_sub(offset);
            let to_read = buf.len().min(available);

            if to_read > 0 {
                buf[..to_read].copy_from_slice(&buffer.data[offset..offset + to_read]);
                self.position += to_read as u64;
                return Ok(to_read);
            }
        }

        Ok(0)
    }
}

impl Seek for ObjectReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::End(offset) => self.size as i128 + offset as i128,
            SeekFrom::Current(offset) => self.position as i128 + offset as i128,
        };

        if new_pos < 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Cannot seek before start of object",
            ));
        }
        if new_pos > self.size as i128 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Cannot seek beyond end of object",
            ));
        }

        self.position = new_pos as u64;
        Ok(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FlatBlobBackend;
    use crate::provider::InMemoryStoreProvider;

    fn reader_over(data: &'static [u8], chunk_size: usize) -> ObjectReader {
        let backend: Arc<dyn StorageBackend> =
            Arc::new(FlatBlobBackend::new(Arc::new(InMemoryStoreProvider::new())));
        let path = DecodedPath::decode("https://acct.blob.core.windows.net/c/data.bin").unwrap();
        backend.put(&path, Bytes::from_static(data)).unwrap();
        ObjectReader::new(backend, path, chunk_size).unwrap()
    }

    #[test]
    fn test_reads_across_chunks() {
        let mut reader = reader_over(b"0123456789abcdef", 3);
        assert_eq!(reader.size(), 16);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"0123456789abcdef");
    }

    #[test]
    fn test_seek_then_read() {
        let mut reader = reader_over(b"0123456789", 4);

        reader.seek(SeekFrom::Start(6)).unwrap();
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"67");

        reader.seek(SeekFrom::End(-1)).unwrap();
        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "9");

        assert_eq!(reader.seek(SeekFrom::Current(-10)).unwrap(), 0);
    }

    #[test]
    fn test_seek_out_of_bounds() {
        let mut reader = reader_over(b"abc", 8);
        assert!(reader.seek(SeekFrom::Current(-1)).is_err());
        assert!(reader.seek(SeekFrom::Start(4)).is_err());
        assert_eq!(reader.seek(SeekFrom::End(0)).unwrap(), 3);
    }
}
