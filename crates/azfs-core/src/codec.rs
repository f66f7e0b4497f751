//! Format adapters layered over raw object bytes

use crate::{Error, Result};
use bytes::Bytes;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{BufRead, Read, Write};
use tracing::debug;
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

/// Path suffix that triggers gzip decompression on full reads
pub const GZIP_SUFFIX: &str = ".gz";

/// Compression applied to binary payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Stored as is
    #[default]
    None,
    /// Gzip
    Gzip,
    /// XZ
    Xz,
    /// Zstandard
    Zstd,
}

impl std::str::FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" | "store" => Ok(Compression::None),
            "gzip" | "gz" => Ok(Compression::Gzip),
            "xz" => Ok(Compression::Xz),
            "zstd" | "zst" => Ok(Compression::Zstd),
            other => Err(Error::InvalidArgument(format!(
                "unknown compression '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Xz => write!(f, "xz"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

impl Compression {
    /// Guess the compression from a path's extension
    pub fn from_path(path: &str) -> Self {
        match path.rsplit_once('.').map(|(_, ext)| ext) {
            Some("gz") | Some("gzip") => Compression::Gzip,
            Some("xz") => Compression::Xz,
            Some("zst") | Some("zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }

    /// Compress `data` at the codec's default level
    pub fn compress(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
            Compression::Xz => {
                let mut encoder = XzEncoder::new(Vec::new(), 6);
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
            Compression::Zstd => Ok(zstd::stream::encode_all(data, 0)?),
        }
    }

    /// Reverse [`Compression::compress`]
    pub fn decompress(self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            Compression::None => out.extend_from_slice(data),
            Compression::Gzip => {
                GzDecoder::new(data).read_to_end(&mut out)?;
            }
            Compression::Xz => {
                XzDecoder::new(data).read_to_end(&mut out)?;
            }
            Compression::Zstd => out = zstd::stream::decode_all(data)?,
        }
        Ok(out)
    }
}

/// Gunzip `data` when `object_path` ends in `.gz`.
///
/// The decision is made on the name alone: a `.gz` object whose bytes are not
/// gzip fails here with an I/O error instead of being returned raw.
pub fn decompress_gz_suffix(object_path: &str, data: Bytes) -> Result<Bytes> {
    if !object_path.ends_with(GZIP_SUFFIX) {
        return Ok(data);
    }
    debug!("Decompressing {} ({} bytes)", object_path, data.len());
    Ok(Bytes::from(Compression::Gzip.decompress(&data)?))
}

/// Field delimiters understood by the record helpers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `,`
    Comma,
    /// `\t`
    Tab,
}

impl Delimiter {
    fn byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }
}

/// Deserialize every record of a delimited text with a header line
pub fn read_records<T: DeserializeOwned>(data: &[u8], delimiter: Delimiter) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.byte())
        .from_reader(data);
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

/// Serialize records with a header line
pub fn write_records<T: Serialize>(records: &[T], delimiter: Delimiter) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter.byte())
        .from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

/// Iterator over groups of at most `chunk_size` CSV records.
///
/// The header line is read once and applies to every chunk.
pub struct CsvChunks<R: Read, T> {
    records: csv::DeserializeRecordsIntoIter<R, T>,
    chunk_size: usize,
    done: bool,
}

impl<R: Read, T> std::fmt::Debug for CsvChunks<R, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvChunks")
            .field("chunk_size", &self.chunk_size)
            .field("done", &self.done)
            .finish()
    }
}

impl<R: Read, T: DeserializeOwned> CsvChunks<R, T> {
    /// Chunk the CSV text produced by `reader`
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] when `chunk_size` is zero.
    pub fn new(reader: R, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidArgument(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            records: csv::Reader::from_reader(reader).into_deserialize(),
            chunk_size,
            done: false,
        })
    }
}

impl<R: Read, T: DeserializeOwned> Iterator for CsvChunks<R, T> {
    type Item = Result<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut chunk = Vec::with_capacity(self.chunk_size);
        while chunk.len() < self.chunk_size {
            match self.records.next() {
                Some(Ok(record)) => chunk.push(record),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        (!chunk.is_empty()).then_some(Ok(chunk))
    }
}

/// Iterator over the lines of a text stream, without line terminators
#[derive(Debug)]
pub struct Lines<R> {
    reader: R,
}

impl<R: BufRead> Lines<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Iterator for Lines<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => None,
            Ok(_) => {
                if line.ends_with(b"\n") {
                    line.pop();
                    if line.ends_with(b"\r") {
                        line.pop();
                    }
                }
                Some(Ok(line))
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}
