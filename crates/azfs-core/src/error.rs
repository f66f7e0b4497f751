//! Error types for azfs-core

use thiserror::Error;

/// Errors raised by path decoding, backend dispatch and object I/O
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed storage URL or glob pattern
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The backend kind is recognized but the operation is not available for it
    #[error("Unsupported backend: {0}")]
    UnsupportedBackend(String),

    /// The object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The destination already exists and overwriting was not requested
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// An argument combination is not acceptable
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Any other failure reported by the storage service
    #[error("Object store error: {0}")]
    ObjectStore(object_store::Error),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV/TSV (de)serialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration-related error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The shared async runtime could not be created
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// A multi-step write committed a different number of bytes than it was given
    #[error("Incomplete write to {path}: expected {expected} bytes, committed {committed}")]
    IncompleteWrite {
        /// Object path inside the container
        path: String,
        /// Payload length
        expected: usize,
        /// Size reported by the backend after commit
        committed: usize,
    },
}

impl Error {
    /// Returns true for errors that mean "the object does not exist"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<object_store::Error> for Error {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => Error::NotFound(path),
            object_store::Error::AlreadyExists { path, .. } => Error::AlreadyExists(path),
            other => Error::ObjectStore(other),
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(io_err) => io_err,
            Error::NotFound(path) => std::io::Error::new(std::io::ErrorKind::NotFound, path),
            other => std::io::Error::new(std::io::ErrorKind::Other, other),
        }
    }
}

/// Result type for azfs-core operations
pub type Result<T> = std::result::Result<T, Error>;
