//! # azfs-core
//!
//! Path-based access to Azure Blob and Data Lake storage. A single URL
//! format addresses both services:
//!
//! ```text
//! https://<account>.blob.core.windows.net/<container>/<path>   flat Blob storage
//! https://<account>.dfs.core.windows.net/<container>/<path>    hierarchical Data Lake storage
//! ```
//!
//! ## Architecture
//!
//! - [`DecodedPath`] splits a URL into host, backend kind, container and object path
//! - [`BackendRegistry`] hands out one [`StorageBackend`] per backend kind
//! - [`listing`] turns recursive listings into directory-style entries
//! - [`GlobEngine`] resolves `*` patterns without ever crossing a `/`
//! - [`AzFileClient`] ties it together and adds typed readers and writers
//!
//! Network access goes through `object_store`, driven by an internal Tokio
//! runtime so that the whole API stays synchronous.
//!
//! ```no_run
//! use azfs_core::{AzFileClient, Config};
//!
//! # fn main() -> azfs_core::Result<()> {
//! let client = AzFileClient::new(Config::load(None)?);
//! for name in client.ls("https://acct.blob.core.windows.net/container/dir", false)? {
//!     println!("{}", name);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod backend;
pub mod batch;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod glob;
pub mod listing;
pub mod path;
pub mod provider;
pub mod reader;
pub mod registry;
mod runtime;
pub mod writer;

pub use backend::{ByteRange, ObjectInfo, ObjectKind, StorageBackend};
pub use batch::{BatchReader, PathSpec};
pub use client::AzFileClient;
pub use codec::Compression;
pub use config::Config;
pub use error::{Error, Result};
pub use crate::glob::GlobEngine;
pub use path::{BackendKind, DecodedPath};
pub use provider::{AzureStoreProvider, InMemoryStoreProvider, StoreProvider};
pub use reader::ObjectReader;
pub use registry::BackendRegistry;
pub use writer::ObjectWriter;
