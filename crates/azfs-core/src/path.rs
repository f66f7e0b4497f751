//! Storage URL decoding
//!
//! Azure storage URLs have the shape
//! `https://<account>.<marker>.core.windows.net/<container>/<object/path>`, where the
//! `<marker>` host label selects the backend kind.

use crate::{Error, Result};
use std::fmt;
use url::Url;

/// Backend kind selected by the host marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Blob storage (`.blob.`), flat key namespace
    Flat,
    /// Data Lake storage (`.dfs.`), real directories
    Hierarchical,
    /// Queue storage (`.queue.`), recognized but not served
    Queue,
}

impl BackendKind {
    /// Ordered host-marker table; the first marker found in the host wins.
    const MARKERS: [(&'static str, BackendKind); 3] = [
        (".blob.", BackendKind::Flat),
        (".dfs.", BackendKind::Hierarchical),
        (".queue.", BackendKind::Queue),
    ];

    /// Detect the backend kind from a host name
    pub fn from_host(host: &str) -> Option<Self> {
        Self::MARKERS
            .iter()
            .find(|(marker, _)| host.contains(marker))
            .map(|(_, kind)| *kind)
    }

    /// Short name used in logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Flat => "blob",
            BackendKind::Hierarchical => "dfs",
            BackendKind::Queue => "queue",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structural parts of a storage URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPath {
    /// `https://<host>` with no trailing slash
    pub scheme_and_host: String,
    /// Backend kind derived from the host
    pub backend_kind: BackendKind,
    /// Storage account name (first host label)
    pub account: String,
    /// Container / file system name
    pub container: String,
    /// Path inside the container, never prefixed by the container segment
    pub object_path: String,
}

impl DecodedPath {
    /// Decode a storage URL.
    ///
    /// The object path keeps its raw characters (including `*` and a trailing `/`),
    /// so glob patterns and directory prefixes decode unchanged.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPath`] when the URL cannot be parsed, has no host,
    /// the host carries no known backend marker, or no container segment follows
    /// the host.
    pub fn decode(url: &str) -> Result<Self> {
        let parsed =
            Url::parse(url).map_err(|e| Error::InvalidPath(format!("{}: {}", url, e)))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| Error::InvalidPath(format!("{}: missing host", url)))?;

        let backend_kind = BackendKind::from_host(host).ok_or_else(|| {
            Error::InvalidPath(format!(
                "{}: host must contain one of .blob., .dfs. or .queue.",
                url
            ))
        })?;

        let account = host.split('.').next().unwrap_or_default().to_string();

        // Work on the raw text after the authority so nothing gets re-encoded.
        let (_, after_scheme) = url
            .split_once("://")
            .ok_or_else(|| Error::InvalidPath(format!("{}: missing scheme", url)))?;
        let (authority, raw_path) = match after_scheme.find('/') {
            Some(idx) => after_scheme.split_at(idx),
            None => (after_scheme, ""),
        };
        let scheme_and_host = format!("{}://{}", parsed.scheme(), authority);

        let raw_path = raw_path.trim_start_matches('/');
        let raw_path = raw_path.split(&['?', '#'][..]).next().unwrap_or_default();
        let (container, object_path) = match raw_path.split_once('/') {
            Some((container, rest)) => (container, rest),
            None => (raw_path, ""),
        };

        if container.is_empty() {
            return Err(Error::InvalidPath(format!(
                "{}: missing container segment",
                url
            )));
        }

        Ok(DecodedPath {
            scheme_and_host,
            backend_kind,
            account,
            container: container.to_string(),
            object_path: object_path.to_string(),
        })
    }

    /// `https://<host>/<container>/`
    pub fn container_url(&self) -> String {
        format!("{}/{}/", self.scheme_and_host, self.container)
    }

    /// Rebuild a full URL for an object path in the same container
    pub fn url_for(&self, object_path: &str) -> String {
        format!("{}{}", self.container_url(), object_path)
    }
}
