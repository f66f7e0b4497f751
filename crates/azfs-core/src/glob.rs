//! Wildcard matching over storage listings
//!
//! A pattern such as `https://acct.blob.core.windows.net/c/root/*/*.csv` is
//! resolved in three steps:
//!
//! 1. the literal folders before the first wildcard segment (`root`) bound the
//!    listing, so a pattern may never wildcard the folder right below the
//!    container;
//! 2. everything under that folder is listed once, recursively;
//! 3. each listed object, as a full URL, is matched against the pattern, where
//!    every `*` stays inside a single path segment.

use crate::path::{BackendKind, DecodedPath};
use crate::registry::BackendRegistry;
use crate::{Error, Result};
use glob::{MatchOptions, Pattern};
use tracing::{debug, trace};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Resolves glob patterns through a [`BackendRegistry`]
#[derive(Debug, Clone, Copy)]
pub struct GlobEngine<'a> {
    registry: &'a BackendRegistry,
}

impl<'a> GlobEngine<'a> {
    /// Create an engine listing through `registry`
    pub fn new(registry: &'a BackendRegistry) -> Self {
        Self { registry }
    }

    /// Full URLs of every object matching `pattern`, in listing order.
    ///
    /// # Errors
    /// - [`Error::InvalidPath`] when the pattern has no `*`, cannot be decoded,
    ///   or wildcards the first folder below the container
    /// - [`Error::UnsupportedBackend`] for queue URLs, whatever their shape
    pub fn glob(&self, pattern: &str) -> Result<Vec<String>> {
        if !pattern.contains('*') {
            return Err(Error::InvalidPath(format!(
                "{}: a glob pattern needs at least one `*`",
                pattern
            )));
        }

        let decoded = DecodedPath::decode(pattern)?;
        if decoded.backend_kind == BackendKind::Queue {
            return Err(Error::UnsupportedBackend(format!(
                "glob is not available for queue storage: {}",
                pattern
            )));
        }

        let root_folder = root_folder(&decoded.object_path)?;
        let matcher = compile(&decoded.url_for(&decoded.object_path))?;
        let backend = self.registry.get_backend(decoded.backend_kind)?;

        debug!("glob {} under root folder '{}'", pattern, root_folder);
        let scope = DecodedPath {
            object_path: format!("{}/", root_folder),
            ..decoded.clone()
        };
        // A missing root folder simply has no matches.
        let listing = match backend.list(&scope) {
            Err(Error::NotFound(_)) => Vec::new(),
            other => other?,
        };
        trace!("glob candidates: {}", listing.len());

        let base = decoded.container_url();
        let matched = listing
            .into_iter()
            .map(|name| format!("{}{}", base, name.trim_end_matches('/')))
            .filter(|url| matcher.matches_with(url, MATCH_OPTIONS))
            .collect();
        Ok(matched)
    }
}

/// The literal folders in front of the first wildcard segment
///
/// `root/*.csv` gives `root`, `root/2024/*/x.csv` gives `root/2024`.
pub fn root_folder(object_path: &str) -> Result<String> {
    let segments: Vec<&str> = object_path.split('/').collect();
    let literal = segments
        .iter()
        .take_while(|segment| !segment.contains('*'))
        .count();

    // The last segment is the file name; a literal one still needs a wildcard
    // somewhere before it, so `literal` is always short of the full length.
    let folders = &segments[..literal.min(segments.len().saturating_sub(1))];
    if folders.is_empty() || folders.iter().any(|segment| segment.is_empty()) {
        return Err(Error::InvalidPath(format!(
            "{}: `*` cannot be used in the root folder under a container",
            object_path
        )));
    }
    Ok(folders.join("/"))
}

/// Compile a URL pattern so that each `*` matches within one path segment.
///
/// Everything except `*` is taken literally, and runs of `*` act as one.
pub fn compile(pattern: &str) -> Result<Pattern> {
    let mut glob = String::with_capacity(pattern.len());
    for (index, literal) in pattern.split('*').enumerate() {
        if index > 0 && !glob.ends_with('*') {
            glob.push('*');
        }
        glob.push_str(&Pattern::escape(literal));
    }
    Pattern::new(&glob).map_err(|e| Error::InvalidPath(format!("{}: {}", pattern, e)))
}
