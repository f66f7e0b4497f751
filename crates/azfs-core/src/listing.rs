//! Directory-style view over a recursive listing

use std::collections::HashSet;

/// Collapses a recursive listing into the entries directly below `base_path`.
///
/// Files are returned by name; anything deeper is reduced to its first segment
/// with a trailing `/`. Each entry appears once, in order of first occurrence.
/// Raw entries outside `base_path` (left over from a flat prefix scan) and the
/// base directory itself are skipped.
pub fn filter<I, S>(raw_entries: I, base_path: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let base = normalize_base(base_path);
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for entry in raw_entries {
        let Some(relative) = entry.as_ref().strip_prefix(base.as_str()) else {
            continue;
        };
        if relative.is_empty() {
            continue;
        }

        let name = match relative.split_once('/') {
            Some((first, _)) => format!("{}/", first),
            None => relative.to_string(),
        };
        if seen.insert(name.clone()) {
            names.push(name);
        }
    }
    names
}

/// `dir` and `dir/` both become `dir/`; the container root stays empty
fn normalize_base(base_path: &str) -> String {
    let trimmed = base_path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}
