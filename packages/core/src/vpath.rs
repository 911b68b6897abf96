//! Virtual-path resolution and POSIX path utilities.
//!
//! A virtual path is either `key://path` or a bare `path`. The substring
//! before the `://` separator names an adapter; the remainder is a
//! `/`-separated path inside that adapter's backend. All utilities here work
//! on forward-slash paths regardless of host platform.

use crate::registry::{Adapter, AdapterRegistry};
use crate::Error;

/// Separator between an adapter key and the in-backend path.
pub const SCHEME_SEPARATOR: &str = "://";

/// Split a virtual path into its optional adapter key and path remainder.
///
/// `"m1://foo/bar"` → `(Some("m1"), "foo/bar")`; `"foo/bar"` → `(None, "foo/bar")`.
pub fn split_virtual(raw: &str) -> (Option<&str>, &str) {
    match raw.find(SCHEME_SEPARATOR) {
        Some(i) => (Some(&raw[..i]), &raw[i + SCHEME_SEPARATOR.len()..]),
        None => (None, raw),
    }
}

/// Normalize a path to absolute POSIX form: leading slash, `.` and `..`
/// collapsed, no trailing slash except for the root itself.
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Join a directory and a child path, normalizing the result.
pub fn join(dir: &str, name: &str) -> String {
    normalize(&format!("{}/{}", dir, name))
}

/// Final component of a path; empty only for the root.
pub fn basename(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// Extension of a file name: everything after the last `.`.
///
/// A name without a dot reports itself as its own extension (`"README"` →
/// `"README"`). Legacy behavior, preserved deliberately and pinned by tests.
pub fn extension_of(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Path of `path` relative to the directory `base`.
///
/// When `path` is not under `base` (download-archive accepts arbitrary
/// absolute paths), the fallback is the path stripped of its leading slash.
pub fn relative_to(base: &str, path: &str) -> String {
    let prefix = if base == "/" {
        "/".to_string()
    } else {
        format!("{}/", base)
    };
    match path.strip_prefix(&prefix) {
        Some(rel) => rel.to_string(),
        None => path.trim_start_matches('/').to_string(),
    }
}

/// Resolve a virtual path against the registry.
///
/// With a `key://` prefix, the key selects an adapter; an unknown key falls
/// back **silently** to `fallback` - this is documented resolver behavior,
/// not an error path. Without a prefix the whole string is the path and
/// `fallback` is used directly. The returned path is normalized absolute.
pub fn resolve(
    registry: &AdapterRegistry,
    raw: &str,
    fallback: &Adapter,
) -> (Adapter, String) {
    let (key, rest) = split_virtual(raw);
    let adapter = match key {
        Some(k) => registry.lookup(k).unwrap_or_else(|| fallback.clone()),
        None => fallback.clone(),
    };
    (adapter, normalize(rest))
}

/// Resolve the request's own target: the adapter named by the `adapter`
/// query parameter (default adapter when absent or unknown) and the `path`
/// parameter (the adapter's root when absent).
pub fn resolve_target(
    registry: &AdapterRegistry,
    adapter_key: Option<&str>,
    raw_path: Option<&str>,
) -> Result<(Adapter, String, String), Error> {
    let base = registry
        .get(adapter_key)
        .ok_or_else(|| Error::bad_request("no storage adapters registered"))?;

    let dirname = match raw_path {
        Some(p) => p.to_string(),
        None => format!("{}{}", base.key, SCHEME_SEPARATOR),
    };
    let (adapter, path) = resolve(registry, &dirname, &base);
    Ok((adapter, path, dirname))
}
