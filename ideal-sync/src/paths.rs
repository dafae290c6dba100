//! Canonical form for managed-file keys.

use std::path::Path;

/// Normalize a relative path to the key form used everywhere in this crate:
/// forward slashes, no leading `./` or `/`.
pub fn normalize_path(path: &str) -> String {
    let mut s = path.replace('\\', "/");
    loop {
        if let Some(rest) = s.strip_prefix("./") {
            s = rest.to_string();
        } else if let Some(rest) = s.strip_prefix('/') {
            s = rest.to_string();
        } else {
            break;
        }
    }
    s
}

/// Key for `path` relative to `root`, or `None` if `path` is outside it.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(normalize_path(&parts.join("/")))
}

/// Turn a normalized key back into a native path under `root`.
pub fn join_key(root: &Path, key: &str) -> std::path::PathBuf {
    key.split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}
