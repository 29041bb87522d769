use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

/// Resolves a data file name against a list of root directories.
///
/// Absolute paths and paths that exist relative to the working directory are
/// returned unchanged. Otherwise each root is tried in order. A `*` in the file
/// name component is a wildcard: the pattern resolves when at least one file in
/// that directory matches, and the returned path keeps the `*` so callers can
/// expand it (cube map face sets).
pub fn find_data_file(name: &str, roots: &[PathBuf]) -> Result<PathBuf> {
    let searched = search_paths(name, roots);
    match searched.iter().find(|path| matches_on_disk(path)) {
        Some(path) => {
            log::debug!("resolved data file `{name}` -> {}", path.display());
            Ok(path.clone())
        }
        None => bail!("data file `{name}` not found; searched:\n{}", list_paths(&searched)),
    }
}

/// Every location `name` may resolve to, in search order: the path itself,
/// then the path under each root. Absolute names are only tried as given.
pub(crate) fn search_paths(name: &str, roots: &[PathBuf]) -> Vec<PathBuf> {
    let candidate = Path::new(name);
    if candidate.is_absolute() {
        return vec![candidate.to_path_buf()];
    }
    std::iter::once(candidate.to_path_buf())
        .chain(roots.iter().map(|root| root.join(candidate)))
        .collect()
}

/// One indented path per line, for error messages.
pub(crate) fn list_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("  {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn matches_on_disk(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|f| f.to_str()) else {
        return path.exists();
    };
    if !file_name.contains('*') {
        return path.is_file();
    }

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .any(|entry| wildcard_match(file_name, &entry))
}

/// Single-`*` glob match. Patterns without `*` compare for equality.
pub(crate) fn wildcard_match(pattern: &str, name: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == name,
        Some((prefix, suffix)) => {
            name.len() >= prefix.len() + suffix.len()
                && name.starts_with(prefix)
                && name.ends_with(suffix)
        }
    }
}
