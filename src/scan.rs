//! Directory scanning for the photo catalog when no explicit list is configured.

use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use crate::error::ScanError;

/// Return `true` if `path` has an image extension the loader can probe.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    const EXTS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            EXTS.iter().any(|e| *e == ext)
        })
}

/// Recursively list images under `root`, as `/`-separated paths relative to it,
/// sorted so the pre-shuffle order is stable.
///
/// # Errors
/// Returns [`ScanError::BadDir`] if `root` is missing or not a directory.
pub fn scan_photo_folder(root: &Path) -> Result<Vec<String>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::BadDir(root.to_path_buf()));
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !should_skip_dir(e))
        .flatten()
    {
        let path = entry.path();
        if !path.is_file() || !is_supported_image(path) {
            continue;
        }
        if let Ok(relative) = path.strip_prefix(root) {
            let parts: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            out.push(parts.join("/"));
        }
    }
    out.sort();
    Ok(out)
}

fn should_skip_dir(entry: &DirEntry) -> bool {
    // Never skip the root; tempfile roots can be dot-dirs.
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}
