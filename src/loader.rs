//! In-memory directory loading.
//!
//! Each language version is loaded in one pass into a [`FileMap`]: relative,
//! forward-slash separated paths mapped to raw bytes. Every later stage
//! (front-matter validation, reference checks, orphan detection) works
//! against this map rather than the filesystem, so the set of files a build
//! sees is fixed at load time.
//!
//! Loading is all-or-nothing: the map is only returned once every entry has
//! been read.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Relative path → raw file content. Sorted, so iteration follows the
/// directory traversal order regardless of platform.
pub type FileMap = BTreeMap<String, Vec<u8>>;

/// OS metadata files that never count as content.
const IGNORED_FILE_NAMES: &[&str] = &[".DS_Store"];

/// Recursively load every file under `root`.
pub fn load_dir(root: &Path) -> io::Result<FileMap> {
    let mut files = FileMap::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if is_ignored(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let content = fs::read(entry.path())?;
        files.insert(to_unix_path(rel), content);
    }

    log::debug!("loaded {} files from {}", files.len(), root.display());
    Ok(files)
}

fn is_ignored(file_name: &str) -> bool {
    IGNORED_FILE_NAMES.contains(&file_name)
}

/// Join path components with `/` regardless of the host separator.
pub fn to_unix_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
