//! Reference validation and orphaned-resource detection.
//!
//! While a version renders, every image source and link target in its notes
//! passes through [`ReferenceTracker::validate_reference`]:
//!
//! - Targets must be absolute `http(s)://` URLs, root-relative paths
//!   (`/...`), or `mailto:` links. Anything else (relative paths, bare
//!   anchors, typos) fails the build.
//! - Root-relative targets must name a file that was loaded for this
//!   version. The `/{version}/` prefix is stripped before the lookup, so
//!   `/en/img/a.png` and `/img/a.png` both resolve to `img/a.png` in the
//!   `en` version. A target ending in `/` names the directory's index page:
//!   `/en/posts/` resolves to `posts/index.md`, the note published there.
//! - Every resolved local target is recorded as used.
//!
//! Once all notes of a version are rendered, [`ReferenceTracker::check_orphans`]
//! fails the build if any loaded file was never referenced and is not on the
//! ignore list. An unreferenced upload is almost always a typo'd link or a
//! leftover, so it is treated as an authoring mistake rather than dead weight.

use crate::loader::FileMap;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ReferenceError {
    #[error(
        "{source_file}: `{target}` is invalid; links must be http(s) URLs, \
         root-relative paths, or mailto links"
    )]
    Format { source_file: String, target: String },
    #[error("{source_file}: {target} does not exist")]
    NotFound { source_file: String, target: String },
}

/// Loaded files that no note references.
#[derive(Error, Debug, PartialEq)]
#[error("the following resources are not being used:\n{}", .paths.join("\n"))]
pub struct OrphanedResources {
    pub paths: Vec<String>,
}

/// How a reference target was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// `http://` or `https://` URL.
    External,
    /// `mailto:` link.
    Mail,
    /// Root-relative path resolved to a key of the file map.
    Local(String),
}

/// Tracks which loaded files are referenced during one version's render.
pub struct ReferenceTracker<'a> {
    files: &'a FileMap,
    version_prefix: String,
    used: BTreeSet<String>,
}

impl<'a> ReferenceTracker<'a> {
    pub fn new(files: &'a FileMap, version_dir: &str) -> Self {
        Self {
            files,
            version_prefix: format!("/{version_dir}/"),
            used: BTreeSet::new(),
        }
    }

    /// Validate one image or link target found in `source_file`.
    pub fn validate_reference(
        &mut self,
        source_file: &str,
        target: &str,
    ) -> Result<Reference, ReferenceError> {
        let reference = classify(target).ok_or_else(|| ReferenceError::Format {
            source_file: source_file.to_string(),
            target: target.to_string(),
        })?;

        if let Reference::Local(_) = reference {
            let key = self.resolve_key(target);
            if !self.files.contains_key(&key) {
                return Err(ReferenceError::NotFound {
                    source_file: source_file.to_string(),
                    target: target.to_string(),
                });
            }
            self.used.insert(key.clone());
            return Ok(Reference::Local(key));
        }

        Ok(reference)
    }

    /// Map a root-relative target to a file-map key.
    ///
    /// Directory targets (`/en/`, `/en/posts/`, or the bare `/en`) map to the
    /// `index.md` inside them.
    fn resolve_key(&self, target: &str) -> String {
        let path = strip_query_and_fragment(target);
        if path == self.version_prefix.trim_end_matches('/') {
            return "index.md".to_string();
        }
        let rel = path
            .strip_prefix(&self.version_prefix)
            .or_else(|| path.strip_prefix('/'))
            .unwrap_or(path);
        if rel.is_empty() || rel.ends_with('/') {
            format!("{rel}index.md")
        } else {
            rel.to_string()
        }
    }

    pub fn used(&self) -> &BTreeSet<String> {
        &self.used
    }

    /// Loaded files minus used files minus ignored paths, in sorted order.
    pub fn orphans(&self, ignore: &[String]) -> Vec<String> {
        self.files
            .keys()
            .filter(|key| !self.used.contains(*key) && !is_ignored(key, ignore))
            .cloned()
            .collect()
    }

    /// Fail with every orphaned path, displayed relative to the project root.
    pub fn check_orphans(
        &self,
        version_dir: &str,
        ignore: &[String],
    ) -> Result<(), OrphanedResources> {
        let orphans = self.orphans(ignore);
        if orphans.is_empty() {
            return Ok(());
        }
        Err(OrphanedResources {
            paths: orphans
                .into_iter()
                .map(|p| format!("./{version_dir}/{p}"))
                .collect(),
        })
    }
}

/// Classify a target by its prefix. `None` means the format is invalid.
///
/// Only `http://` and `https://` URLs count as external; other schemes such
/// as `ftp://` or `tel:` are rejected along with relative paths.
pub fn classify(target: &str) -> Option<Reference> {
    if target.starts_with("http://") || target.starts_with("https://") {
        Some(Reference::External)
    } else if target.starts_with("mailto:") {
        Some(Reference::Mail)
    } else if target.starts_with('/') {
        Some(Reference::Local(target.to_string()))
    } else {
        None
    }
}

/// Ignore entries ending in `/` cover a whole directory.
fn is_ignored(key: &str, ignore: &[String]) -> bool {
    ignore.iter().any(|entry| {
        if entry.ends_with('/') {
            key.starts_with(entry.as_str())
        } else {
            key == entry
        }
    })
}

fn strip_query_and_fragment(target: &str) -> &str {
    let end = target.find(['#', '?']).unwrap_or(target.len());
    &target[..end]
}
