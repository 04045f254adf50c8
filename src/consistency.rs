//! Cross-version consistency check.
//!
//! A multilingual site is expected to carry every file in every language.
//! After all versions have built, the output paths of each version (rendered
//! pages and copied assets alike) are compared pairwise; a path present in
//! one version but missing from another is an asymmetric translation and
//! fails the build. Every offending path is listed with the prefix of the
//! version that has it.

use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
#[error("the following files exist in only one language version:\n{}", .paths.join("\n"))]
pub struct VersionMismatch {
    /// `/{version_dir}/{path}` for each output path without a counterpart.
    pub paths: Vec<String>,
}

/// Output paths produced by one version's build, relative to its directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionPathSet {
    pub version_dir: String,
    pub paths: BTreeSet<String>,
}

impl VersionPathSet {
    pub fn new(version_dir: impl Into<String>) -> Self {
        Self {
            version_dir: version_dir.into(),
            paths: BTreeSet::new(),
        }
    }
}

/// Every output path missing a counterpart, prefixed with the version that has it.
///
/// Pairs are compared in configuration order. A single version has nothing
/// to compare against and yields no asymmetries.
pub fn asymmetric_paths(sets: &[VersionPathSet]) -> Vec<String> {
    let mut found = BTreeSet::new();
    for (i, a) in sets.iter().enumerate() {
        for b in &sets[i + 1..] {
            for path in a.paths.difference(&b.paths) {
                found.insert(format!("/{}/{}", a.version_dir, path));
            }
            for path in b.paths.difference(&a.paths) {
                found.insert(format!("/{}/{}", b.version_dir, path));
            }
        }
    }
    found.into_iter().collect()
}

pub fn check_versions(sets: &[VersionPathSet]) -> Result<(), VersionMismatch> {
    let paths = asymmetric_paths(sets);
    if paths.is_empty() {
        Ok(())
    } else {
        Err(VersionMismatch { paths })
    }
}
