//! Publish-date reconciliation across rebuilds.
//!
//! Hosted builds check the notes out into a fresh container every time, so
//! the filesystem birth time of every note is "the moment of checkout" and
//! says nothing about when the note was published. To keep published dates
//! stable the build keeps a snapshot file in each version directory:
//!
//! ```json
//! {
//!   "posts/hello.md": { "create": "2023-01-01", "update": "2023-06-01" }
//! }
//! ```
//!
//! # Contract
//!
//! - The snapshot is read once when a version starts building. A missing file
//!   is an empty snapshot, not an error.
//! - The next snapshot is written once, after the whole site has built
//!   successfully. It holds exactly the notes of the current build.
//! - There is no locking. Builds never run concurrently against the same
//!   notes directory, so the last writer wins.
//!
//! # Policy
//!
//! See [`reconcile`]. A persisted "created" date, once established, is never
//! replaced. For rendering, the persisted "updated" date also wins over the
//! live one, while the snapshot itself is refreshed from the live value. An
//! edit made in a fresh checkout therefore shows its new updated date one
//! build late; that staleness is the price of not trusting container mtimes.

use crate::types::FileDates;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::time::SystemTime;
use thiserror::Error;

/// Calendar date format used for every stored and rendered date.
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error reading snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("snapshot {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Persisted dates from a previous build, keyed by note path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: BTreeMap<String, FileDates>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read a snapshot file. Returns an empty snapshot if it doesn't exist.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no snapshot at {}, starting fresh", path.display());
                return Ok(Self::empty());
            }
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        serde_json::from_str(&content).map_err(|source| SnapshotError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    /// Serialize with sorted keys so unchanged snapshots stay byte-identical.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn get(&self, path: &str) -> Option<&FileDates> {
        self.entries.get(path)
    }

    pub fn insert(&mut self, path: String, dates: FileDates) {
        self.entries.insert(path, dates);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Dates to render now, and dates to persist for the next build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub render: FileDates,
    pub persist: FileDates,
}

/// Combine live filesystem dates with a persisted record.
///
/// | | render | persist |
/// |---|---|---|
/// | created | persisted, else live | persisted, else live |
/// | updated | persisted, else live | live |
pub fn reconcile(live: FileDates, persisted: Option<&FileDates>) -> Reconciled {
    match persisted {
        Some(prev) => Reconciled {
            render: prev.clone(),
            persist: FileDates {
                create: prev.create.clone(),
                update: live.update,
            },
        },
        None => Reconciled {
            render: live.clone(),
            persist: live,
        },
    }
}

/// Read the live created/modified dates of a file.
///
/// Platforms without a birth time fall back to the modification time.
pub fn live_dates(path: &Path) -> io::Result<FileDates> {
    let meta = std::fs::metadata(path)?;
    let modified = meta.modified()?;
    let created = meta.created().unwrap_or_else(|_| {
        log::debug!("no birth time for {}, using mtime", path.display());
        modified
    });
    Ok(FileDates {
        create: format_date(created),
        update: format_date(modified),
    })
}

/// Format an instant as a UTC calendar date.
pub fn format_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(DATE_FORMAT).to_string()
}
