//! Shared types used across the build pipeline.
//!
//! These types flow between the per-version build, the timestamp snapshot
//! on disk, and the sitemap at the end of the whole-site build.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sitemap change-frequency hint declared in each note's front-matter.
///
/// The enumeration is closed: anything outside these six labels is rejected
/// during front-matter validation. Every label maps to exactly one sitemap
/// priority via [`ChangeFreq::priority`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    /// All labels, in the order they are listed in error messages.
    pub const ALL: [ChangeFreq; 6] = [
        ChangeFreq::Hourly,
        ChangeFreq::Daily,
        ChangeFreq::Weekly,
        ChangeFreq::Monthly,
        ChangeFreq::Yearly,
        ChangeFreq::Never,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }

    /// Sitemap priority in (0, 1].
    pub fn priority(self) -> f32 {
        match self {
            ChangeFreq::Hourly | ChangeFreq::Daily => 1.0,
            ChangeFreq::Weekly => 0.8,
            ChangeFreq::Monthly => 0.6,
            ChangeFreq::Yearly => 0.4,
            ChangeFreq::Never => 0.2,
        }
    }

    /// Comma-separated list of every valid label.
    pub fn allowed_labels() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeFreq {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Created/updated calendar dates (`YYYY-MM-DD`) for one note.
///
/// Field names match the snapshot file format:
/// `{"a.md": {"create": "2023-01-01", "update": "2023-06-01"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDates {
    pub create: String,
    pub update: String,
}

impl FileDates {
    pub fn new(create: impl Into<String>, update: impl Into<String>) -> Self {
        Self {
            create: create.into(),
            update: update.into(),
        }
    }
}

/// One published page, as it appears in `sitemap.xml`.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteEntry {
    /// Absolute URL of the page.
    pub url: String,
    pub changefreq: ChangeFreq,
    pub lastmod: String,
    pub created: String,
    pub priority: f32,
}
