//! CLI output formatting for `build` and `check`.
//!
//! # Output Format
//!
//! Every version is listed with its page and asset counts, followed by its
//! output paths as indented lines:
//!
//! ```text
//! Versions
//! 001 en (3 pages, 2 assets)
//!     Source: en/
//!     img/cat.png
//!     img/dog.png
//!     index.html
//!     posts/hello.html
//!     posts/world.html
//! 002 zh (3 pages, 1 asset)
//!     Source: zh/
//!     ...
//!
//! Sitemap: 7 entries
//! Built 6 pages, 3 assets (production) → dist
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::build::{SiteBuild, VersionBuild};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn version_lines(index: usize, version: &VersionBuild) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} ({}, {})",
        format_index(index),
        version.version_dir,
        plural(version.page_count, "page", "pages"),
        plural(version.asset_count, "asset", "assets"),
    )];
    lines.push(format!("{}Source: {}/", indent(1), version.version_dir));
    for path in &version.paths.paths {
        lines.push(format!("{}{}", indent(1), path));
    }
    lines
}

fn versions_section(site: &SiteBuild) -> Vec<String> {
    let mut lines = vec!["Versions".to_string()];
    for (i, version) in site.versions.iter().enumerate() {
        lines.extend(version_lines(i + 1, version));
    }
    lines
}

pub fn format_build_output(site: &SiteBuild) -> Vec<String> {
    let mut lines = versions_section(site);
    lines.push(String::new());
    if site.sitemap.is_some() {
        lines.push(format!(
            "Sitemap: {}",
            plural(site.sitemap_entries, "entry", "entries")
        ));
    }
    lines.push(format!(
        "Built {}, {} ({}) → {}",
        plural(site.page_count(), "page", "pages"),
        plural(site.asset_count(), "asset", "assets"),
        site.mode.as_str(),
        site.out_dir
    ));
    lines
}

pub fn print_build_output(site: &SiteBuild) {
    for line in format_build_output(site) {
        println!("{}", line);
    }
}

pub fn format_check_output(site: &SiteBuild) -> Vec<String> {
    let mut lines = versions_section(site);
    lines.push(String::new());
    lines.push(format!(
        "Checked {} in {}: no problems found",
        plural(site.page_count(), "page", "pages"),
        plural(site.versions.len(), "version", "versions"),
    ));
    lines
}

pub fn print_check_output(site: &SiteBuild) {
    for line in format_check_output(site) {
        println!("{}", line);
    }
}
