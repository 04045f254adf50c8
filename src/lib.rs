//! # notes-press
//!
//! A static site generator for blogs written as plain directories of Markdown
//! notes, one directory per language. The generator is strict: it refuses to
//! publish a site with incomplete metadata, broken links, unreferenced files,
//! or a page that exists in one language but not another.
//!
//! # Architecture: Plan, Then Write
//!
//! ```text
//! 1. Load      {version}/        →  path → bytes      (per version, sorted)
//! 2. Validate  front-matter      →  FrontMatter       (required keys, changefreq)
//! 3. Render    Markdown          →  HTML pages        (references checked as they render)
//! 4. Check     loaded − used     →  orphaned files    (per version)
//! 5. Compare   output paths      →  mismatches        (across versions)
//! 6. Write     dist/             →  pages, assets, robots.txt, sitemap.xml, snapshots
//! ```
//!
//! Steps 1–5 run entirely in memory. Nothing is written until every version
//! has passed every check, so a failed build leaves the previous output alone.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`build`] | Whole-site build: plans every version in memory, then writes the output |
//! | [`loader`] | Recursive directory loading into a sorted path → bytes map |
//! | [`frontmatter`] | YAML front-matter splitting and required-key validation |
//! | [`timestamps`] | Publish-date snapshot and created/updated reconciliation |
//! | [`references`] | Link/image target validation and orphaned-file detection |
//! | [`consistency`] | Cross-version output-path comparison |
//! | [`markdown`] | Markdown rendering with reference hooks, via pulldown-cmark |
//! | [`generate`] | Page template (Maud), robots.txt, sitemap.xml, minification |
//! | [`config`] | `config.toml` loading, merging onto stock defaults, validation |
//! | [`types`] | Shared types: change frequency, file dates, sitemap entries |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Stable Publish Dates
//!
//! Hosted builds run in fresh checkouts where every file looks brand new.
//! Production builds therefore keep a JSON snapshot of each note's created
//! and updated dates inside the version directory and prefer it over the
//! filesystem. See [`timestamps`].
//!
//! ## Every File Must Be Referenced
//!
//! A file that no note links to is treated as an authoring mistake (a typo in
//! a link, or a leftover upload) and fails the build. Files used only by the
//! page template are listed in `validate.ignore_file_paths`.

pub mod build;
pub mod config;
pub mod consistency;
pub mod frontmatter;
pub mod generate;
pub mod loader;
pub mod markdown;
pub mod output;
pub mod references;
pub mod timestamps;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
