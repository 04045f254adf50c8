//! Whole-site build.
//!
//! A build runs in two phases so that a failing check never leaves a
//! half-written site behind:
//!
//! 1. **Plan** ([`plan_site`]): every version is loaded, validated and
//!    rendered in memory, one after another, then the versions are compared
//!    with each other. Any error aborts here, before the output directory is
//!    touched.
//! 2. **Write** ([`write_site`]): the output directory is cleared, static
//!    files are copied, and every planned file is written. Production builds
//!    then refresh each version's date snapshot and write the sitemap.
//!
//! `check` runs the plan phase only.

use crate::config::{self, ConfigError, SiteConfig, VersionConfig};
use crate::consistency::{self, VersionMismatch, VersionPathSet};
use crate::frontmatter::{self, MetadataError, Note};
use crate::generate::{self, PageContext};
use crate::loader::{self, FileMap};
use crate::markdown::{self, RenderUsage};
use crate::references::{OrphanedResources, ReferenceError, ReferenceTracker};
use crate::timestamps::{self, Snapshot, SnapshotError};
use crate::types::{FileDates, SiteEntry};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot load version directory {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Orphaned(#[from] OrphanedResources),
    #[error(transparent)]
    Mismatch(#[from] VersionMismatch),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("static file {0} does not exist")]
    MissingStatic(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Production builds use the real domain, keep the date snapshot, minify
/// pages and emit a sitemap. Development builds do none of that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Production,
    Development,
}

impl BuildMode {
    /// `production` selects production; any other value is development.
    pub fn from_label(label: &str) -> Self {
        if label == "production" {
            Self::Production
        } else {
            Self::Development
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
        }
    }
}

/// One version, fully rendered in memory.
#[derive(Debug)]
pub struct VersionBuild {
    pub version_dir: String,
    /// Output files keyed by path relative to `{out_dir}/{version_dir}/`.
    pub outputs: BTreeMap<String, Vec<u8>>,
    pub entries: Vec<SiteEntry>,
    pub paths: VersionPathSet,
    /// Dates to persist for the next build (production only).
    pub snapshot: Option<Snapshot>,
    pub page_count: usize,
    pub asset_count: usize,
}

/// The whole site, ready to be written.
#[derive(Debug)]
pub struct SiteBuild {
    pub mode: BuildMode,
    /// Output directory, relative to the project root.
    pub out_dir: String,
    pub versions: Vec<VersionBuild>,
    pub robots: String,
    /// Rendered `sitemap.xml` (production only).
    pub sitemap: Option<String>,
    pub sitemap_entries: usize,
}

impl SiteBuild {
    pub fn page_count(&self) -> usize {
        self.versions.iter().map(|v| v.page_count).sum()
    }

    pub fn asset_count(&self) -> usize {
        self.versions.iter().map(|v| v.asset_count).sum()
    }
}

/// Load config, build every version and write the site.
pub fn build_site(root: &Path, mode: BuildMode) -> Result<SiteBuild, BuildError> {
    let config = config::load_config(root)?;
    let site = plan_site(root, &config, mode)?;
    write_site(root, &config, &site)?;
    Ok(site)
}

/// Run every validation of a build without writing anything.
pub fn check_site(root: &Path, mode: BuildMode) -> Result<SiteBuild, BuildError> {
    let config = config::load_config(root)?;
    plan_site(root, &config, mode)
}

/// Build every version in memory, cross-check them, and confirm the static
/// files exist.
pub fn plan_site(
    root: &Path,
    config: &SiteConfig,
    mode: BuildMode,
) -> Result<SiteBuild, BuildError> {
    let mut versions = Vec::with_capacity(config.versions.len());
    for version in &config.versions {
        let built = build_version(root, config, version, mode)?;
        log::info!(
            "built version {}: {} pages, {} assets",
            built.version_dir,
            built.page_count,
            built.asset_count
        );
        versions.push(built);
    }

    let path_sets: Vec<VersionPathSet> = versions.iter().map(|v| v.paths.clone()).collect();
    consistency::check_versions(&path_sets)?;

    for item in &config.static_files {
        if !root.join(item).exists() {
            return Err(BuildError::MissingStatic(item.clone()));
        }
    }

    let mut entries: Vec<SiteEntry> = versions
        .iter()
        .flat_map(|v| v.entries.iter().cloned())
        .collect();
    if let Some(freq) = config.sitemap.root_changefreq {
        let root_entry = generate::root_entry(&config.domain, freq, &entries);
        entries.insert(0, root_entry);
    }

    let sitemap = mode
        .is_production()
        .then(|| generate::render_sitemap(&entries));

    Ok(SiteBuild {
        mode,
        out_dir: config.out_dir.clone(),
        versions,
        robots: generate::render_robots(&config.domain),
        sitemap,
        sitemap_entries: entries.len(),
    })
}

/// Load, validate and render one version.
///
/// Notes are parsed before anything renders, so a note with bad front-matter
/// fails the version even when an earlier note has a broken link.
pub fn build_version(
    root: &Path,
    config: &SiteConfig,
    version: &VersionConfig,
    mode: BuildMode,
) -> Result<VersionBuild, BuildError> {
    let dir = version.dir_name.as_str();
    let version_root = root.join(dir);
    let mut files = loader::load_dir(&version_root).map_err(|source| BuildError::Load {
        path: version_root.display().to_string(),
        source,
    })?;
    files.remove(&config.snapshot_file);

    let persisted = if mode.is_production() {
        Snapshot::load(&version_root.join(&config.snapshot_file))?
    } else {
        Snapshot::empty()
    };

    let notes = parse_notes(&files)?;
    let page_count = notes.len();
    let origin = config.origin(mode.is_production());

    let mut tracker = ReferenceTracker::new(&files, dir);
    let mut outputs = BTreeMap::new();
    let mut entries = Vec::with_capacity(page_count);
    let mut next_snapshot = Snapshot::empty();

    for (rel_path, note) in &notes {
        let live = timestamps::live_dates(&version_root.join(rel_path))?;
        let dates = if mode.is_production() {
            let reconciled = timestamps::reconcile(live, persisted.get(rel_path));
            next_snapshot.insert(rel_path.clone(), reconciled.persist);
            reconciled.render
        } else {
            live
        };

        let rendered = markdown::render_markdown(&note.body, origin, |target| {
            tracker.validate_reference(rel_path, target).map(|_| ())
        })?;
        log::debug!("rendered {dir}/{rel_path}");

        let html = render_note(
            config,
            version,
            origin,
            rel_path,
            note,
            &dates,
            &rendered.html,
            rendered.usage,
        );
        let html = if rel_path == "index.md" {
            generate::fill_total(&html, page_count)
        } else {
            html
        };
        let bytes = if mode.is_production() {
            generate::minify_page(&html)
        } else {
            html.into_bytes()
        };

        outputs.insert(generate::page_path(rel_path), bytes);
        entries.push(SiteEntry {
            url: format!(
                "{}{}",
                config.domain,
                generate::page_url_path(dir, rel_path)
            ),
            changefreq: note.front_matter.changefreq,
            lastmod: dates.update,
            created: dates.create,
            priority: note.front_matter.changefreq.priority(),
        });
    }

    tracker.check_orphans(dir, &config.validate.ignore_file_paths)?;

    let mut asset_count = 0;
    for (rel_path, content) in &files {
        if !is_note(rel_path) {
            outputs.insert(rel_path.clone(), content.clone());
            asset_count += 1;
        }
    }

    let mut paths = VersionPathSet::new(dir);
    paths.paths.extend(outputs.keys().cloned());

    Ok(VersionBuild {
        version_dir: dir.to_string(),
        outputs,
        entries,
        paths,
        snapshot: mode.is_production().then_some(next_snapshot),
        page_count,
        asset_count,
    })
}

fn is_note(rel_path: &str) -> bool {
    rel_path.ends_with(".md")
}

fn parse_notes(files: &FileMap) -> Result<BTreeMap<String, Note>, MetadataError> {
    files
        .iter()
        .filter(|(path, _)| is_note(path))
        .map(|(path, raw)| Ok((path.clone(), frontmatter::parse_note(path, raw)?)))
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn render_note(
    site: &SiteConfig,
    version: &VersionConfig,
    origin: &str,
    rel_path: &str,
    note: &Note,
    dates: &FileDates,
    content: &str,
    usage: RenderUsage,
) -> String {
    let ctx = PageContext {
        site,
        version,
        origin,
        rel_path,
        front_matter: &note.front_matter,
        dates,
        content,
        usage,
    };
    generate::render_page(&ctx).into_string()
}

/// Flush a planned site to disk.
///
/// Clears the output directory first. Every write finishes before the next
/// one starts.
pub fn write_site(root: &Path, config: &SiteConfig, site: &SiteBuild) -> Result<(), BuildError> {
    let out_dir = root.join(&config.out_dir);
    if out_dir.exists() {
        fs::remove_dir_all(&out_dir)?;
    }
    fs::create_dir_all(&out_dir)?;

    for item in &config.static_files {
        copy_static(&root.join(item), &out_dir.join(item), item)?;
    }

    for version in &site.versions {
        let version_out = out_dir.join(&version.version_dir);
        for (rel_path, bytes) in &version.outputs {
            write_file(&version_out.join(rel_path), bytes)?;
        }
    }

    for version in &site.versions {
        if let Some(snapshot) = &version.snapshot {
            let path = root.join(&version.version_dir).join(&config.snapshot_file);
            fs::write(&path, snapshot.to_json()?)?;
            log::debug!("wrote {} dates to {}", snapshot.len(), path.display());
        }
    }

    fs::write(out_dir.join("robots.txt"), &site.robots)?;
    if let Some(sitemap) = &site.sitemap {
        fs::write(out_dir.join("sitemap.xml"), sitemap)?;
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)
}

/// Copy a static file, or a directory tree, into the output directory.
fn copy_static(src: &Path, dst: &Path, label: &str) -> Result<(), BuildError> {
    if src.is_file() {
        write_file(dst, &fs::read(src)?)?;
        return Ok(());
    }
    if !src.is_dir() {
        return Err(BuildError::MissingStatic(label.to_string()));
    }
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(src).map_err(io::Error::other)?;
        write_file(&dst.join(rel), &fs::read(entry.path())?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{note, site_config, write_file as put, write_site_config};
    use tempfile::TempDir;

    fn single_version() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write_site_config(tmp.path(), &["en"]);
        let home = note("Home", "daily", "[a](/en/a.md)\n\n[[blogTotalNumber]] notes");
        put(tmp.path(), "en/index.md", &home);
        put(tmp.path(), "en/a.md", &note("A", "weekly", "![pic](/b.png)"));
        put(tmp.path(), "en/b.png", "PNG");
        tmp
    }

    fn build_first(root: &Path, mode: BuildMode) -> Result<VersionBuild, BuildError> {
        let config = config::load_config(root).unwrap();
        build_version(root, &config, &config.versions[0], mode)
    }

    #[test]
    fn mode_label_parsing() {
        assert_eq!(BuildMode::from_label("production"), BuildMode::Production);
        assert_eq!(BuildMode::from_label("development"), BuildMode::Development);
        assert_eq!(BuildMode::from_label("staging"), BuildMode::Development);
        assert_eq!(BuildMode::from_label(""), BuildMode::Development);
    }

    #[test]
    fn version_outputs_pages_and_assets() {
        let tmp = single_version();

        let v = build_first(tmp.path(), BuildMode::Development).unwrap();

        assert_eq!(v.page_count, 2);
        assert_eq!(v.asset_count, 1);
        let keys: Vec<&str> = v.outputs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a.html", "b.png", "index.html"]);
        assert_eq!(v.outputs["b.png"], b"PNG");
        assert!(v.snapshot.is_none());
    }

    #[test]
    fn path_set_covers_assets_as_well_as_pages() {
        let tmp = single_version();

        let v = build_first(tmp.path(), BuildMode::Development).unwrap();

        let paths: Vec<&str> = v.paths.paths.iter().map(String::as_str).collect();
        assert_eq!(paths, vec!["a.html", "b.png", "index.html"]);
    }

    #[test]
    fn home_page_gets_page_count() {
        let tmp = single_version();

        let v = build_first(tmp.path(), BuildMode::Development).unwrap();

        let home = String::from_utf8(v.outputs["index.html"].clone()).unwrap();
        assert!(home.contains("2 notes"));
        assert!(!home.contains("[[blogTotalNumber]]"));
    }

    #[test]
    fn sitemap_entries_use_production_domain() {
        let tmp = single_version();

        let v = build_first(tmp.path(), BuildMode::Development).unwrap();

        let urls: Vec<&str> = v.entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://notes.example.org/en/a.html", "https://notes.example.org/en/"]
        );
        assert_eq!(v.entries[0].priority, 0.8);
    }

    #[test]
    fn development_links_use_dev_domain() {
        let tmp = single_version();

        let v = build_first(tmp.path(), BuildMode::Development).unwrap();

        let page = String::from_utf8(v.outputs["a.html"].clone()).unwrap();
        assert!(page.contains(r#"href="http://localhost:4000/en/a.html""#));
    }

    #[test]
    fn snapshot_file_is_not_content() {
        let tmp = single_version();
        put(tmp.path(), "en/blogs.json", "{}");

        let v = build_first(tmp.path(), BuildMode::Production).unwrap();

        assert!(!v.outputs.contains_key("blogs.json"));
        let snapshot = v.snapshot.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get("a.md").is_some());
    }

    #[test]
    fn missing_version_dir_is_load_error() {
        let tmp = TempDir::new().unwrap();
        write_site_config(tmp.path(), &["en"]);

        let err = build_first(tmp.path(), BuildMode::Development).unwrap_err();

        assert!(matches!(err, BuildError::Load { .. }));
    }

    #[test]
    fn check_reports_missing_static_file() {
        let tmp = single_version();
        put(
            tmp.path(),
            "config.toml",
            &site_config(&["en"], "static_files = [\"favicon.ico\"]"),
        );

        let err = check_site(tmp.path(), BuildMode::Development).unwrap_err();

        assert!(matches!(err, BuildError::MissingStatic(p) if p == "favicon.ico"));
        assert!(!tmp.path().join("dist").exists());
    }

    #[test]
    fn static_directories_copied_recursively() {
        let tmp = TempDir::new().unwrap();
        put(tmp.path(), "assets/style.css", "body {}");
        put(tmp.path(), "assets/img/logo.svg", "<svg/>");
        let out = tmp.path().join("dist/assets");

        copy_static(&tmp.path().join("assets"), &out, "assets").unwrap();

        assert_eq!(fs::read_to_string(out.join("style.css")).unwrap(), "body {}");
        assert_eq!(fs::read_to_string(out.join("img/logo.svg")).unwrap(), "<svg/>");
    }

    #[test]
    fn missing_static_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = copy_static(&tmp.path().join("nope"), &tmp.path().join("dist/nope"), "nope")
            .unwrap_err();
        assert!(matches!(err, BuildError::MissingStatic(p) if p == "nope"));
    }
}
