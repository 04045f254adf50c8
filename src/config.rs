//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives at
//! the project root next to the version directories:
//!
//! ```text
//! blog/
//! ├── config.toml        # Site config (optional, overrides stock defaults)
//! ├── index.html         # Static files listed in `static_files`
//! ├── assets/
//! ├── en/                # One directory per language version
//! │   ├── index.md
//! │   ├── blogs.json     # Date snapshot (written by production builds)
//! │   └── posts/...
//! └── zh/
//!     └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! domain = "https://example.com"        # Production origin
//! dev_domain = "http://localhost:8080"  # Origin used by development builds
//! domain_name = "example.com"           # Display name of the site
//! out_dir = "dist"                      # Output directory
//! static_files = []                     # Files/dirs copied verbatim to out_dir
//! snapshot_file = "blogs.json"          # Date snapshot inside each version dir
//! github_name = ""                      # "View source" link owner
//! repo_name = ""                        # "View source" link repository
//!
//! [validate]
//! ignore_file_paths = ["index.md"]      # Never reported as orphaned
//!
//! [sitemap]
//! root_changefreq = "daily"             # Adds the site root to sitemap.xml
//!
//! [assets]
//! stylesheet = "/assets/style.css"
//! highlight_stylesheet = "/assets/highlight/github.min.css"
//! highlight_script = "/assets/highlight/highlight.min.js"
//!
//! [[versions]]
//! dir_name = "notes"
//! lang = "en"
//! author = ""
//! blog_name = ""
//! next_lang = ""                        # Counterpart version dir
//! next_lang_type = ""                   # Label of the counterpart link
//! created_words = "Created"
//! updated_words = "Updated"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want. Tables merge
//! key by key; arrays (including `[[versions]]`) replace the default
//! entirely.
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::ChangeFreq;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path};
use thiserror::Error;

/// Name of the config file at the project root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Whole-site configuration loaded from `config.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Production origin, used for canonical URLs, robots.txt and the sitemap.
    pub domain: String,
    /// Origin used when rendering in development mode.
    pub dev_domain: String,
    /// Human-readable site name.
    pub domain_name: String,
    /// Output directory, relative to the project root. Must stay inside the
    /// project and outside every version directory.
    pub out_dir: String,
    /// Files or directories (relative to the project root) copied verbatim.
    /// Absolute paths and `..` segments are rejected.
    pub static_files: Vec<String>,
    /// File name of the date snapshot inside each version directory.
    pub snapshot_file: String,
    pub github_name: String,
    pub repo_name: String,
    pub validate: ValidateConfig,
    pub sitemap: SitemapConfig,
    pub assets: AssetsConfig,
    /// Language versions, built in this order.
    pub versions: Vec<VersionConfig>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: "https://example.com".to_string(),
            dev_domain: "http://localhost:8080".to_string(),
            domain_name: "example.com".to_string(),
            out_dir: "dist".to_string(),
            static_files: Vec::new(),
            snapshot_file: "blogs.json".to_string(),
            github_name: String::new(),
            repo_name: String::new(),
            validate: ValidateConfig::default(),
            sitemap: SitemapConfig::default(),
            assets: AssetsConfig::default(),
            versions: vec![VersionConfig::default()],
        }
    }
}

impl SiteConfig {
    /// Validate config values and cross-references between versions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, url) in [("domain", &self.domain), ("dev_domain", &self.dev_domain)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be an http(s) URL, got `{url}`"
                )));
            }
        }
        if self.versions.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[versions]] entry is required".into(),
            ));
        }
        if self.snapshot_file.is_empty() || self.snapshot_file.contains('/') {
            return Err(ConfigError::Validation(
                "snapshot_file must be a plain file name".into(),
            ));
        }

        let mut seen = HashSet::new();
        for version in &self.versions {
            let dir = version.dir_name.as_str();
            if dir.is_empty() || dir == "." || dir == ".." || dir.contains(['/', '\\']) {
                return Err(ConfigError::Validation(format!(
                    "versions.dir_name must be a single directory name, got `{dir}`"
                )));
            }
            if !seen.insert(dir) {
                return Err(ConfigError::Validation(format!(
                    "versions.dir_name `{dir}` is used twice"
                )));
            }
        }
        for version in &self.versions {
            if !version.next_lang.is_empty() && !seen.contains(version.next_lang.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "version `{}` links to unknown next_lang `{}`",
                    version.dir_name, version.next_lang
                )));
            }
        }

        let out = relative_parts(&self.out_dir).ok_or_else(|| {
            ConfigError::Validation(format!(
                "out_dir `{}` must be a relative path inside the project",
                self.out_dir
            ))
        })?;
        match out.first() {
            None => {
                return Err(ConfigError::Validation(format!(
                    "out_dir `{}` must not be the project root",
                    self.out_dir
                )));
            }
            Some(first) if seen.contains(first.as_str()) => {
                return Err(ConfigError::Validation(format!(
                    "out_dir `{}` must not be inside version directory `{first}`",
                    self.out_dir
                )));
            }
            Some(_) => {}
        }

        for item in &self.static_files {
            if !relative_parts(item).is_some_and(|parts| !parts.is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "static_files entry `{item}` must be a relative path inside the project"
                )));
            }
        }
        Ok(())
    }

    /// Origin pages are rendered against in the given mode.
    pub fn origin(&self, production: bool) -> &str {
        if production {
            &self.domain
        } else {
            &self.dev_domain
        }
    }

    pub fn version(&self, dir_name: &str) -> Option<&VersionConfig> {
        self.versions.iter().find(|v| v.dir_name == dir_name)
    }
}

/// Normal components of a project-relative path, with `.` segments dropped.
///
/// `None` when the path is absolute or climbs out with `..`.
fn relative_parts(path: &str) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(parts)
}

/// Content validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidateConfig {
    /// Paths (relative to a version dir) never reported as orphaned.
    /// Entries ending in `/` cover a whole directory.
    pub ignore_file_paths: Vec<String>,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            ignore_file_paths: vec!["index.md".to_string()],
        }
    }
}

/// Sitemap settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SitemapConfig {
    /// When set, the site root is listed with this change frequency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_changefreq: Option<ChangeFreq>,
}

/// Template asset URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    pub stylesheet: String,
    /// Loaded only on pages containing a code block.
    pub highlight_stylesheet: String,
    /// Loaded only on pages containing a code block.
    pub highlight_script: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            stylesheet: "/assets/style.css".to_string(),
            highlight_stylesheet: "/assets/highlight/github.min.css".to_string(),
            highlight_script: "/assets/highlight/highlight.min.js".to_string(),
        }
    }
}

/// One language version of the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VersionConfig {
    /// Source directory under the project root; also the URL prefix.
    pub dir_name: String,
    /// Value of the `<html lang>` attribute.
    pub lang: String,
    pub author: String,
    pub blog_name: String,
    /// Version dir holding the counterpart translation (empty for none).
    pub next_lang: String,
    /// Label of the link to the counterpart translation.
    pub next_lang_type: String,
    pub created_words: String,
    pub updated_words: String,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            dir_name: "notes".to_string(),
            lang: "en".to_string(),
            author: String::new(),
            blog_name: String::new(),
            next_lang: String::new(),
            next_lang_type: String::new(),
            created_words: "Created".to_string(),
            updated_words: "Updated".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` at the project root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# notes-press configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Production origin: canonical URLs, robots.txt and sitemap.xml use it.
domain = "https://example.com"

# Origin used for links when building with --mode development.
dev_domain = "http://localhost:8080"

# Display name of the site.
domain_name = "example.com"

# Output directory (cleared on every build).
out_dir = "dist"

# Files or directories copied verbatim into out_dir, e.g.
# static_files = ["index.html", "favicon.ico", "assets"]
static_files = []

# Date snapshot kept inside each version directory. Production builds read
# it to keep publish dates stable and rewrite it after a successful build.
snapshot_file = "blogs.json"

# "View source" link: https://github.com/<github_name>/<repo_name>
github_name = ""
repo_name = ""

# ---------------------------------------------------------------------------
# Validation
# ---------------------------------------------------------------------------
[validate]
# Files never reported as orphaned resources (relative to a version dir).
# Entries ending in "/" cover a whole directory.
ignore_file_paths = ["index.md"]

# ---------------------------------------------------------------------------
# Sitemap
# ---------------------------------------------------------------------------
[sitemap]
# List the site root itself with this change frequency.
# One of: hourly, daily, weekly, monthly, yearly, never
# root_changefreq = "daily"

# ---------------------------------------------------------------------------
# Template assets
# ---------------------------------------------------------------------------
[assets]
stylesheet = "/assets/style.css"
# Only loaded on pages that contain a code block.
highlight_stylesheet = "/assets/highlight/github.min.css"
highlight_script = "/assets/highlight/highlight.min.js"

# ---------------------------------------------------------------------------
# Language versions (built in order)
# ---------------------------------------------------------------------------
[[versions]]
dir_name = "notes"
lang = "en"
author = ""
blog_name = ""
# Directory of the counterpart translation, and the label of its link.
next_lang = ""
next_lang_type = ""
created_words = "Created"
updated_words = "Updated"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn two_versions() -> &'static str {
        r#"
domain = "https://blog.example.org"

[[versions]]
dir_name = "en"
lang = "en"
next_lang = "zh"
next_lang_type = "中文"

[[versions]]
dir_name = "zh"
lang = "zh-CN"
next_lang = "en"
next_lang_type = "English"
created_words = "创建于"
updated_words = "更新于"
"#
    }

    #[test]
    fn default_config_is_valid() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.out_dir, "dist");
        assert_eq!(config.snapshot_file, "blogs.json");
        assert_eq!(config.validate.ignore_file_paths, vec!["index.md"]);
        assert_eq!(config.versions.len(), 1);
        assert_eq!(config.versions[0].dir_name, "notes");
        assert!(config.sitemap.root_changefreq.is_none());
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.domain, "https://example.com");
    }

    #[test]
    fn load_config_reads_versions() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), two_versions()).unwrap();

        let config = load_config(tmp.path()).unwrap();

        assert_eq!(config.domain, "https://blog.example.org");
        assert_eq!(config.versions.len(), 2);
        assert_eq!(config.versions[1].lang, "zh-CN");
        assert_eq!(config.versions[1].created_words, "创建于");
        // Unspecified version keys fall back to VersionConfig defaults
        assert_eq!(config.versions[0].created_words, "Created");
        // Untouched top-level defaults preserved
        assert_eq!(config.out_dir, "dist");
        assert_eq!(config.version("zh").unwrap().next_lang, "en");
    }

    #[test]
    fn partial_table_merges_with_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            "[assets]\nstylesheet = \"/css/site.css\"\n",
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();

        assert_eq!(config.assets.stylesheet, "/css/site.css");
        assert_eq!(
            config.assets.highlight_script,
            "/assets/highlight/highlight.min.js"
        );
    }

    #[test]
    fn root_changefreq_parses_enum() {
        let config: SiteConfig =
            toml::from_str("[sitemap]\nroot_changefreq = \"weekly\"\n").unwrap();
        assert_eq!(config.sitemap.root_changefreq, Some(ChangeFreq::Weekly));

        let bad: Result<SiteConfig, _> = toml::from_str("[sitemap]\nroot_changefreq = \"often\"\n");
        assert!(bad.is_err());
    }

    #[test]
    fn invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "domain = [").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // merge_toml
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base: toml::Value = toml::from_str("list = [1, 2, 3]").unwrap();
        let overlay: toml::Value = toml::from_str("list = [9]").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["list"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value = toml::from_str("[x.y]\na = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[x.y]\nb = 5").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["x"]["y"]["a"].as_integer(), Some(1));
        assert_eq!(merged["x"]["y"]["b"].as_integer(), Some(5));
    }

    // =========================================================================
    // Unknown keys
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("domian = \"https://x.org\"");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_version_key_rejected() {
        let result: Result<SiteConfig, _> =
            toml::from_str("[[versions]]\ndir_name = \"en\"\nlanguage = \"en\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[validate]\nignore = []\n").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn with_versions(dirs: &[(&str, &str)]) -> SiteConfig {
        SiteConfig {
            versions: dirs
                .iter()
                .map(|(dir, next)| VersionConfig {
                    dir_name: dir.to_string(),
                    next_lang: next.to_string(),
                    ..VersionConfig::default()
                })
                .collect(),
            ..SiteConfig::default()
        }
    }

    #[test]
    fn validate_domain_must_be_url() {
        let config = SiteConfig {
            domain: "example.com".into(),
            ..SiteConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_requires_a_version() {
        assert!(with_versions(&[]).validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_dirs() {
        assert!(with_versions(&[("en", ""), ("en", "")]).validate().is_err());
    }

    #[test]
    fn validate_rejects_nested_dir_names() {
        assert!(with_versions(&[("notes/en", "")]).validate().is_err());
        assert!(with_versions(&[("..", "")]).validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_next_lang() {
        assert!(with_versions(&[("en", "fr")]).validate().is_err());
        assert!(with_versions(&[("en", "zh"), ("zh", "en")]).validate().is_ok());
    }

    #[test]
    fn validate_rejects_dangerous_out_dir() {
        let rejected = [
            "", ".", "./", "en", "./en", "en/", "en/sub", "en/../en", "..", "../dist", "/tmp/out",
        ];
        for out in rejected {
            let config = SiteConfig {
                out_dir: out.into(),
                ..with_versions(&[("en", "")])
            };
            assert!(config.validate().is_err(), "out_dir {out:?} should be rejected");
        }
    }

    #[test]
    fn validate_accepts_nested_out_dir() {
        for out in ["dist", "./dist", "build/site", "english"] {
            let config = SiteConfig {
                out_dir: out.into(),
                ..with_versions(&[("en", "")])
            };
            assert!(config.validate().is_ok(), "out_dir {out:?} should be accepted");
        }
    }

    #[test]
    fn validate_rejects_escaping_static_files() {
        for item in ["", ".", "/etc/passwd", "../secret", "assets/../../x"] {
            let config = SiteConfig {
                static_files: vec![item.into()],
                ..with_versions(&[("en", "")])
            };
            let err = config.validate().unwrap_err();
            assert!(
                err.to_string().contains("static_files"),
                "static_files entry {item:?} should be rejected"
            );
        }
        let config = SiteConfig {
            static_files: vec!["favicon.ico".into(), "./assets".into()],
            ..with_versions(&[("en", "")])
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn origin_depends_on_mode() {
        let config = SiteConfig::default();
        assert_eq!(config.origin(true), "https://example.com");
        assert_eq!(config.origin(false), "http://localhost:8080");
    }

    #[test]
    fn stock_config_toml_matches_defaults() {
        let parsed: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let default = SiteConfig::default();
        assert_eq!(parsed.domain, default.domain);
        assert_eq!(parsed.out_dir, default.out_dir);
        assert_eq!(parsed.snapshot_file, default.snapshot_file);
        assert_eq!(parsed.versions.len(), 1);
        assert_eq!(parsed.versions[0].dir_name, default.versions[0].dir_name);
        assert!(parsed.validate().is_ok());
    }
}
