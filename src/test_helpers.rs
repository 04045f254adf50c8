//! Shared test utilities for the notes-press test suite.
//!
//! Builds small project trees in a temp directory: a `config.toml` plus one
//! directory of notes per version.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_site_config(tmp.path(), &["en", "zh"]);
//! write_file(tmp.path(), "en/index.md", &note("Home", "daily", "[a](/en/a.md)"));
//! write_file(tmp.path(), "en/a.md", &note("A", "weekly", "Hello"));
//! ```

use std::fs;
use std::path::Path;

use crate::frontmatter::FrontMatter;

/// A note with all four required keys.
pub fn note(title: &str, changefreq: &str, body: &str) -> String {
    format!(
        "---\ntitle: {title}\nkeywords: notes, test\ndescription: About {title}\n\
         changefreq: {changefreq}\n---\n\n{body}\n"
    )
}

/// Validated front-matter matching what [`note`] writes.
pub fn front_matter(title: &str, changefreq: &str) -> FrontMatter {
    FrontMatter {
        title: title.to_string(),
        keywords: "notes, test".to_string(),
        description: format!("About {title}"),
        changefreq: changefreq.parse().unwrap(),
        extra: Default::default(),
    }
}

/// Config text for the given version directories.
///
/// Versions link to each other in a ring. `top_level` is inserted before the
/// version tables, so it may hold any top-level key.
pub fn site_config(dirs: &[&str], top_level: &str) -> String {
    let mut out = format!(
        "domain = \"https://notes.example.org\"\n\
         dev_domain = \"http://localhost:4000\"\n\
         domain_name = \"notes.example.org\"\n\
         {top_level}\n"
    );
    for (i, dir) in dirs.iter().enumerate() {
        let next = if dirs.len() > 1 {
            dirs[(i + 1) % dirs.len()]
        } else {
            ""
        };
        out.push_str(&format!(
            "\n[[versions]]\ndir_name = \"{dir}\"\nlang = \"{dir}\"\n\
             next_lang = \"{next}\"\nnext_lang_type = \"{next}\"\n"
        ));
    }
    out
}

pub fn write_site_config(root: &Path, dirs: &[&str]) {
    write_file(root, "config.toml", &site_config(dirs, ""));
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
