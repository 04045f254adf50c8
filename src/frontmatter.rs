//! Front-matter parsing and validation for notes.
//!
//! Every Markdown note starts with a YAML block between `---` lines:
//!
//! ```text
//! ---
//! title: Hello
//! keywords: [rust, notes]
//! description: A first note
//! changefreq: weekly
//! ---
//!
//! # Hello
//! ```
//!
//! `title`, `keywords`, `description` and `changefreq` are required, and
//! `changefreq` must be one of the six sitemap labels. A single note that
//! fails either check stops the whole build: publishing a site with a
//! half-described page is worse than publishing nothing.
//!
//! Any other keys are kept as free-form extras.

use crate::types::ChangeFreq;
use serde_yaml_ng::{Mapping, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Keys every note must declare.
pub const REQUIRED_KEYS: [&str; 4] = ["title", "keywords", "description", "changefreq"];

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error(
        "{path}: the Markdown must include the following metadata: \
         title, keywords, description, and changefreq (missing: {})",
        .missing.join(", ")
    )]
    MissingKeys {
        path: String,
        missing: Vec<&'static str>,
    },
    #[error(
        "{path}: the value of the changefreq field `{value}` is incorrect; \
         it must be one of the following: {}",
        ChangeFreq::allowed_labels()
    )]
    InvalidChangefreq { path: String, value: String },
    #[error("{path}: invalid front-matter: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },
    #[error("{path}: note is not valid UTF-8")]
    NotUtf8 { path: String },
}

/// Validated metadata of one note.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub title: String,
    pub keywords: String,
    pub description: String,
    pub changefreq: ChangeFreq,
    /// Optional keys beyond the required four, as text. Each one becomes a
    /// `<meta name content>` tag in the page head.
    pub extra: BTreeMap<String, String>,
}

/// A note split into its validated metadata and Markdown body.
#[derive(Debug, Clone)]
pub struct Note {
    pub front_matter: FrontMatter,
    pub body: String,
}

/// Parse and validate a raw note.
///
/// `path` is only used to label errors.
pub fn parse_note(path: &str, raw: &[u8]) -> Result<Note, MetadataError> {
    let text = std::str::from_utf8(raw).map_err(|_| MetadataError::NotUtf8 {
        path: path.to_string(),
    })?;
    let (yaml, body) = split_front_matter(text);

    let mapping = if yaml.trim().is_empty() {
        Mapping::new()
    } else {
        match serde_yaml_ng::from_str::<Value>(yaml) {
            Ok(Value::Mapping(m)) => m,
            // A scalar or list block declares none of the required keys
            Ok(_) => Mapping::new(),
            Err(source) => {
                return Err(MetadataError::Yaml {
                    path: path.to_string(),
                    source,
                });
            }
        }
    };

    let front_matter = validate(path, &mapping)?;
    Ok(Note {
        front_matter,
        body: body.to_string(),
    })
}

/// Check the required keys, then the changefreq label.
pub fn validate(path: &str, mapping: &Mapping) -> Result<FrontMatter, MetadataError> {
    let missing: Vec<&'static str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !mapping.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(MetadataError::MissingKeys {
            path: path.to_string(),
            missing,
        });
    }

    let raw_freq = mapping.get("changefreq").map(value_text).unwrap_or_default();
    let changefreq = raw_freq
        .parse::<ChangeFreq>()
        .map_err(|value| MetadataError::InvalidChangefreq {
            path: path.to_string(),
            value,
        })?;

    let text_of = |key: &str| mapping.get(key).map(value_text).unwrap_or_default();

    let extra = mapping
        .iter()
        .filter_map(|(k, v)| {
            let key = k.as_str()?;
            (!REQUIRED_KEYS.contains(&key)).then(|| (key.to_string(), value_text(v)))
        })
        .collect();

    Ok(FrontMatter {
        title: text_of("title"),
        keywords: text_of("keywords"),
        description: text_of("description"),
        changefreq,
        extra,
    })
}

/// Split `---`-delimited front-matter from the body.
///
/// Returns an empty front-matter string when the note does not open with a
/// `---` line or the block is never closed.
pub fn split_front_matter(content: &str) -> (&str, &str) {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return ("", content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let body = &rest[offset + line.len()..];
            return (&rest[..offset], body);
        }
        offset += line.len();
    }
    ("", content)
}

/// Render a YAML value as display text. Lists are comma-joined.
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(items) => items
            .iter()
            .map(value_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Mapping(_) => serde_yaml_ng::to_string(value)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
        Value::Tagged(tagged) => value_text(&tagged.value),
    }
}
