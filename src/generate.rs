//! HTML, robots.txt and sitemap generation.
//!
//! Everything here is pure: functions take rendered content plus config and
//! return strings or bytes. Writing files is the build module's job.
//!
//! ## Page URLs
//!
//! Notes publish next to their source, with `.md` swapped for `.html`. A note
//! named `index.md` is addressed by its directory:
//!
//! ```text
//! en/index.md          →  dist/en/index.html          /en/
//! en/posts/index.md    →  dist/en/posts/index.html    /en/posts/
//! en/posts/hello.md    →  dist/en/posts/hello.html    /en/posts/hello.html
//! ```
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Rendered Markdown is spliced in with `PreEscaped`; every config and
//! front-matter value goes through maud's escaping.

use crate::config::{SiteConfig, VersionConfig};
use crate::frontmatter::FrontMatter;
use crate::markdown::RenderUsage;
use crate::types::{ChangeFreq, FileDates, SiteEntry};
use maud::{DOCTYPE, Markup, PreEscaped, html};

/// Replaced with the number of published pages on a version's home page.
pub const TOTAL_PLACEHOLDER: &str = "[[blogTotalNumber]]";

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Output path of a note, relative to its version's output directory.
pub fn page_path(rel_path: &str) -> String {
    match rel_path.strip_suffix(".md") {
        Some(stem) => format!("{stem}.html"),
        None => rel_path.to_string(),
    }
}

/// Public URL path of a note, starting with `/{version_dir}/`.
pub fn page_url_path(version_dir: &str, rel_path: &str) -> String {
    if rel_path == "index.md" {
        return format!("/{version_dir}/");
    }
    match rel_path.strip_suffix("/index.md") {
        Some(dir) => format!("/{version_dir}/{dir}/"),
        None => format!("/{version_dir}/{}", page_path(rel_path)),
    }
}

/// Everything the page template needs for one note.
pub struct PageContext<'a> {
    pub site: &'a SiteConfig,
    pub version: &'a VersionConfig,
    /// Origin links are rendered against (production or development domain).
    pub origin: &'a str,
    /// Source path relative to the version directory.
    pub rel_path: &'a str,
    pub front_matter: &'a FrontMatter,
    pub dates: &'a FileDates,
    /// Rendered Markdown body.
    pub content: &'a str,
    pub usage: RenderUsage,
}

impl PageContext<'_> {
    fn canonical_url(&self) -> String {
        format!(
            "{}{}",
            self.origin,
            page_url_path(&self.version.dir_name, self.rel_path)
        )
    }

    /// The same page in the counterpart language, if one is configured.
    fn counterpart(&self) -> Option<(&str, String)> {
        let next = self.site.version(&self.version.next_lang)?;
        Some((
            next.lang.as_str(),
            page_url_path(&next.dir_name, self.rel_path),
        ))
    }

    fn source_url(&self) -> Option<String> {
        if self.site.github_name.is_empty() || self.site.repo_name.is_empty() {
            return None;
        }
        Some(format!(
            "https://github.com/{}/{}/blob/main/{}/{}",
            self.site.github_name, self.site.repo_name, self.version.dir_name, self.rel_path
        ))
    }

    fn site_name(&self) -> &str {
        if self.version.blog_name.is_empty() {
            &self.site.domain_name
        } else {
            &self.version.blog_name
        }
    }
}

/// Renders a complete note page.
pub fn render_page(ctx: &PageContext) -> Markup {
    let fm = ctx.front_matter;
    let counterpart = ctx.counterpart();
    let home = format!("/{}/", ctx.version.dir_name);
    let author = (!ctx.version.author.is_empty()).then_some(ctx.version.author.as_str());

    let head = html! {
        meta name="description" content=(fm.description);
        meta name="keywords" content=(fm.keywords);
        meta name="author" content=[author];
        @for (name, value) in &fm.extra {
            meta name=(name) content=(value);
        }
        link rel="canonical" href=(ctx.canonical_url());
        @if let Some((lang, path)) = &counterpart {
            link rel="alternate" hreflang=(lang) href=(format!("{}{}", ctx.origin, path));
        }
        link rel="stylesheet" href=(ctx.site.assets.stylesheet);
        @if ctx.usage.has_code_block {
            link rel="stylesheet" href=(ctx.site.assets.highlight_stylesheet);
        }
    };

    let body = html! {
        header.site-header {
            a.site-name href=(home) { (ctx.site_name()) }
            @if let Some((lang, path)) = &counterpart {
                a.next-lang href=(path) hreflang=(lang) { (ctx.version.next_lang_type) }
            }
        }
        main {
            article {
                header.article-header {
                    h1 { (fm.title) }
                    p.dates {
                        span.created {
                            (ctx.version.created_words) " "
                            time datetime=(ctx.dates.create) { (ctx.dates.create) }
                        }
                        " "
                        span.updated {
                            (ctx.version.updated_words) " "
                            time datetime=(ctx.dates.update) { (ctx.dates.update) }
                        }
                    }
                }
                (PreEscaped(ctx.content))
            }
        }
        footer.site-footer {
            @if let Some(author) = author {
                span.author { "© " (author) }
            }
            @if let Some(url) = ctx.source_url() {
                a.source-link href=(url) target="_blank" rel="noopener" { "View source" }
            }
        }
        @if ctx.usage.has_code_block {
            script src=(ctx.site.assets.highlight_script) {}
            script { (PreEscaped("hljs.highlightAll();")) }
        }
    };

    let title = format!("{} | {}", fm.title, ctx.site_name());
    base_document(&ctx.version.lang, &title, head, body)
}

fn base_document(lang: &str, title: &str, head: Markup, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(lang) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                (head)
            }
            body {
                (content)
            }
        }
    }
}

/// Substitute the page count into a rendered home page.
pub fn fill_total(html: &str, total: usize) -> String {
    html.replace(TOTAL_PLACEHOLDER, &total.to_string())
}

/// Minify a rendered page for production.
pub fn minify_page(html: &str) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.keep_comments = false;
    minify_html::minify(html.as_bytes(), &cfg)
}

pub fn render_robots(domain: &str) -> String {
    format!("User-agent: *\nAllow: /\n\nSitemap: {domain}/sitemap.xml\n")
}

/// Sitemap entry for the site root, dated by the newest page update.
pub fn root_entry(domain: &str, changefreq: ChangeFreq, pages: &[SiteEntry]) -> SiteEntry {
    let newest = pages
        .iter()
        .map(|e| e.lastmod.as_str())
        .max()
        .unwrap_or_default()
        .to_string();
    let oldest = pages
        .iter()
        .map(|e| e.created.as_str())
        .min()
        .unwrap_or_default()
        .to_string();
    SiteEntry {
        url: format!("{domain}/"),
        changefreq,
        lastmod: newest,
        created: oldest,
        priority: changefreq.priority(),
    }
}

pub fn render_sitemap(entries: &[SiteEntry]) -> String {
    let urlset = html! {
        urlset xmlns=(SITEMAP_NS) {
            @for entry in entries {
                url {
                    loc { (entry.url) }
                    @if !entry.lastmod.is_empty() {
                        lastmod { (entry.lastmod) }
                    }
                    changefreq { (entry.changefreq.as_str()) }
                    priority { (format!("{:.1}", entry.priority)) }
                }
            }
        }
    };
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}\n",
        urlset.into_string()
    )
}
