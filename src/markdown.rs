//! Markdown → HTML rendering with reference hooks.
//!
//! Uses pulldown-cmark and rewrites its event stream:
//!
//! - **Images** become `<figure>` elements with lazy loading and the alt text
//!   repeated as a caption.
//! - **Links** to the site itself (root-relative or same domain) stay in the
//!   tab; root-relative `.md` links are rewritten to `.html`. External links
//!   open in a new tab with `rel="nofollow noopener"`.
//! - **Code blocks** are passed through and recorded in [`RenderUsage`], so
//!   the page template only loads syntax highlighting where it is needed.
//!
//! Every image source and link target is handed to the caller's
//! `on_reference` hook before it is emitted. The first hook error aborts the
//! render.

use crate::references::ReferenceError;
use maud::html;
use pulldown_cmark::{Event, LinkType, Options, Parser, Tag, TagEnd, html::push_html};

/// Features of the rendered content the page template cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderUsage {
    pub has_code_block: bool,
}

#[derive(Debug, Clone)]
pub struct RenderedMarkdown {
    pub html: String,
    pub usage: RenderUsage,
}

/// An image whose alt text is still being collected.
struct PendingImage {
    src: String,
    title: String,
    alt: String,
}

/// Render a note body.
///
/// `site_domain` identifies absolute links that still point at this site.
pub fn render_markdown<F>(
    body: &str,
    site_domain: &str,
    mut on_reference: F,
) -> Result<RenderedMarkdown, ReferenceError>
where
    F: FnMut(&str) -> Result<(), ReferenceError>,
{
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES;

    let mut usage = RenderUsage::default();
    let mut events: Vec<Event> = Vec::new();
    // Images can nest inside alt text; only the outermost one is emitted.
    let mut images: Vec<PendingImage> = Vec::new();

    for event in Parser::new_ext(body, options) {
        match event {
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => {
                on_reference(&dest_url)?;
                images.push(PendingImage {
                    src: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                });
            }
            Event::End(TagEnd::Image) => {
                if let Some(image) = images.pop() {
                    match images.last_mut() {
                        Some(parent) => parent.alt.push_str(&image.alt),
                        None => events.push(Event::InlineHtml(render_figure(&image).into())),
                    }
                }
            }
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            }) => {
                let target = match link_type {
                    LinkType::Email => format!("mailto:{dest_url}"),
                    _ => dest_url.to_string(),
                };
                on_reference(&target)?;
                if images.is_empty() {
                    events.push(Event::InlineHtml(
                        open_anchor(&target, &title, site_domain).into(),
                    ));
                }
            }
            Event::End(TagEnd::Link) => {
                if images.is_empty() {
                    events.push(Event::InlineHtml("</a>".into()));
                }
            }
            Event::Text(text) | Event::Code(text) if !images.is_empty() => {
                if let Some(image) = images.last_mut() {
                    image.alt.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak if !images.is_empty() => {
                if let Some(image) = images.last_mut() {
                    image.alt.push(' ');
                }
            }
            // Emphasis and other markup inside alt text is flattened away
            _ if !images.is_empty() => {}
            Event::Start(Tag::CodeBlock(kind)) => {
                usage.has_code_block = true;
                events.push(Event::Start(Tag::CodeBlock(kind)));
            }
            other => events.push(other),
        }
    }

    let mut html = String::with_capacity(body.len() * 2);
    push_html(&mut html, events.into_iter());
    Ok(RenderedMarkdown { html, usage })
}

fn render_figure(image: &PendingImage) -> String {
    let title = (!image.title.is_empty()).then_some(image.title.as_str());
    html! {
        figure {
            img src=(image.src) alt=(image.alt) title=[title] loading="lazy";
            figcaption { (image.alt) }
        }
    }
    .into_string()
}

/// Opening `<a>` tag for a validated target.
fn open_anchor(target: &str, title: &str, site_domain: &str) -> String {
    let title_attr = if title.is_empty() {
        String::new()
    } else {
        format!(r#" title="{}""#, escape(title))
    };

    if target.starts_with("mailto:") {
        return format!(r#"<a href="{}"{}>"#, escape(target), title_attr);
    }

    let internal =
        target.starts_with('/') || (!site_domain.is_empty() && target.starts_with(site_domain));
    if internal {
        let href = if target.starts_with('/') {
            rewrite_md_link(target)
        } else {
            target.to_string()
        };
        format!(r#"<a href="{}"{} target="_self">"#, escape(&href), title_attr)
    } else {
        format!(
            r#"<a href="{}"{} target="_blank" rel="nofollow noopener">"#,
            escape(target),
            title_attr
        )
    }
}

/// `/en/a.md#part` → `/en/a.html#part`.
pub fn rewrite_md_link(target: &str) -> String {
    let split = target.find(['#', '?']).unwrap_or(target.len());
    let (path, suffix) = target.split_at(split);
    match path.strip_suffix(".md") {
        Some(stem) => format!("{stem}.html{suffix}"),
        None => target.to_string(),
    }
}

fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}
