//! Markdown to safe HTML body.
//!
//! Three steps, always in this order:
//!
//! 1. **Render** markdown with pulldown-cmark. Headings without an explicit
//!    `{#id}` get an automatic id slugged from their text, suffixed `-1`,
//!    `-2`, ... when that id is already used by any other heading, explicit
//!    ids included. Every link opens in a new browsing context
//!    (`target="_blank"`).
//! 2. **Sanitize** with ammonia's default policy, extended to keep heading
//!    ids, task-list checkboxes and `target` on `<a>` when, and only when,
//!    its value is exactly `_blank`.
//! 3. **Rewrite links**: any `href` pointing at a `.md` file is passed
//!    through [`map_path`](crate::mapping::map_path) so that links between
//!    documents point at the published pages. A `#fragment` is preserved.
//!
//! Rewriting works on the parsed HTML (lol_html), so text that merely looks
//! like `href="x.md"` inside a code block is left alone.

use crate::mapping::{MARKUP_EXTENSION, map_path};
use ammonia::Builder as AmmoniaBuilder;
use lol_html::{RewriteStrSettings, element, rewrite_str};
use maud::html;
use pulldown_cmark::{CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, html as md_html};
use slug::slugify;
use std::borrow::Cow;
use std::collections::HashSet;
use thiserror::Error;

/// The only `target` value the sanitizer lets through.
const LINK_TARGET: &str = "_blank";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("link rewriting failed: {0}")]
    Rewrite(String),
}

/// Renderer with a pre-built sanitizer policy.
///
/// Build once and share: rendering takes `&self` and the type is `Sync`, so
/// one instance serves all worker threads.
pub struct Renderer {
    sanitizer: AmmoniaBuilder<'static>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            sanitizer: build_sanitizer(),
        }
    }

    /// Markdown in, sanitized and link-rewritten HTML body out.
    pub fn render_body(&self, markdown: &str) -> Result<String, RenderError> {
        let unsafe_html = render_markdown(markdown);
        let clean = self.sanitize(&unsafe_html);
        rewrite_links(&clean)
    }

    pub fn sanitize(&self, html: &str) -> String {
        self.sanitizer.clean(html).to_string()
    }
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_DEFINITION_LIST
        | Options::ENABLE_SMART_PUNCTUATION
}

/// Render markdown to unsanitized HTML.
pub fn render_markdown(markdown: &str) -> String {
    let mut events: Vec<Event<'_>> = Parser::new_ext(markdown, markdown_options()).collect();
    assign_heading_ids(&mut events);

    let events = events.into_iter().map(|event| match event {
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            ..
        }) => Event::InlineHtml(open_link(link_type, &dest_url, &title).into()),
        Event::End(TagEnd::Link) => Event::InlineHtml("</a>".into()),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    md_html::push_html(&mut out, events);
    out
}

fn open_link(link_type: LinkType, dest: &str, title: &str) -> String {
    let scheme = if link_type == LinkType::Email { "mailto:" } else { "" };
    let mut tag = format!(r#"<a href="{scheme}{}""#, escape_attr(dest));
    if !title.is_empty() {
        tag.push_str(&format!(r#" title="{}""#, escape_attr(title)));
    }
    tag.push_str(&format!(r#" target="{LINK_TARGET}">"#));
    tag
}

/// Give every heading without an explicit id one derived from its text.
///
/// Explicit ids are reserved first, so an automatic id never repeats one
/// that appears later in the document.
fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut taken: HashSet<String> = events
        .iter()
        .filter_map(|event| match event {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect();

    for i in 0..events.len() {
        if !matches!(&events[i], Event::Start(Tag::Heading { id: None, .. })) {
            continue;
        }

        let base = slugify(heading_text(&events[i + 1..]));
        if base.is_empty() {
            continue;
        }
        let mut candidate = base.clone();
        let mut n = 0;
        while taken.contains(&candidate) {
            n += 1;
            candidate = format!("{base}-{n}");
        }
        taken.insert(candidate.clone());

        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(candidate));
        }
    }
}

/// Concatenated text of a heading, given the events right after its start.
fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}

fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    for heading in ["h1", "h2", "h3", "h4", "h5", "h6"] {
        builder.add_tag_attributes(heading, &["id"]);
    }
    builder.add_tags(&["input"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);

    builder.add_tag_attributes("a", &["target"]);
    builder.attribute_filter(|element, attribute, value| {
        if element == "a" && attribute == "target" && value != LINK_TARGET {
            None
        } else {
            Some(Cow::Borrowed(value))
        }
    });

    builder
}

/// Point every `href` that targets a markdown file at its published page.
pub fn rewrite_links(html: &str) -> Result<String, RenderError> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("a[href]", |el| {
                if let Some(href) = el.get_attribute("href")
                    && let Some(mapped) = map_link_target(&href)
                {
                    el.set_attribute("href", &mapped)?;
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Rewrite(err.to_string()))
}

/// Mapped href, or `None` when the target is not a local markdown file.
fn map_link_target(href: &str) -> Option<String> {
    let (target, fragment) = match href.find('#') {
        Some(pos) => href.split_at(pos),
        None => (href, ""),
    };
    if !target.ends_with(MARKUP_EXTENSION) || target.contains("://") {
        return None;
    }
    Some(format!("{}{fragment}", map_path(target)))
}

/// Escape text for use inside a double-quoted attribute.
fn escape_attr(s: &str) -> String {
    html! { (s) }.into_string()
}
