//! html handling for fetched wiki pages.
//!
//! Three steps live here: harvesting outbound links from the raw page,
//! stripping scripts and template chrome from it, and pulling the normalized
//! article text out of the `bodyContent` element of what remains.
use super::normalize_link;
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{Html, Node, Selector};
use std::collections::HashSet;
use tracing::trace;

/// Scripts and embedded content, followed by the wiki template's chrome
/// (navigation, headings, lists and tables).
static FORBIDDEN: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "script, style, noscript, template, iframe, object, embed, link, meta, base, \
         nav, footer, header, h1, h2, h3, h4, h5, h6, ul, ol, li, table",
    )
    .unwrap()
});

static BODY_CONTENT: Lazy<Selector> = Lazy::new(|| Selector::parse("#bodyContent").unwrap());
static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Escape sequences that survive in wiki markup as literal text. The three
/// character forms go first so no stray backslash is left behind.
const ESCAPED_WHITESPACE: [&str; 4] = ["\\\\n", "\\\\t", "\\n", "\\t"];

/// Returns every http(s) link on the page, resolved against `base`, in
/// document order and without duplicates.
pub fn extract_links(raw_html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(raw_html);
    let mut seen = HashSet::new();
    document
        .select(&ANCHORS)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| normalize_link(base, href))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Removes scripts, styles, inline handlers and template chrome from a page.
///
/// Elements are detached from the parsed tree, never cut out of the text, so
/// nesting depth does not matter. Malformed markup is repaired by the parser
/// and whatever it recovered is returned.
pub fn sanitize(raw_html: &str) -> String {
    let mut document = Html::parse_document(raw_html);
    if !document.errors.is_empty() {
        trace!("recovered from {} html parse errors", document.errors.len());
    }
    let doomed: Vec<_> = document.select(&FORBIDDEN).map(|el| el.id()).collect();
    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
    let elements: Vec<_> = document
        .tree
        .nodes()
        .filter(|node| node.value().is_element())
        .map(|node| node.id())
        .collect();
    for id in elements {
        if let Some(mut node) = document.tree.get_mut(id) {
            if let Node::Element(element) = node.value() {
                let attrs = std::mem::take(&mut element.attrs);
                element.attrs = attrs
                    .into_iter()
                    .filter(|(name, value)| !is_script_attr(&name.local, value))
                    .collect();
            }
        }
    }
    document.html()
}

/// Collects the text under `#bodyContent` as a single normalized line.
///
/// A page without that element yields an empty string; the item pipeline
/// decides what to do with it.
pub fn extract_text(clean_html: &str) -> String {
    let document = Html::parse_document(clean_html);
    let joined = document
        .select(&BODY_CONTENT)
        .flat_map(|el| el.text())
        .collect::<Vec<_>>()
        .join(" ");
    normalize_text(&joined)
}

/// Double quotes become single quotes, escaped newlines and tabs disappear,
/// and every whitespace run (control characters included) collapses to one
/// space.
pub fn normalize_text(text: &str) -> String {
    let mut text = text.replace('"', "'");
    for escaped in ESCAPED_WHITESPACE {
        text = text.replace(escaped, "");
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_script_attr(name: &str, value: &str) -> bool {
    name.to_ascii_lowercase().starts_with("on")
        || value
            .trim_start()
            .to_ascii_lowercase()
            .starts_with("javascript:")
}
