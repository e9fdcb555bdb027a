//! Attaches person-page links to the labels of a rendered SVG.
//!
//! Every person label is emitted together with a transparent twin whose text
//! is the person ID, at the same `(x, y)` anchor. The twins are removed and
//! each label sharing an anchor with one is wrapped in
//! `<a xlink:href="{site_url}/{id}.html">`.
//!
//! The join is keyed on the anchor coordinates as printed. Two unrelated
//! texts at the same anchor would collide.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

use crate::render::{HIDDEN_TEXT_STYLE, escape_xml, unescape_xml};

static TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<text\b([^>]*)>(.*?)</text>").unwrap());
static X_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\sx="([^"]*)""#).unwrap());
static Y_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\sy="([^"]*)""#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Anchor {
    x: String,
    y: String,
}

struct TextLine<'a> {
    anchor: Anchor,
    hidden: bool,
    content: &'a str,
}

fn parse_text_line(line: &str) -> Option<TextLine<'_>> {
    let caps = TEXT_RE.captures(line)?;
    let attrs = caps.get(1)?.as_str();
    let x = X_RE.captures(attrs)?.get(1)?.as_str();
    let y = Y_RE.captures(attrs)?.get(1)?.as_str();
    Some(TextLine {
        anchor: Anchor {
            x: x.to_string(),
            y: y.to_string(),
        },
        hidden: attrs.contains(HIDDEN_TEXT_STYLE),
        content: caps.get(2)?.as_str(),
    })
}

/// Rewrites `svg` so that labels link to `{site_url}/{person_id}.html`.
///
/// Lines that are not text elements, or whose coordinates cannot be read,
/// pass through unchanged.
pub fn link_person_labels(svg: &str, site_url: &str) -> String {
    let site_url = site_url.trim_end_matches('/');
    let mut ids: HashMap<Anchor, String> = HashMap::new();
    let mut kept = Vec::new();

    for line in svg.lines() {
        match parse_text_line(line) {
            Some(text) if text.hidden => {
                ids.insert(text.anchor, unescape_xml(text.content));
            }
            _ => kept.push(line),
        }
    }

    let mut out = String::with_capacity(svg.len());
    let mut linked = 0usize;
    for line in kept {
        let id = parse_text_line(line)
            .filter(|text| !text.hidden)
            .and_then(|text| ids.get(&text.anchor));
        match id {
            Some(id) => {
                let href = escape_xml(&format!("{site_url}/{id}.html"));
                out.push_str(&format!(
                    "<a xlink:href=\"{href}\" target=\"_parent\">{line}</a>\n"
                ));
                linked += 1;
            }
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    debug!(linked, anchors = ids.len(), "person labels linked");
    out
}
