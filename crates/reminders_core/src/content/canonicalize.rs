//! Rich text / HTML to ENML canonicalization.
//!
//! # Responsibility
//! - Convert editor markup back into canonical ENML in one streaming pass.
//! - Map rendered media/todo markers back to `en-media` / `en-todo`.
//!
//! # Invariants
//! - Nothing before the opening `body` and nothing after its close is kept.
//! - Only elements in [`SUPPORTED_TAGS`] are emitted; other elements are
//!   unwrapped so their text survives.
//! - Malformed input never fails: output is cut at the parse error and closed.

use crate::content::markup::{
    attr, parse_resource_url, tokens, MarkupWriter, Token, EN_MEDIA, EN_NOTE, EN_TODO,
    NO_ATTRS, RENDER_STYLE_RE, TODO_CHECKED_SRC, TODO_ID_RE,
};

/// Elements allowed inside `en-note` (ENML 2 DTD).
pub const SUPPORTED_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "address", "area", "b", "bdo", "big", "blockquote", "br", "caption",
    "center", "cite", "code", "col", "colgroup", "dd", "del", "dfn", "div", "dl", "dt", "em",
    "en-crypt", "en-media", "en-todo", "font", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i",
    "img", "ins", "kbd", "li", "map", "ol", "p", "pre", "q", "s", "samp", "small", "span",
    "strike", "strong", "sub", "sup", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "tt",
    "u", "ul", "var",
];

pub fn is_supported_tag(name: &str) -> bool {
    SUPPORTED_TAGS.contains(&name)
}

/// Converts HTML-like markup into canonical ENML.
///
/// Input without a `body` element yields a bare ENML header.
pub fn html_to_enml(html: &str) -> String {
    let mut writer = MarkupWriter::enml();
    let mut in_body = false;
    // One entry per start tag seen inside body: whether it was written out.
    let mut emitted: Vec<bool> = Vec::new();

    for token in tokens(html) {
        match token {
            Token::Start { name, attrs } => {
                if !in_body {
                    if name == "body" {
                        writer.start(EN_NOTE, attrs);
                        in_body = true;
                    }
                    continue;
                }

                if let Some(marker) = rendered_marker(&name, &attrs) {
                    match marker {
                        Marker::Media(media_attrs) => writer.start(EN_MEDIA, media_attrs),
                        Marker::Todo { checked: true } => {
                            writer.start(EN_TODO, [("checked", "true")])
                        }
                        Marker::Todo { checked: false } => writer.start(EN_TODO, NO_ATTRS),
                    }
                    emitted.push(true);
                } else if is_supported_tag(&name) {
                    writer.start(&name, attrs);
                    emitted.push(true);
                } else {
                    emitted.push(false);
                }
            }
            Token::Text(text) => {
                if in_body {
                    writer.text(&text);
                }
            }
            Token::End { name } => {
                if name == "body" {
                    break;
                }
                if !in_body {
                    continue;
                }
                if emitted.pop() == Some(true) {
                    writer.end();
                }
            }
        }
    }

    writer.finish()
}

enum Marker {
    Media(Vec<(String, String)>),
    Todo { checked: bool },
}

/// Recognizes markup produced by the rich-text/HTML projections.
fn rendered_marker(name: &str, attrs: &[(String, String)]) -> Option<Marker> {
    if name != "img" && name != "input" {
        return None;
    }

    if attr(attrs, "id").is_some_and(|id| id.starts_with("en-todo") && TODO_ID_RE.is_match(id)) {
        let checked = if name == "img" {
            attr(attrs, "src") == Some(TODO_CHECKED_SRC)
        } else {
            attr(attrs, "checked").is_some_and(|value| value != "false")
        };
        return Some(Marker::Todo { checked });
    }

    if name != "img" {
        return None;
    }

    let from_url = attr(attrs, "src").and_then(parse_resource_url);
    let has_hash_attr = attr(attrs, "hash").is_some();
    if !has_hash_attr && from_url.is_none() {
        return None;
    }

    let mut media_attrs = Vec::with_capacity(attrs.len());
    if !has_hash_attr {
        if let Some((hash, mime_type)) = &from_url {
            media_attrs.push(("hash".to_string(), hash.clone()));
            if attr(attrs, "type").is_none() {
                if let Some(mime_type) = mime_type {
                    media_attrs.push(("type".to_string(), mime_type.clone()));
                }
            }
        }
    }
    for (key, value) in attrs {
        if key.eq_ignore_ascii_case("src") {
            continue;
        }
        if key.eq_ignore_ascii_case("style") && RENDER_STYLE_RE.is_match(value) {
            continue;
        }
        media_attrs.push((key.clone(), value.clone()));
    }
    Some(Marker::Media(media_attrs))
}
