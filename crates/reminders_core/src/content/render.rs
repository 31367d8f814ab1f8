//! Read-only projections of canonical ENML.
//!
//! # Responsibility
//! - Render ENML as HTML (display) or XHTML rich text (editing).
//! - Flatten ENML to plain text for previews and search.
//!
//! # Invariants
//! - Projections are pure functions of `(enml, context_id, render_width)`.
//! - Rich text keeps enough marker data for `html_to_enml` to rebuild
//!   `en-media` and `en-todo` elements.

use crate::content::markup::{
    attr, resource_url, tokens, MarkupWriter, Token, EN_MEDIA, EN_NOTE, EN_TODO, NO_ATTRS,
    TODO_CHECKED_SRC, TODO_ID_PREFIX, TODO_UNCHECKED_SRC,
};
use once_cell::sync::Lazy;
use regex::Regex;

static INLINE_WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\r\n]+").expect("valid whitespace regex"));
static BLANK_LINES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank lines regex"));

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "blockquote", "caption", "center", "dd", "div", "dl", "dt", "h1", "h2", "h3",
    "h4", "h5", "h6", "hr", "li", "ol", "p", "pre", "table", "tr", "ul",
];

/// Which editor-facing projection to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Projection {
    /// Read-only HTML; todos become checkbox inputs.
    Html,
    /// Editable rich text; todos become images so editors keep them inline.
    RichText,
}

/// Renders ENML as an HTML document.
pub(crate) fn render_html(
    enml: &str,
    context_id: &str,
    render_width: Option<u32>,
    projection: Projection,
) -> String {
    let mut writer = MarkupWriter::html();
    writer.start("html", NO_ATTRS);
    writer.start("head", NO_ATTRS);
    writer.empty(
        "meta",
        [
            ("http-equiv", "Content-Type"),
            ("content", "text/html; charset=utf-8"),
        ],
    );
    writer.end();

    let mut in_note = false;
    let mut saw_note = false;
    let mut todo_index = 0usize;

    for token in tokens(enml) {
        match token {
            Token::Start { name, attrs } => {
                if !in_note {
                    if name == EN_NOTE && !saw_note {
                        writer.start("body", attrs);
                        in_note = true;
                        saw_note = true;
                    }
                    continue;
                }
                match name.as_str() {
                    EN_MEDIA => writer.start("img", media_attrs(&attrs, context_id, render_width)),
                    EN_TODO => {
                        let checked = attr(&attrs, "checked").is_some_and(|v| v == "true");
                        let id = format!("{TODO_ID_PREFIX}{todo_index}");
                        todo_index += 1;
                        write_todo(&mut writer, &id, checked, projection);
                    }
                    _ => writer.start(&name, attrs),
                }
            }
            Token::Text(text) => {
                if in_note {
                    writer.text(&text);
                }
            }
            Token::End { name } => {
                if !in_note {
                    continue;
                }
                writer.end();
                if name == EN_NOTE {
                    in_note = false;
                }
            }
        }
    }

    if !saw_note {
        writer.start("body", NO_ATTRS);
    }
    writer.finish()
}

fn media_attrs(
    attrs: &[(String, String)],
    context_id: &str,
    render_width: Option<u32>,
) -> Vec<(String, String)> {
    let hash = attr(attrs, "hash").unwrap_or_default();
    let mime_type = attr(attrs, "type").unwrap_or_default();
    let mut rendered: Vec<(String, String)> = attrs.to_vec();
    rendered.push(("src".to_string(), resource_url(context_id, hash, mime_type)));
    if let Some(width) = render_width {
        if attr(attrs, "style").is_none() {
            rendered.push(("style".to_string(), format!("max-width: {width}px")));
        }
    }
    rendered
}

fn write_todo(writer: &mut MarkupWriter, id: &str, checked: bool, projection: Projection) {
    match projection {
        Projection::RichText => {
            let src = if checked {
                TODO_CHECKED_SRC
            } else {
                TODO_UNCHECKED_SRC
            };
            writer.start("img", [("src", src), ("id", id)]);
        }
        Projection::Html => {
            if checked {
                writer.start(
                    "input",
                    [("type", "checkbox"), ("id", id), ("checked", "checked")],
                );
            } else {
                writer.start("input", [("type", "checkbox"), ("id", id)]);
            }
        }
    }
}

/// Flattens ENML to plain text.
///
/// Block elements end a line, `br` breaks one, todos render as `[x]`/`[ ]`.
/// Runs of whitespace outside `pre` collapse to one space and at most one
/// blank line is kept between blocks.
pub(crate) fn render_plaintext(enml: &str) -> String {
    let mut out = String::new();
    let mut in_note = false;
    let mut pre_depth = 0usize;

    for token in tokens(enml) {
        match token {
            Token::Start { name, attrs } => {
                if !in_note {
                    in_note = name == EN_NOTE;
                    continue;
                }
                match name.as_str() {
                    "br" => out.push('\n'),
                    "pre" => pre_depth += 1,
                    EN_TODO => {
                        let checked = attr(&attrs, "checked").is_some_and(|v| v == "true");
                        out.push_str(if checked { "[x] " } else { "[ ] " });
                    }
                    "td" | "th" => {
                        if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                            out.push(' ');
                        }
                    }
                    _ => {}
                }
            }
            Token::Text(text) => {
                if !in_note {
                    continue;
                }
                if pre_depth > 0 {
                    out.push_str(&text);
                } else {
                    out.push_str(&INLINE_WHITESPACE_RE.replace_all(&text, " "));
                }
            }
            Token::End { name } => {
                if !in_note {
                    continue;
                }
                if name == EN_NOTE {
                    break;
                }
                if name == "pre" {
                    pre_depth = pre_depth.saturating_sub(1);
                }
                if BLOCK_ELEMENTS.contains(&name.as_str()) && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }

    let lines: Vec<&str> = out.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    BLANK_LINES_RE
        .replace_all(joined.trim(), "\n\n")
        .into_owned()
}
