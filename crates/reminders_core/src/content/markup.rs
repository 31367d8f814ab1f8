//! Streaming markup primitives shared by the ENML transforms.
//!
//! # Responsibility
//! - Turn XML/XHTML input into a flat stream of owned tokens.
//! - Write well-formed markup back out, closing whatever is still open.
//!
//! # Invariants
//! - Tokenizing never fails: a parse error ends the stream after logging.
//! - `MarkupWriter::finish` always returns balanced markup.

use log::{debug, warn};
use once_cell::sync::Lazy;
use quick_xml::escape::{escape, partial_escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

/// XML declaration plus ENML doctype written in front of every canonical document.
pub const ENML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<!DOCTYPE en-note SYSTEM \"http://xml.evernote.com/pub/enml2.dtd\">";

/// Root element of canonical note content.
pub const EN_NOTE: &str = "en-note";
pub const EN_MEDIA: &str = "en-media";
pub const EN_TODO: &str = "en-todo";
pub const EN_CRYPT: &str = "en-crypt";

/// `src` used for rendered todo markers.
pub(crate) const TODO_CHECKED_SRC: &str = "todo://checked";
pub(crate) const TODO_UNCHECKED_SRC: &str = "todo://unchecked";
pub(crate) const TODO_ID_PREFIX: &str = "en-todo-";

pub(crate) static TODO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:en-todo-)?(\d+)$").expect("valid todo id regex"));
pub(crate) static RESOURCE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^resource://[^/?]+/([0-9A-Za-z]+)(?:\?(.*))?$").expect("valid resource url regex")
});
pub(crate) static RENDER_STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^max-width: \d+px$").expect("valid render style regex"));

const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "br", "col", "hr", "img", "input", "meta", "wbr",
];

/// One owned markup event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    End {
        name: String,
    },
    Text(String),
}

/// Token stream over a markup string.
///
/// Empty elements (`<br/>`) are reported as a `Start` immediately followed by
/// an `End`, so consumers only deal with one shape.
pub(crate) struct Tokens<'a> {
    reader: Reader<&'a [u8]>,
    done: bool,
}

pub(crate) fn tokens(markup: &str) -> Tokens<'_> {
    let mut reader = Reader::from_str(markup);
    reader.expand_empty_elements(true);
    Tokens {
        reader,
        done: false,
    }
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        while !self.done {
            match self.reader.read_event() {
                Ok(Event::Start(start)) => return Some(start_token(&start)),
                Ok(Event::End(end)) => {
                    return Some(Token::End {
                        name: element_name(end.name().as_ref()),
                    })
                }
                Ok(Event::Text(text)) => {
                    let raw = String::from_utf8_lossy(&text);
                    return Some(Token::Text(unescape_lenient(&raw)));
                }
                Ok(Event::CData(data)) => {
                    return Some(Token::Text(String::from_utf8_lossy(&data).into_owned()))
                }
                Ok(Event::Eof) => self.done = true,
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        "event=markup_parse module=content status=error position={} error={}",
                        self.reader.buffer_position(),
                        err
                    );
                    self.done = true;
                }
            }
        }
        None
    }
}

fn start_token(start: &BytesStart<'_>) -> Token {
    let attrs = start
        .attributes()
        .with_checks(false)
        .filter_map(Result::ok)
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = unescape_lenient(&String::from_utf8_lossy(&attr.value));
            (key, value)
        })
        .collect();

    Token::Start {
        name: element_name(start.name().as_ref()),
        attrs,
    }
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

/// Resolves character and HTML5 entity references.
///
/// An unknown reference stays literal text; the references around it are
/// still resolved, so the run is never escaped twice on the way back out.
pub(crate) fn unescape_lenient(raw: &str) -> String {
    match unescape(raw) {
        Ok(value) => value.into_owned(),
        Err(err) => {
            debug!(
                "event=markup_unescape module=content status=skip error={}",
                err
            );
            unescape_each(raw)
        }
    }
}

fn unescape_each(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let resolved = candidate
            .find(';')
            .map(|end| &candidate[..=end])
            .and_then(|reference| Some((reference.len(), unescape(reference).ok()?)));
        match resolved {
            Some((length, value)) => {
                out.push_str(&value);
                rest = &candidate[length..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Returns the value of attribute `key`, if present.
pub(crate) fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| value.as_str())
}

/// Builds the URL an embedded resource is rendered with.
pub fn resource_url(context_id: &str, hash: &str, mime_type: &str) -> String {
    format!("resource://{context_id}/{hash}?type={mime_type}")
}

/// Extracts `(hash, type)` from a URL produced by [`resource_url`].
pub(crate) fn parse_resource_url(url: &str) -> Option<(String, Option<String>)> {
    let caps = RESOURCE_URL_RE.captures(url)?;
    let hash = caps.get(1)?.as_str().to_string();
    let mime_type = caps.get(2).and_then(|query| {
        query
            .as_str()
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "type")
            .map(|(_, value)| value.to_string())
    });
    Some((hash, mime_type))
}

/// Output flavour: XML collapses every empty element, HTML only void ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    Xml,
    Html,
}

/// Minimal markup writer tracking open elements.
pub(crate) struct MarkupWriter {
    out: String,
    open: Vec<String>,
    start_pending: bool,
    dialect: Dialect,
}

impl MarkupWriter {
    /// Writer for canonical ENML, pre-filled with [`ENML_HEADER`].
    pub(crate) fn enml() -> Self {
        Self {
            out: String::from(ENML_HEADER),
            open: Vec::new(),
            start_pending: false,
            dialect: Dialect::Xml,
        }
    }

    pub(crate) fn html() -> Self {
        Self {
            out: String::new(),
            open: Vec::new(),
            start_pending: false,
            dialect: Dialect::Html,
        }
    }

    pub(crate) fn start<K, V>(&mut self, name: &str, attrs: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.close_pending_start();
        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attrs {
            self.out.push(' ');
            self.out.push_str(key.as_ref());
            self.out.push_str("=\"");
            self.out.push_str(&escape(value.as_ref()));
            self.out.push('"');
        }
        self.open.push(name.to_string());
        self.start_pending = true;
    }

    /// Closes the innermost open element. No-op when nothing is open.
    pub(crate) fn end(&mut self) {
        let Some(name) = self.open.pop() else {
            return;
        };
        if self.start_pending {
            self.start_pending = false;
            let collapse = match self.dialect {
                Dialect::Xml => true,
                Dialect::Html => HTML_VOID_ELEMENTS.contains(&name.as_str()),
            };
            if collapse {
                self.out.push_str("/>");
                return;
            }
            self.out.push('>');
        }
        self.out.push_str("</");
        self.out.push_str(&name);
        self.out.push('>');
    }

    pub(crate) fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.close_pending_start();
        self.out.push_str(&partial_escape(text));
    }

    /// Writes one empty element.
    pub(crate) fn empty<K, V>(&mut self, name: &str, attrs: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.start(name, attrs);
        self.end();
    }

    pub(crate) fn depth(&self) -> usize {
        self.open.len()
    }

    /// Closes every open element and returns the markup.
    pub(crate) fn finish(mut self) -> String {
        while !self.open.is_empty() {
            self.end();
        }
        self.out
    }

    fn close_pending_start(&mut self) {
        if self.start_pending {
            self.out.push('>');
            self.start_pending = false;
        }
    }
}

pub(crate) const NO_ATTRS: [(&str, &str); 0] = [];

#[cfg(test)]
mod tests {
    use super::{
        parse_resource_url, resource_url, tokens, unescape_lenient, MarkupWriter, Token, NO_ATTRS,
    };

    #[test]
    fn tokens_expand_empty_elements_and_resolve_entities() {
        let collected: Vec<Token> = tokens("<p>a&nbsp;b<br/></p>").collect();
        assert_eq!(
            collected,
            vec![
                Token::Start {
                    name: "p".to_string(),
                    attrs: vec![],
                },
                Token::Text("a\u{a0}b".to_string()),
                Token::Start {
                    name: "br".to_string(),
                    attrs: vec![],
                },
                Token::End {
                    name: "br".to_string(),
                },
                Token::End {
                    name: "p".to_string(),
                },
            ]
        );
    }

    #[test]
    fn unescape_resolves_html_entities_and_keeps_unknown_ones_literal() {
        assert_eq!(unescape_lenient("caf&eacute; &amp; bar"), "caf\u{e9} & bar");
        assert_eq!(unescape_lenient("&#x41;&hellip;"), "A\u{2026}");
        assert_eq!(
            unescape_lenient("&bogus; &amp; &lt;b&gt; & x"),
            "&bogus; & <b> & x"
        );
    }

    #[test]
    fn tokens_stop_at_malformed_markup() {
        let collected: Vec<Token> = tokens("<p>ok</div><p>lost</p>").collect();
        assert!(collected.contains(&Token::Text("ok".to_string())));
        assert!(!collected.contains(&Token::Text("lost".to_string())));
    }

    #[test]
    fn writer_closes_open_elements_and_collapses_empty_ones() {
        let mut writer = MarkupWriter::html();
        writer.start("div", [("class", "a\"b")]);
        writer.empty("br", NO_ATTRS);
        writer.start("span", NO_ATTRS);
        writer.text("x < y");
        let html = writer.finish();
        assert_eq!(
            html,
            "<div class=\"a&quot;b\"><br/><span>x &lt; y</span></div>"
        );
    }

    #[test]
    fn resource_url_roundtrips_hash_and_type() {
        let url = resource_url("note-1", "abc123", "image/png");
        let (hash, mime) = parse_resource_url(&url).expect("url should parse");
        assert_eq!(hash, "abc123");
        assert_eq!(mime.as_deref(), Some("image/png"));
        assert!(parse_resource_url("http://example.com/a.png").is_none());
    }
}
