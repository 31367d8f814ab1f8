//! Note content model.
//!
//! # Responsibility
//! - Own the canonical ENML source of one note body.
//! - Derive HTML, rich-text and plaintext projections on demand.
//! - Apply structural edits (insert, attach, todo toggle) to the source.
//!
//! # Invariants
//! - ENML is the only stored form; projections are never cached.
//! - `tagline` equals the first [`TAGLINE_LENGTH`] characters of the
//!   plaintext projection after every mutation.
//! - `render_width` never touches the canonical source.
//!
//! # See also
//! - `canonicalize` for the markup to ENML transform.

mod canonicalize;
mod edit;
mod markup;
mod render;

pub use canonicalize::{html_to_enml, is_supported_tag, SUPPORTED_TAGS};
pub use markup::{resource_url, EN_CRYPT, EN_MEDIA, EN_NOTE, EN_TODO, ENML_HEADER};

use crate::content::edit::{insert_at, set_todo_checked, Insertion};
use crate::content::markup::TODO_ID_RE;
use crate::content::render::{render_html, render_plaintext, Projection};

/// Number of plaintext characters kept as the note tagline.
pub const TAGLINE_LENGTH: usize = 100;

/// Canonical ENML document plus its cached tagline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnmlDocument {
    enml: String,
    tagline: String,
    render_width: Option<u32>,
}

impl EnmlDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from canonical ENML.
    pub fn from_enml(enml: impl Into<String>) -> Self {
        let mut document = Self::default();
        document.set_enml(enml);
        document
    }

    pub fn enml(&self) -> &str {
        &self.enml
    }

    /// Replaces the canonical source.
    ///
    /// Returns `false` without touching anything when the value is unchanged.
    pub fn set_enml(&mut self, enml: impl Into<String>) -> bool {
        let enml = enml.into();
        if enml == self.enml {
            return false;
        }
        self.enml = enml;
        self.refresh_tagline();
        true
    }

    /// Read-only HTML projection.
    pub fn to_html(&self, context_id: &str) -> String {
        render_html(&self.enml, context_id, self.render_width, Projection::Html)
    }

    /// Editable XHTML projection; feed edits back through [`Self::set_rich_text`].
    pub fn to_rich_text(&self, context_id: &str) -> String {
        render_html(&self.enml, context_id, self.render_width, Projection::RichText)
    }

    pub fn to_plaintext(&self) -> String {
        render_plaintext(&self.enml)
    }

    /// Canonicalizes editor markup and stores it as the new source.
    pub fn set_rich_text(&mut self, rich_text: &str) -> bool {
        self.set_enml(html_to_enml(rich_text))
    }

    pub fn insert_text(&mut self, position: usize, text: &str) {
        self.apply(position, Insertion::Text(text));
    }

    pub fn insert_link(&mut self, position: usize, url: &str) {
        self.apply(position, Insertion::Link(url));
    }

    /// Embeds an `en-media` reference to an already stored resource.
    pub fn attach_file(&mut self, position: usize, hash: &str, mime_type: &str) {
        self.apply(position, Insertion::Media { hash, mime_type });
    }

    /// Sets the checked state of the todo identified by `id`.
    ///
    /// `id` is the rendered marker id (`en-todo-3`) or its bare ordinal.
    /// Returns `false` for unknown ids or when nothing changed.
    pub fn mark_todo(&mut self, id: &str, checked: bool) -> bool {
        let Some(ordinal) = TODO_ID_RE
            .captures(id.trim())
            .and_then(|caps| caps.get(1))
            .and_then(|value| value.as_str().parse::<usize>().ok())
        else {
            return false;
        };
        match set_todo_checked(&self.enml, ordinal, checked) {
            Some(enml) => self.set_enml(enml),
            None => false,
        }
    }

    pub fn render_width(&self) -> Option<u32> {
        self.render_width
    }

    /// Returns `true` when the hint changed.
    pub fn set_render_width(&mut self, render_width: Option<u32>) -> bool {
        if self.render_width == render_width {
            return false;
        }
        self.render_width = render_width;
        true
    }

    pub fn tagline(&self) -> &str {
        &self.tagline
    }

    /// Seeds the tagline persisted next to note metadata before the content
    /// itself is loaded.
    pub(crate) fn restore_tagline(&mut self, tagline: impl Into<String>) {
        self.tagline = tagline.into();
    }

    fn apply(&mut self, position: usize, insertion: Insertion<'_>) {
        let enml = insert_at(&self.enml, position, insertion);
        self.set_enml(enml);
    }

    fn refresh_tagline(&mut self) {
        self.tagline = derive_tagline(&self.to_plaintext());
    }
}

/// Truncates plaintext to the tagline length.
pub fn derive_tagline(plaintext: &str) -> String {
    plaintext.chars().take(TAGLINE_LENGTH).collect()
}

#[cfg(test)]
mod tests {
    use super::{derive_tagline, EnmlDocument, ENML_HEADER, TAGLINE_LENGTH};

    fn note(body: &str) -> String {
        format!("{ENML_HEADER}<en-note>{body}</en-note>")
    }

    #[test]
    fn set_enml_reports_unchanged_values() {
        let mut document = EnmlDocument::new();
        assert!(document.set_enml(note("<div>a</div>")));
        assert!(!document.set_enml(note("<div>a</div>")));
        assert_eq!(document.tagline(), "a");
    }

    #[test]
    fn tagline_tracks_every_edit() {
        let mut document = EnmlDocument::from_enml(note("<div>hello</div>"));
        document.insert_text(5, " world");
        assert_eq!(document.tagline(), "hello world");
        document.insert_link(0, "https://a.b");
        assert_eq!(document.tagline(), "https://a.bhello world");
        assert_eq!(document.tagline(), derive_tagline(&document.to_plaintext()));
    }

    #[test]
    fn tagline_is_capped() {
        let long = "x".repeat(TAGLINE_LENGTH * 2);
        let document = EnmlDocument::from_enml(note(&format!("<div>{long}</div>")));
        assert_eq!(document.tagline().chars().count(), TAGLINE_LENGTH);
    }

    #[test]
    fn rich_text_roundtrips_to_equivalent_enml() {
        let source = note(
            "<div><b>Shopping</b></div><div><en-todo checked=\"true\"/>milk</div>\
             <en-media hash=\"0123abcd\" type=\"image/png\"/><en-crypt>c2VjcmV0</en-crypt>",
        );
        let mut document = EnmlDocument::from_enml(source.clone());
        document.set_render_width(Some(200));
        let rich = document.to_rich_text("note-1");
        assert!(!document.set_rich_text(&rich));
        assert_eq!(document.enml(), source);
    }

    #[test]
    fn mark_todo_accepts_marker_ids_and_ordinals() {
        let mut document = EnmlDocument::from_enml(note("<en-todo/>a<en-todo/>b"));
        assert!(document.mark_todo("en-todo-1", true));
        assert_eq!(document.tagline(), "[ ] a[x] b");
        assert!(document.mark_todo("0", true));
        assert!(!document.mark_todo("0", true));
        assert!(!document.mark_todo("en-todo-7", true));
        assert!(!document.mark_todo("bogus", true));
    }

    #[test]
    fn render_width_only_affects_projections() {
        let mut document =
            EnmlDocument::from_enml(note("<en-media hash=\"ab\" type=\"image/png\"/>"));
        let before = document.enml().to_string();
        assert!(document.set_render_width(Some(640)));
        assert!(!document.set_render_width(Some(640)));
        assert!(document.to_html("n").contains("max-width: 640px"));
        assert_eq!(document.enml(), before);
    }
}
