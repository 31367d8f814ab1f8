//! Structural edits on canonical ENML.
//!
//! Positions count the characters of the note's text runs; each embedded
//! object (`br`, `img`, `en-media`, `en-todo`) counts as one character, the
//! same way rich-text editors place an object replacement character.

use crate::content::markup::{
    tokens, MarkupWriter, Token, EN_MEDIA, EN_NOTE, EN_TODO, NO_ATTRS,
};

const OBJECT_ELEMENTS: &[&str] = &["br", "img", EN_MEDIA, EN_TODO];

/// Markup inserted by [`insert_at`].
#[derive(Debug, Clone, Copy)]
pub(crate) enum Insertion<'a> {
    /// Plain text; newlines become `br`.
    Text(&'a str),
    /// Anchor whose label is the URL itself.
    Link(&'a str),
    /// Embedded resource reference.
    Media { hash: &'a str, mime_type: &'a str },
}

/// Returns `enml` with `insertion` placed at `position`.
///
/// Positions past the end append to the note. A source without `en-note`
/// gets one.
pub(crate) fn insert_at(enml: &str, position: usize, insertion: Insertion<'_>) -> String {
    let mut writer = MarkupWriter::enml();
    let mut remaining = position;
    let mut inserted = false;
    let mut in_note = false;
    let mut closed = false;

    for token in tokens(enml) {
        match token {
            Token::Start { name, attrs } => {
                if !in_note {
                    if name == EN_NOTE {
                        writer.start(EN_NOTE, attrs);
                        in_note = true;
                    }
                    continue;
                }
                if !inserted && OBJECT_ELEMENTS.contains(&name.as_str()) {
                    if remaining == 0 {
                        write_insertion(&mut writer, insertion);
                        inserted = true;
                    } else {
                        remaining -= 1;
                    }
                }
                writer.start(&name, attrs);
            }
            Token::Text(text) => {
                if !in_note {
                    continue;
                }
                if inserted {
                    writer.text(&text);
                    continue;
                }
                let length = text.chars().count();
                if remaining <= length {
                    let split = text
                        .char_indices()
                        .nth(remaining)
                        .map(|(offset, _)| offset)
                        .unwrap_or(text.len());
                    writer.text(&text[..split]);
                    write_insertion(&mut writer, insertion);
                    writer.text(&text[split..]);
                    inserted = true;
                } else {
                    remaining -= length;
                    writer.text(&text);
                }
            }
            Token::End { name } => {
                if !in_note {
                    continue;
                }
                if name == EN_NOTE && writer.depth() == 1 {
                    if !inserted {
                        write_insertion(&mut writer, insertion);
                        inserted = true;
                    }
                    writer.end();
                    closed = true;
                    break;
                }
                writer.end();
            }
        }
    }

    if !closed {
        if !in_note {
            writer.start(EN_NOTE, NO_ATTRS);
        }
        if !inserted {
            // Malformed source: the insertion lands wherever the stream stopped.
            write_insertion(&mut writer, insertion);
        }
    }
    writer.finish()
}

fn write_insertion(writer: &mut MarkupWriter, insertion: Insertion<'_>) {
    match insertion {
        Insertion::Text(text) => {
            for (index, line) in text.split('\n').enumerate() {
                if index > 0 {
                    writer.empty("br", NO_ATTRS);
                }
                writer.text(line);
            }
        }
        Insertion::Link(url) => {
            writer.start("a", [("href", url)]);
            writer.text(url);
            writer.end();
        }
        Insertion::Media { hash, mime_type } => {
            writer.empty(EN_MEDIA, [("hash", hash), ("type", mime_type)]);
        }
    }
}

/// Sets the `checked` state of the `ordinal`-th `en-todo`.
///
/// Returns `None` when the document has fewer todos.
pub(crate) fn set_todo_checked(enml: &str, ordinal: usize, checked: bool) -> Option<String> {
    let mut writer = MarkupWriter::enml();
    let mut in_note = false;
    let mut seen = 0usize;
    let mut found = false;

    for token in tokens(enml) {
        match token {
            Token::Start { name, mut attrs } => {
                if !in_note {
                    if name == EN_NOTE {
                        writer.start(EN_NOTE, attrs);
                        in_note = true;
                    }
                    continue;
                }
                if name == EN_TODO {
                    if seen == ordinal {
                        attrs.retain(|(key, _)| !key.eq_ignore_ascii_case("checked"));
                        if checked {
                            attrs.push(("checked".to_string(), "true".to_string()));
                        }
                        found = true;
                    }
                    seen += 1;
                }
                writer.start(&name, attrs);
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
                if name == EN_NOTE && writer.depth() == 0 {
                    break;
                }
            }
        }
    }

    found.then(|| writer.finish())
}

#[cfg(test)]
mod tests {
    use super::{insert_at, set_todo_checked, Insertion};
    use crate::content::markup::ENML_HEADER;

    fn note(body: &str) -> String {
        format!("{ENML_HEADER}<en-note>{body}</en-note>")
    }

    #[test]
    fn inserts_text_inside_a_text_run() {
        let enml = insert_at(&note("<div>Hello world</div>"), 5, Insertion::Text(","));
        assert_eq!(enml, note("<div>Hello, world</div>"));
    }

    #[test]
    fn counts_objects_as_one_character() {
        let source = note("<div><en-todo/>ab</div>");
        let enml = insert_at(&source, 2, Insertion::Text("X"));
        assert_eq!(enml, note("<div><en-todo/>aXb</div>"));
    }

    #[test]
    fn inserts_before_an_object_at_its_position() {
        let source = note("<div>ab<en-media hash=\"1\" type=\"image/png\"/></div>");
        let enml = insert_at(&source, 2, Insertion::Link("https://x.y"));
        assert_eq!(
            enml,
            note("<div>ab<a href=\"https://x.y\">https://x.y</a><en-media hash=\"1\" type=\"image/png\"/></div>")
        );
    }

    #[test]
    fn appends_past_the_end_and_converts_newlines() {
        let enml = insert_at(&note("<div>a</div>"), 99, Insertion::Text("b\nc"));
        assert_eq!(enml, note("<div>a</div>b<br/>c"));
    }

    #[test]
    fn creates_note_root_for_empty_source() {
        let enml = insert_at(
            "",
            0,
            Insertion::Media {
                hash: "abc",
                mime_type: "image/jpeg",
            },
        );
        assert_eq!(enml, note("<en-media hash=\"abc\" type=\"image/jpeg\"/>"));
    }

    #[test]
    fn toggles_the_requested_todo_only() {
        let source = note("<en-todo/>a<en-todo checked=\"true\"/>b");
        let checked = set_todo_checked(&source, 0, true).expect("todo 0 exists");
        assert_eq!(
            checked,
            note("<en-todo checked=\"true\"/>a<en-todo checked=\"true\"/>b")
        );
        let unchecked = set_todo_checked(&checked, 1, false).expect("todo 1 exists");
        assert_eq!(unchecked, note("<en-todo checked=\"true\"/>a<en-todo/>b"));
        assert!(set_todo_checked(&source, 2, true).is_none());
    }
}
