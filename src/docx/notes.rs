//! Footnote, endnote, and comment parts.

use crate::model::{Comment, Note, NoteType};
use crate::xml::XmlElement;

use super::body::{BodyContext, BodyReader};

/// Items read from a notes or comments part plus body warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct PartItems<T> {
    pub items: Vec<T>,
    pub warnings: Vec<String>,
}

impl<T> Default for PartItems<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Read every footnote or endnote of a notes part.
///
/// Separator and continuation-separator notes are layout artefacts and are
/// skipped.
pub fn read_notes(
    root: &XmlElement,
    note_type: NoteType,
    body_reader: &dyn BodyReader,
    context: &BodyContext,
) -> PartItems<Note> {
    let tag = format!("w:{}", note_type.as_str());
    let mut output = PartItems::default();

    for element in root.child_elements().filter(|e| e.name == tag) {
        if matches!(
            element.attribute("w:type"),
            Some("separator" | "continuationSeparator")
        ) {
            continue;
        }
        let Some(note_id) = element.attribute("w:id") else {
            output
                .warnings
                .push(format!("A {} without w:id was ignored", note_type.as_str()));
            continue;
        };

        let body = body_reader.read_body(context, &element.children);
        output.warnings.extend(body.warnings);
        output.items.push(Note {
            note_type,
            note_id: note_id.to_string(),
            body: body.nodes,
        });
    }
    output
}

/// Read every comment of a comments part, in declaration order.
pub fn read_comments(
    root: &XmlElement,
    body_reader: &dyn BodyReader,
    context: &BodyContext,
) -> PartItems<Comment> {
    let mut output = PartItems::default();

    for element in root.child_elements().filter(|e| e.name == "w:comment") {
        let Some(comment_id) = element.attribute("w:id") else {
            output
                .warnings
                .push("A comment without w:id was ignored".to_string());
            continue;
        };
        let optional = |name: &str| {
            element
                .attribute(name)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let body = body_reader.read_body(context, &element.children);
        output.warnings.extend(body.warnings);
        output.items.push(Comment {
            comment_id: comment_id.to_string(),
            body: body.nodes,
            author_name: optional("w:author"),
            author_initials: optional("w:initials"),
            date: optional("w:date"),
        });
    }
    output
}
