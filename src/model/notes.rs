//! Footnotes, endnotes, and comments.

use super::{Node, NodeKind, NoteReference};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Footnote,
    Endnote,
}

impl NoteType {
    /// The lowercase name, also the element local name (`w:footnote`).
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Footnote => "footnote",
            NoteType::Endnote => "endnote",
        }
    }
}

/// A footnote or endnote with its body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub note_type: NoteType,
    pub note_id: String,
    #[serde(default)]
    pub body: Vec<Node>,
}

impl Note {
    /// Lookup key of this note.
    pub fn key(&self) -> String {
        note_key(self.note_type, &self.note_id)
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Note
    }
}

fn note_key(note_type: NoteType, note_id: &str) -> String {
    format!("{}-{}", note_type.as_str(), note_id)
}

/// Notes indexed by `"{kind}-{id}"`.
///
/// Lookups never fail: an unknown reference resolves to `None`, which the
/// consumer renders as absent. Iteration and serialization follow key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notes {
    notes: BTreeMap<String, Note>,
}

impl Notes {
    /// Index notes by key; later duplicates replace earlier ones.
    pub fn new(notes: impl IntoIterator<Item = Note>) -> Self {
        let notes = notes.into_iter().map(|note| (note.key(), note)).collect();
        Self { notes }
    }

    /// Resolve a body reference to its note.
    pub fn resolve(&self, reference: &NoteReference) -> Option<&Note> {
        self.find_note_by_key(&note_key(reference.note_type, &reference.note_id))
    }

    /// Find a note by its `"{kind}-{id}"` key.
    pub fn find_note_by_key(&self, key: &str) -> Option<&Note> {
        self.notes.get(key)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Iterate over the notes in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }
}

/// A comment attached to a range of the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: String,

    #[serde(default)]
    pub body: Vec<Node>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_initials: Option<String>,

    /// Date as written in the part (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Comment {
    pub fn kind(&self) -> NodeKind {
        NodeKind::Comment
    }
}
