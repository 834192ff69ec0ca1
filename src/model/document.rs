//! Document model root.

use super::node::write_raw_text;
use super::{Comment, Node, NodeKind, Notes};
use serde::{Deserialize, Serialize};

/// A parsed word-processing document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Body content in document order
    #[serde(default)]
    pub children: Vec<Node>,

    /// Footnotes and endnotes referenced from the body
    #[serde(default)]
    pub notes: Notes,

    /// Comments in declaration order
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Document {
    /// Create a document with the given body.
    pub fn new(children: Vec<Node>, notes: Notes, comments: Vec<Comment>) -> Self {
        Self {
            children,
            notes,
            comments,
        }
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Document
    }

    /// Find a comment by ID.
    pub fn find_comment(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.comment_id == comment_id)
    }

    /// Check if the body is empty.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Extract the body's raw text. Each paragraph is followed by a blank line.
    pub fn raw_text(&self) -> String {
        let mut text = String::new();
        for node in &self.children {
            write_raw_text(node, &mut text);
        }
        text
    }
}
