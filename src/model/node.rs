//! Body-level document nodes.

use super::{NoteType, Paragraph, Run, Table};
use serde::{Deserialize, Serialize};

/// Every kind of node in the document model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Document,
    Paragraph,
    Run,
    Text,
    Tab,
    Hyperlink,
    NoteReference,
    Note,
    CommentReference,
    CommentRangeStart,
    CommentRangeEnd,
    Comment,
    Image,
    Table,
    TableRow,
    TableCell,
    Break,
    BookmarkStart,
}

impl NodeKind {
    /// The conventional camel-case name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Run => "run",
            NodeKind::Text => "text",
            NodeKind::Tab => "tab",
            NodeKind::Hyperlink => "hyperlink",
            NodeKind::NoteReference => "noteReference",
            NodeKind::Note => "note",
            NodeKind::CommentReference => "commentReference",
            NodeKind::CommentRangeStart => "commentRangeStart",
            NodeKind::CommentRangeEnd => "commentRangeEnd",
            NodeKind::Comment => "comment",
            NodeKind::Image => "image",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tableRow",
            NodeKind::TableCell => "tableCell",
            NodeKind::Break => "break",
            NodeKind::BookmarkStart => "bookmarkStart",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node that can appear in a body: the document, a note, a comment,
/// a table cell, or a paragraph/run/hyperlink container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    /// A paragraph
    Paragraph(Paragraph),
    /// A run of uniformly formatted content
    Run(Run),
    /// Literal text
    Text {
        /// The text content
        value: String,
    },
    /// A tab character
    Tab,
    /// A hyperlink wrapping its content
    Hyperlink(Hyperlink),
    /// A reference to a footnote or endnote
    NoteReference(NoteReference),
    /// A reference mark for a comment
    CommentReference {
        /// Comment ID
        comment_id: String,
    },
    /// Start of the range a comment covers
    CommentRangeStart {
        /// Comment ID
        comment_id: String,
    },
    /// End of the range a comment covers
    CommentRangeEnd {
        /// Comment ID
        comment_id: String,
    },
    /// An image
    Image(Image),
    /// A table
    Table(Table),
    /// A line, page, or column break
    Break {
        /// Kind of break
        break_type: BreakType,
    },
    /// A named bookmark anchor
    BookmarkStart {
        /// Bookmark name
        name: String,
    },
}

impl Node {
    /// Create a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    /// The kind of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Paragraph(_) => NodeKind::Paragraph,
            Node::Run(_) => NodeKind::Run,
            Node::Text { .. } => NodeKind::Text,
            Node::Tab => NodeKind::Tab,
            Node::Hyperlink(_) => NodeKind::Hyperlink,
            Node::NoteReference(_) => NodeKind::NoteReference,
            Node::CommentReference { .. } => NodeKind::CommentReference,
            Node::CommentRangeStart { .. } => NodeKind::CommentRangeStart,
            Node::CommentRangeEnd { .. } => NodeKind::CommentRangeEnd,
            Node::Image(_) => NodeKind::Image,
            Node::Table(_) => NodeKind::Table,
            Node::Break { .. } => NodeKind::Break,
            Node::BookmarkStart { .. } => NodeKind::BookmarkStart,
        }
    }

    /// Child nodes of container kinds; leaves have none.
    ///
    /// Table content is reached through [`Table::rows`].
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Paragraph(p) => &p.children,
            Node::Run(r) => &r.children,
            Node::Hyperlink(h) => &h.children,
            Node::Text { .. }
            | Node::Tab
            | Node::NoteReference(_)
            | Node::CommentReference { .. }
            | Node::CommentRangeStart { .. }
            | Node::CommentRangeEnd { .. }
            | Node::Image(_)
            | Node::Table(_)
            | Node::Break { .. }
            | Node::BookmarkStart { .. } => &[],
        }
    }

    /// Extract raw text: paragraphs end with a blank line, tabs become `\t`.
    pub fn raw_text(&self) -> String {
        let mut text = String::new();
        write_raw_text(self, &mut text);
        text
    }
}

pub(crate) fn write_raw_text(node: &Node, out: &mut String) {
    match node {
        Node::Text { value } => out.push_str(value),
        Node::Tab => out.push('\t'),
        Node::Paragraph(p) => {
            for child in &p.children {
                write_raw_text(child, out);
            }
            out.push_str("\n\n");
        }
        Node::Table(table) => {
            for cell in table.rows.iter().flat_map(|row| row.cells.iter()) {
                for child in &cell.children {
                    write_raw_text(child, out);
                }
            }
        }
        other => {
            for child in other.children() {
                write_raw_text(child, out);
            }
        }
    }
}

/// A hyperlink to an external target or an internal bookmark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hyperlink {
    /// Linked content
    #[serde(default)]
    pub children: Vec<Node>,

    /// External target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,

    /// Internal bookmark name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,

    /// Target frame (e.g., "_blank")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_frame: Option<String>,
}

/// A reference from the body to a footnote or endnote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteReference {
    /// Footnote or endnote
    pub note_type: NoteType,
    /// Note ID within its part
    pub note_id: String,
}

/// Kind of break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakType {
    Line,
    Page,
    Column,
}

/// Where the bytes of an image live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "lowercase")]
pub enum ImageSource {
    /// A part inside the package
    Embedded(crate::container::PartPath),
    /// A file outside the package, resolved against the document location
    Linked(std::path::PathBuf),
}

/// An image reference. The bytes are not read here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Where to read the image from
    pub source: ImageSource,

    /// Alternative text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,

    /// MIME type from the package's content types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Display width in EMUs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,

    /// Display height in EMUs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
}
