//! Paragraph and run models.

use super::Node;
use serde::{Deserialize, Serialize};

/// Vertical position of run text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlignment {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

impl VerticalAlignment {
    /// Parse a `w:vertAlign` value.
    pub fn from_val(val: &str) -> Option<Self> {
        match val {
            "baseline" => Some(VerticalAlignment::Baseline),
            "superscript" => Some(VerticalAlignment::Superscript),
            "subscript" => Some(VerticalAlignment::Subscript),
            _ => None,
        }
    }

    fn is_baseline(&self) -> bool {
        matches!(self, VerticalAlignment::Baseline)
    }
}

/// A resolved list level, as used by a list paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingLevel {
    /// Nesting level (0 = top level)
    pub level: u8,

    /// Whether items are numbered rather than bulleted
    pub is_ordered: bool,

    /// Number format (decimal, bullet, lowerLetter, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Level text template (e.g., "%1.")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_text: Option<String>,

    /// First item number
    pub start: u32,

    /// Paragraph style bound to this level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_style_id: Option<String>,
}

/// Paragraph indentation, as raw twentieths of a point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphIndent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hanging: Option<String>,
}

/// A paragraph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Content in document order
    #[serde(default)]
    pub children: Vec<Node>,

    /// Paragraph style ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,

    /// Paragraph style display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,

    /// List level, if this paragraph is a list item
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numbering: Option<NumberingLevel>,

    /// Justification (`w:jc`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,

    /// Indentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent: Option<ParagraphIndent>,
}

impl Paragraph {
    /// Create a paragraph holding the given nodes.
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            children,
            ..Default::default()
        }
    }

    /// Check if the paragraph has no content.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A run of content with uniform direct formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Content in document order
    #[serde(default)]
    pub children: Vec<Node>,

    /// Character style ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,

    /// Character style display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_bold: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_italic: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_underline: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_strikethrough: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_all_caps: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_small_caps: bool,

    /// Superscript/subscript position
    #[serde(default, skip_serializing_if = "VerticalAlignment::is_baseline")]
    pub vertical_alignment: VerticalAlignment,

    /// Font name (ASCII slot)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,

    /// Font size in points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,

    /// Text color (hex, e.g., "FF0000")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Highlight color name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,

    /// Shading fill color (hex)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shading: Option<String>,
}

impl Run {
    /// Create an unformatted run holding the given nodes.
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            children,
            ..Default::default()
        }
    }

    /// Check if the run carries any toggle or position formatting.
    pub fn has_formatting(&self) -> bool {
        self.is_bold
            || self.is_italic
            || self.is_underline
            || self.is_strikethrough
            || self.is_all_caps
            || self.is_small_caps
            || !self.vertical_alignment.is_baseline()
    }
}
