//! Table model structures.

use super::Node;
use serde::{Deserialize, Serialize};

/// A table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Rows in document order
    #[serde(default)]
    pub rows: Vec<TableRow>,

    /// Table style ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,

    /// Table style display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,

    /// Whether the table declares visible borders
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_bordered: bool,
}

/// A row in a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells in document order
    #[serde(default)]
    pub cells: Vec<TableCell>,

    /// Whether this row repeats as a header
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_header: bool,
}

/// A cell in a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell content
    #[serde(default)]
    pub children: Vec<Node>,

    /// Horizontal span (colspan)
    #[serde(default = "default_span", skip_serializing_if = "is_default_span")]
    pub col_span: u32,

    /// Vertical span (rowspan)
    #[serde(default = "default_span", skip_serializing_if = "is_default_span")]
    pub row_span: u32,

    /// Preferred width (`w:tcW`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<CellWidth>,

    /// Background fill color (hex)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
}

/// A preferred cell width and the unit it is measured in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellWidth {
    /// Raw value, e.g. "2880" or "50%"
    pub value: String,
    /// `dxa` (twentieths of a point), `pct`, `auto` or `nil`
    pub unit: String,
}

fn default_span() -> u32 {
    1
}

fn is_default_span(n: &u32) -> bool {
    *n == 1
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            children: Vec::new(),
            col_span: 1,
            row_span: 1,
            width: None,
            bg_color: None,
        }
    }
}

impl TableCell {
    /// Create a single-span cell holding the given nodes.
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            children,
            ..Default::default()
        }
    }
}

impl Table {
    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Maximum number of grid columns covered by any row.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.cells.iter().map(|c| c.col_span as usize).sum())
            .max()
            .unwrap_or(0)
    }
}
