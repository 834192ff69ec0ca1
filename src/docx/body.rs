//! Body reading: body-level XML into document nodes.
//!
//! [`BodyReader`] is the seam between the package pipeline and element
//! interpretation. The pipeline hands every body-bearing part (main
//! document, notes, comments) to the same reader together with a
//! [`BodyContext`] holding the catalogs that part resolves against.

use crate::container::PartPath;
use crate::model::{
    BreakType, CellWidth, Hyperlink, Image, ImageSource, Node, NoteReference, NoteType,
    NumberingLevel, Paragraph, ParagraphIndent, Run, Table, TableCell, TableRow,
};
use crate::xml::{XmlElement, XmlNode};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::content_types::ContentTypes;
use super::numbering::NumberingCatalog;
use super::relationships::Relationships;
use super::styles::{NumberingReference, StyleCatalog, StyleProperties, StyleType};

/// Elements that carry no content of their own.
const IGNORED_ELEMENTS: &[&str] = &[
    "w:annotationRef",
    "w:bookmarkEnd",
    "w:continuationSeparator",
    "w:del",
    "w:delText",
    "w:endnoteRef",
    "w:fldChar",
    "w:footnoteRef",
    "w:instrText",
    "w:lastRenderedPageBreak",
    "w:moveFrom",
    "w:pPr",
    "w:permEnd",
    "w:permStart",
    "w:proofErr",
    "w:rPr",
    "w:sdtEndPr",
    "w:sdtPr",
    "w:sectPr",
    "w:separator",
    "w:tblGrid",
    "w:tblPr",
    "w:tcPr",
    "w:trPr",
];

/// Elements whose children are read in their place.
const TRANSPARENT_ELEMENTS: &[&str] = &[
    "w:customXml",
    "w:fldSimple",
    "w:ins",
    "w:moveTo",
    "w:sdtContent",
    "w:smartTag",
];

/// Resolves links to files outside the package.
#[derive(Debug, Clone, Default)]
pub struct Files {
    base: Option<PathBuf>,
}

impl Files {
    /// Create a resolver anchored at `base`, usually the directory of the
    /// document being read.
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    /// Turn a link target into a filesystem path.
    ///
    /// Returns `None` for a relative target when no base is known.
    pub fn resolve(&self, uri: &str) -> Option<PathBuf> {
        let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
        if path.is_absolute() {
            return Some(path.to_path_buf());
        }
        self.base.as_ref().map(|base| base.join(path))
    }
}

/// Everything a body-bearing part resolves against.
#[derive(Debug, Clone)]
pub struct BodyContext {
    /// The part being read
    pub part_path: PartPath,
    /// Relationships of that part
    pub relationships: Relationships,
    pub content_types: Arc<ContentTypes>,
    pub numbering: Arc<NumberingCatalog>,
    pub styles: Arc<StyleCatalog>,
    pub files: Files,
    /// Bookmark names to leave out of the output
    pub ignored_bookmarks: Vec<String>,
}

impl BodyContext {
    /// A context with empty catalogs, for reading a standalone fragment.
    pub fn new(part_path: PartPath) -> Self {
        Self {
            part_path,
            relationships: Relationships::default(),
            content_types: Arc::new(ContentTypes::default()),
            numbering: NumberingCatalog::empty(),
            styles: StyleCatalog::empty(),
            files: Files::default(),
            ignored_bookmarks: Vec::new(),
        }
    }
}

/// Nodes read from a body plus the problems met on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BodyOutput {
    pub nodes: Vec<Node>,
    pub warnings: Vec<String>,
}

/// Interprets body-level XML.
pub trait BodyReader: Send + Sync {
    /// Read a sequence of sibling body elements.
    fn read_body(&self, context: &BodyContext, nodes: &[XmlNode]) -> BodyOutput;
}

/// The default body reader for WordprocessingML.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxBodyReader;

impl BodyReader for DocxBodyReader {
    fn read_body(&self, context: &BodyContext, nodes: &[XmlNode]) -> BodyOutput {
        let mut walker = BodyWalker {
            context,
            warnings: Vec::new(),
        };
        let nodes = walker.read_nodes(nodes);
        BodyOutput {
            nodes,
            warnings: walker.warnings,
        }
    }
}

/// Vertical merge state of a cell (`w:vMerge`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerticalMerge {
    None,
    Restart,
    Continue,
}

struct PendingCell {
    cell: TableCell,
    merge: VerticalMerge,
}

struct BodyWalker<'a> {
    context: &'a BodyContext,
    warnings: Vec<String>,
}

impl<'a> BodyWalker<'a> {
    fn context_ref(&self) -> &'a BodyContext {
        self.context
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    fn read_nodes(&mut self, nodes: &[XmlNode]) -> Vec<Node> {
        let mut result = Vec::new();
        for node in nodes {
            if let XmlNode::Element(element) = node {
                result.extend(self.read_element(element));
            }
        }
        result
    }

    fn read_children(&mut self, element: &XmlElement) -> Vec<Node> {
        self.read_nodes(&element.children)
    }

    fn read_element(&mut self, element: &XmlElement) -> Vec<Node> {
        let name = element.name.as_str();
        match name {
            "w:p" => vec![self.read_paragraph(element)],
            "w:r" => vec![self.read_run(element)],
            "w:t" => vec![Node::text(element.text())],
            "w:tab" => vec![Node::Tab],
            "w:noBreakHyphen" => vec![Node::text("\u{2011}")],
            "w:softHyphen" => vec![Node::text("\u{00AD}")],
            "w:sym" => self.read_symbol(element),
            "w:br" => read_break(element).into_iter().collect(),
            "w:cr" => vec![Node::Break {
                break_type: BreakType::Line,
            }],
            "w:hyperlink" => self.read_hyperlink(element),
            "w:bookmarkStart" => self.read_bookmark(element),
            "w:footnoteReference" => read_note_reference(element, NoteType::Footnote),
            "w:endnoteReference" => read_note_reference(element, NoteType::Endnote),
            "w:commentReference" => element
                .attribute("w:id")
                .map(|id| Node::CommentReference {
                    comment_id: id.to_string(),
                })
                .into_iter()
                .collect(),
            "w:commentRangeStart" => element
                .attribute("w:id")
                .map(|id| Node::CommentRangeStart {
                    comment_id: id.to_string(),
                })
                .into_iter()
                .collect(),
            "w:commentRangeEnd" => element
                .attribute("w:id")
                .map(|id| Node::CommentRangeEnd {
                    comment_id: id.to_string(),
                })
                .into_iter()
                .collect(),
            "w:tbl" => vec![self.read_table(element)],
            "w:drawing" => self.read_drawing(element),
            "w:pict" | "w:object" => self.read_vml_images(element),
            "mc:AlternateContent" => match element.first("mc:Fallback") {
                Some(fallback) => self.read_children(fallback),
                None => Vec::new(),
            },
            "w:sdt" => match element.first("w:sdtContent") {
                Some(content) => self.read_children(content),
                None => Vec::new(),
            },
            _ if TRANSPARENT_ELEMENTS.contains(&name) => self.read_children(element),
            _ if IGNORED_ELEMENTS.contains(&name) => Vec::new(),
            _ => {
                self.warn(format!("An unrecognised element was ignored: {}", name));
                Vec::new()
            }
        }
    }

    fn read_paragraph(&mut self, element: &XmlElement) -> Node {
        let ppr = element.first_or_empty("w:pPr");
        let own = StyleProperties::from_paragraph_properties(ppr);

        let style_id = ppr
            .first_or_empty("w:pStyle")
            .attribute("w:val")
            .map(str::to_string);
        let style_name = style_id.as_deref().and_then(|id| {
            self.style_name(StyleType::Paragraph, id)
        });

        let numbering = self.read_numbering(own.numbering.as_ref(), style_id.as_deref());

        let indent = ppr.first("w:ind").and_then(read_indent);

        Node::Paragraph(Paragraph {
            children: self.read_children(element),
            style_id,
            style_name,
            numbering,
            alignment: own.alignment,
            indent,
        })
    }

    /// Direct numbering, then the level bound to the paragraph style, then
    /// numbering inherited through the style chain.
    fn read_numbering(
        &self,
        direct: Option<&NumberingReference>,
        style_id: Option<&str>,
    ) -> Option<NumberingLevel> {
        let numbering = &self.context.numbering;
        if let Some(num_id) = direct.and_then(|r| r.num_id.as_deref()) {
            let level = direct.map_or(0, |r| r.level);
            return numbering.find_level(num_id, level);
        }

        let style_id = style_id?;
        if let Some(level) = numbering.find_level_by_paragraph_style_id(style_id) {
            return Some(level.clone());
        }

        let inherited = self
            .context
            .styles
            .effective_properties(&StyleType::Paragraph, style_id)?
            .numbering
            .as_ref()?;
        numbering.find_level(inherited.num_id.as_deref()?, inherited.level)
    }

    fn read_run(&mut self, element: &XmlElement) -> Node {
        let rpr = element.first_or_empty("w:rPr");
        let props = StyleProperties::from_run_properties(rpr);
        let on = |toggle: Option<bool>| toggle == Some(true);

        let style_id = rpr
            .first_or_empty("w:rStyle")
            .attribute("w:val")
            .map(str::to_string);
        let style_name = style_id.as_deref().and_then(|id| {
            self.style_name(StyleType::Character, id)
        });

        Node::Run(Run {
            children: self.read_children(element),
            style_id,
            style_name,
            is_bold: on(props.bold),
            is_italic: on(props.italic),
            is_underline: on(props.underline),
            is_strikethrough: on(props.strikethrough),
            is_all_caps: on(props.all_caps),
            is_small_caps: on(props.small_caps),
            vertical_alignment: props.vertical_alignment.unwrap_or_default(),
            font: props.font,
            font_size: props.font_size,
            color: props.color,
            highlight: props.highlight,
            shading: read_shading(rpr),
        })
    }

    /// Display name of a style, warning when the id is not defined.
    fn style_name(&mut self, style_type: StyleType, style_id: &str) -> Option<String> {
        let styles = &self.context_ref().styles;
        let (style, label) = match style_type {
            StyleType::Paragraph => (styles.find_paragraph_style_by_id(style_id), "Paragraph"),
            StyleType::Character => (styles.find_character_style_by_id(style_id), "Run"),
            StyleType::Table => (styles.find_table_style_by_id(style_id), "Table"),
            StyleType::Numbering | StyleType::Other(_) => (None, "Numbering"),
        };
        match style {
            Some(style) => style.name.clone(),
            None => {
                self.warn(format!(
                    "{} style with ID {} was referenced but not defined in the document",
                    label, style_id
                ));
                None
            }
        }
    }

    fn read_symbol(&mut self, element: &XmlElement) -> Vec<Node> {
        let code = element
            .attribute("w:char")
            .and_then(|c| u32::from_str_radix(c, 16).ok());
        match code.filter(|c| *c < 0xF000).and_then(char::from_u32) {
            Some(symbol) => vec![Node::text(symbol.to_string())],
            None => {
                self.warn(format!(
                    "A w:sym element with an unsupported character was ignored: char {} in font {}",
                    element.attribute("w:char").unwrap_or("?"),
                    element.attribute("w:font").unwrap_or("?")
                ));
                Vec::new()
            }
        }
    }

    fn read_hyperlink(&mut self, element: &XmlElement) -> Vec<Node> {
        let context = self.context_ref();
        let children = self.read_children(element);
        let anchor = element.attribute("w:anchor").map(str::to_string);
        let target_frame = element
            .attribute("w:tgtFrame")
            .filter(|frame| !frame.is_empty())
            .map(str::to_string);

        match element.attribute("r:id") {
            Some(id) => match context.relationships.find_target_by_id(id) {
                Some(target) => {
                    let href = match &anchor {
                        Some(anchor) => {
                            let base = target.split('#').next().unwrap_or(target);
                            format!("{}#{}", base, anchor)
                        }
                        None => target.to_string(),
                    };
                    vec![Node::Hyperlink(Hyperlink {
                        children,
                        href: Some(href),
                        anchor: None,
                        target_frame,
                    })]
                }
                None => {
                    self.warn(format!(
                        "Could not find relationship {} for hyperlink in {}",
                        id, context.part_path
                    ));
                    children
                }
            },
            None if anchor.is_some() => vec![Node::Hyperlink(Hyperlink {
                children,
                href: None,
                anchor,
                target_frame,
            })],
            None => children,
        }
    }

    fn read_bookmark(&mut self, element: &XmlElement) -> Vec<Node> {
        match element.attribute("w:name") {
            Some(name) if !self.context_ref().ignored_bookmarks.iter().any(|b| b == name) => {
                vec![Node::BookmarkStart {
                    name: name.to_string(),
                }]
            }
            _ => Vec::new(),
        }
    }

    fn read_table(&mut self, element: &XmlElement) -> Node {
        let tbl_pr = element.first_or_empty("w:tblPr");
        let style_id = tbl_pr
            .first_or_empty("w:tblStyle")
            .attribute("w:val")
            .map(str::to_string);
        let style_name = style_id
            .as_deref()
            .and_then(|id| self.style_name(StyleType::Table, id));

        let mut rows: Vec<(bool, Vec<PendingCell>)> = Vec::new();
        for tr in element.child_elements().filter(|e| e.name == "w:tr") {
            let is_header = tr
                .first_or_empty("w:trPr")
                .first("w:tblHeader")
                .is_some_and(|header| {
                    header
                        .attribute("w:val")
                        .is_none_or(|val| !matches!(val, "0" | "false" | "off"))
                });
            let cells = tr
                .child_elements()
                .filter(|e| e.name == "w:tc")
                .map(|tc| self.read_cell(tc))
                .collect();
            rows.push((is_header, cells));
        }

        Node::Table(Table {
            rows: merge_rows(rows),
            style_id,
            style_name,
            is_bordered: read_is_bordered(tbl_pr),
        })
    }

    fn read_cell(&mut self, element: &XmlElement) -> PendingCell {
        let tc_pr = element.first_or_empty("w:tcPr");
        let col_span = tc_pr
            .first_or_empty("w:gridSpan")
            .attribute("w:val")
            .and_then(|v| v.parse().ok())
            .filter(|span| *span > 0)
            .unwrap_or(1);
        let merge = match tc_pr.first("w:vMerge") {
            None => VerticalMerge::None,
            Some(v_merge) => match v_merge.attribute("w:val") {
                Some("restart") => VerticalMerge::Restart,
                _ => VerticalMerge::Continue,
            },
        };

        PendingCell {
            cell: TableCell {
                children: self.read_children(element),
                col_span,
                row_span: 1,
                width: read_cell_width(tc_pr),
                bg_color: read_shading(tc_pr),
            },
            merge,
        }
    }

    fn read_drawing(&mut self, element: &XmlElement) -> Vec<Node> {
        let mut images = Vec::new();
        for frame in element
            .child_elements()
            .filter(|e| e.name == "wp:inline" || e.name == "wp:anchor")
        {
            let doc_pr = frame.first_or_empty("wp:docPr");
            let extent = frame.first_or_empty("wp:extent");
            let size = (
                extent.attribute("cx").and_then(|cx| cx.parse().ok()),
                extent.attribute("cy").and_then(|cy| cy.parse().ok()),
            );
            let alt_text = doc_pr
                .attribute("descr")
                .filter(|d| !d.trim().is_empty())
                .or_else(|| doc_pr.attribute("title"))
                .map(str::to_string);

            for blip in frame.elements_by_tag_name("a:blip") {
                let image = match (blip.attribute("r:embed"), blip.attribute("r:link")) {
                    (Some(id), _) => self.embedded_image(id, alt_text.clone()),
                    (None, Some(id)) => self.linked_image(id, alt_text.clone()),
                    (None, None) => None,
                };
                images.extend(image.map(|image| Node::Image(with_size(image, size))));
            }
        }
        images
    }

    fn read_vml_images(&mut self, element: &XmlElement) -> Vec<Node> {
        let mut images = Vec::new();
        let size = element
            .elements_by_tag_name("v:shape")
            .first()
            .and_then(|shape| shape.attribute("style"))
            .map(vml_size)
            .unwrap_or_default();
        for image_data in element.elements_by_tag_name("v:imagedata") {
            let Some(id) = image_data.attribute("r:id") else {
                self.warn("A v:imagedata element without a relationship ID was ignored".to_string());
                continue;
            };
            let alt_text = image_data.attribute("o:title").map(str::to_string);
            images.extend(
                self.embedded_image(id, alt_text)
                    .map(|image| Node::Image(with_size(image, size))),
            );
        }
        images
    }

    fn embedded_image(&mut self, relationship_id: &str, alt_text: Option<String>) -> Option<Image> {
        let context = self.context_ref();
        let Some(target) = context.relationships.find_target_by_id(relationship_id) else {
            self.warn(format!(
                "Could not find image relationship {} in {}",
                relationship_id, context.part_path
            ));
            return None;
        };
        let path = PartPath::join(context.part_path.dirname(), target);
        let content_type = context.content_types.find_content_type(path.as_str());
        Some(Image {
            source: ImageSource::Embedded(path),
            alt_text,
            content_type,
            width: None,
            height: None,
        })
    }

    fn linked_image(&mut self, relationship_id: &str, alt_text: Option<String>) -> Option<Image> {
        let context = self.context_ref();
        let Some(target) = context.relationships.find_target_by_id(relationship_id) else {
            self.warn(format!(
                "Could not find image relationship {} in {}",
                relationship_id, context.part_path
            ));
            return None;
        };
        let Some(path) = context.files.resolve(target) else {
            self.warn(format!(
                "Could not resolve linked image '{}': path of the input document is unknown",
                target
            ));
            return None;
        };
        let content_type = context.content_types.find_content_type(target);
        Some(Image {
            source: ImageSource::Linked(path),
            alt_text,
            content_type,
            width: None,
            height: None,
        })
    }
}

fn with_size(image: Image, (width, height): (Option<u64>, Option<u64>)) -> Image {
    Image {
        width,
        height,
        ..image
    }
}

const EMUS_PER_POINT: f64 = 12_700.0;
const EMUS_PER_PIXEL: f64 = 9_525.0;

/// Width and height in EMUs from a VML `style` such as `width:48pt;height:24pt`.
fn vml_size(style: &str) -> (Option<u64>, Option<u64>) {
    let mut size = (None, None);
    for declaration in style.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let value = value.trim();
        let emus = if let Some(points) = value.strip_suffix("pt") {
            points.trim().parse::<f64>().ok().map(|p| p * EMUS_PER_POINT)
        } else if let Some(pixels) = value.strip_suffix("px") {
            pixels.trim().parse::<f64>().ok().map(|p| p * EMUS_PER_PIXEL)
        } else {
            None
        };
        let emus = emus.filter(|e| e.is_finite() && *e >= 0.0).map(|e| e.round() as u64);
        match property.trim() {
            "width" => size.0 = emus,
            "height" => size.1 = emus,
            _ => {}
        }
    }
    size
}

/// Fill color of a `w:shd` child; `auto` and absent fills count as none.
fn read_shading(properties: &XmlElement) -> Option<String> {
    properties
        .first("w:shd")?
        .attribute("w:fill")
        .filter(|fill| !fill.is_empty() && *fill != "auto")
        .map(str::to_string)
}

fn read_cell_width(tc_pr: &XmlElement) -> Option<CellWidth> {
    let tc_w = tc_pr.first("w:tcW")?;
    Some(CellWidth {
        value: tc_w.attribute("w:w")?.to_string(),
        unit: tc_w.attribute("w:type").unwrap_or("dxa").to_string(),
    })
}

/// A table is bordered when any `w:tblBorders` edge draws a line.
fn read_is_bordered(tbl_pr: &XmlElement) -> bool {
    tbl_pr
        .first_or_empty("w:tblBorders")
        .child_elements()
        .any(|edge| {
            edge.attribute("w:val")
                .is_some_and(|val| !matches!(val, "none" | "nil"))
        })
}

fn read_break(element: &XmlElement) -> Option<Node> {
    let break_type = match element.attribute("w:type") {
        None | Some("textWrapping") => BreakType::Line,
        Some("page") => BreakType::Page,
        Some("column") => BreakType::Column,
        Some(_) => return None,
    };
    Some(Node::Break { break_type })
}

fn read_note_reference(element: &XmlElement, note_type: NoteType) -> Vec<Node> {
    element
        .attribute("w:id")
        .map(|id| {
            Node::NoteReference(NoteReference {
                note_type,
                note_id: id.to_string(),
            })
        })
        .into_iter()
        .collect()
}

fn read_indent(ind: &XmlElement) -> Option<ParagraphIndent> {
    let value = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| ind.attribute(name))
            .map(str::to_string)
    };
    let indent = ParagraphIndent {
        start: value(&["w:start", "w:left"]),
        end: value(&["w:end", "w:right"]),
        first_line: value(&["w:firstLine"]),
        hanging: value(&["w:hanging"]),
    };
    (indent != ParagraphIndent::default()).then_some(indent)
}

/// Fold vertically merged cells into the row span of the cell that
/// starts the merge.
fn merge_rows(rows: Vec<(bool, Vec<PendingCell>)>) -> Vec<TableRow> {
    // Grid column -> (row index, cell index) of the open merge
    let mut open: Vec<Option<(usize, usize)>> = Vec::new();
    let mut spans: Vec<Vec<u32>> = Vec::with_capacity(rows.len());
    let mut dropped: Vec<Vec<bool>> = Vec::with_capacity(rows.len());

    for (row_index, (_, cells)) in rows.iter().enumerate() {
        let mut row_spans = vec![1; cells.len()];
        let mut row_dropped = vec![false; cells.len()];
        let mut column = 0usize;

        for (cell_index, pending) in cells.iter().enumerate() {
            let width = (pending.cell.col_span as usize).max(1);
            if open.len() < column + width {
                open.resize(column + width, None);
            }
            let state = match (pending.merge, open[column]) {
                (VerticalMerge::Continue, Some((origin_row, origin_cell))) => {
                    if origin_row == row_index {
                        row_spans[origin_cell] += 1;
                    } else {
                        spans[origin_row][origin_cell] += 1;
                    }
                    row_dropped[cell_index] = true;
                    Some((origin_row, origin_cell))
                }
                (VerticalMerge::Continue, None) | (VerticalMerge::Restart, _) => {
                    Some((row_index, cell_index))
                }
                (VerticalMerge::None, _) => None,
            };
            // Every grid column under the cell follows it
            open[column..column + width].fill(state);
            column += width;
        }

        spans.push(row_spans);
        dropped.push(row_dropped);
    }

    rows.into_iter()
        .enumerate()
        .map(|(row_index, (is_header, cells))| TableRow {
            is_header,
            cells: cells
                .into_iter()
                .enumerate()
                .filter(|(cell_index, _)| !dropped[row_index][*cell_index])
                .map(|(cell_index, pending)| TableCell {
                    row_span: spans[row_index][cell_index],
                    ..pending.cell
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::relationships::Relationship;

    const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    fn body(xml: &str) -> XmlElement {
        XmlElement::parse(&format!(
            r#"<w:body xmlns:w="{}"
                xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
                xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"
                xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
                xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"
                xmlns:v="urn:schemas-microsoft-com:vml"
                xmlns:o="urn:schemas-microsoft-com:office:office">{}</w:body>"#,
            W_NS, xml
        ))
        .unwrap()
    }

    fn read(context: &BodyContext, xml: &str) -> BodyOutput {
        DocxBodyReader.read_body(context, &body(xml).children)
    }

    fn context() -> BodyContext {
        BodyContext::new(PartPath::new("word/document.xml"))
    }

    fn only_paragraph(output: &BodyOutput) -> &Paragraph {
        match output.nodes.as_slice() {
            [Node::Paragraph(p)] => p,
            other => panic!("expected one paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_paragraph_with_formatted_run() {
        let output = read(
            &context(),
            r#"<w:p>
                <w:pPr><w:jc w:val="center"/><w:ind w:left="720" w:hanging="360"/></w:pPr>
                <w:r>
                    <w:rPr><w:b/><w:i w:val="0"/><w:sz w:val="28"/><w:vertAlign w:val="superscript"/></w:rPr>
                    <w:t>Hello</w:t><w:tab/><w:t xml:space="preserve"> world</w:t>
                </w:r>
            </w:p>"#,
        );
        assert!(output.warnings.is_empty(), "{:?}", output.warnings);

        let paragraph = only_paragraph(&output);
        assert_eq!(paragraph.alignment.as_deref(), Some("center"));
        let indent = paragraph.indent.as_ref().unwrap();
        assert_eq!(indent.start.as_deref(), Some("720"));
        assert_eq!(indent.hanging.as_deref(), Some("360"));

        let Node::Run(run) = &paragraph.children[0] else {
            panic!("expected run");
        };
        assert!(run.is_bold);
        assert!(!run.is_italic);
        assert_eq!(run.font_size, Some(14.0));
        assert_eq!(run.vertical_alignment, crate::model::VerticalAlignment::Superscript);
        assert_eq!(
            run.children,
            vec![Node::text("Hello"), Node::Tab, Node::text(" world")]
        );
    }

    #[test]
    fn test_undefined_styles_warn() {
        let output = read(
            &context(),
            r#"<w:p><w:pPr><w:pStyle w:val="Ghost"/></w:pPr>
                <w:r><w:rPr><w:rStyle w:val="Phantom"/></w:rPr><w:t>x</w:t></w:r>
            </w:p>"#,
        );
        let paragraph = only_paragraph(&output);
        assert_eq!(paragraph.style_id.as_deref(), Some("Ghost"));
        assert_eq!(paragraph.style_name, None);
        assert_eq!(
            output.warnings,
            vec![
                "Paragraph style with ID Ghost was referenced but not defined in the document",
                "Run style with ID Phantom was referenced but not defined in the document",
            ]
        );
    }

    #[test]
    fn test_style_names_are_resolved() {
        let styles = StyleCatalog::from_xml(
            &XmlElement::parse(&format!(
                r#"<w:styles xmlns:w="{}">
                    <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
                    <w:style w:type="character" w:styleId="Strong"><w:name w:val="Strong"/></w:style>
                </w:styles>"#,
                W_NS
            ))
            .unwrap(),
        )
        .unwrap();
        let mut context = context();
        context.styles = Arc::new(styles);

        let output = read(
            &context,
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr>
                <w:r><w:rPr><w:rStyle w:val="Strong"/></w:rPr><w:t>x</w:t></w:r>
            </w:p>"#,
        );
        let paragraph = only_paragraph(&output);
        assert_eq!(paragraph.style_name.as_deref(), Some("heading 1"));
        let Node::Run(run) = &paragraph.children[0] else {
            panic!("expected run");
        };
        assert_eq!(run.style_name.as_deref(), Some("Strong"));
    }

    #[test]
    fn test_numbering_direct_and_by_style() {
        let numbering = XmlElement::parse(&format!(
            r#"<w:numbering xmlns:w="{}">
                <w:abstractNum w:abstractNumId="0">
                    <w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/></w:lvl>
                    <w:lvl w:ilvl="1"><w:numFmt w:val="decimal"/><w:pStyle w:val="ListNumber"/></w:lvl>
                </w:abstractNum>
                <w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
            </w:numbering>"#,
            W_NS
        ))
        .unwrap();
        let mut context = context();
        context.numbering = Arc::new(NumberingCatalog::from_xml(&numbering, StyleCatalog::empty()));

        let output = read(
            &context,
            r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr></w:p>
               <w:p><w:pPr><w:pStyle w:val="ListNumber"/></w:pPr></w:p>
               <w:p/>"#,
        );
        let levels: Vec<Option<(u8, bool)>> = output
            .nodes
            .iter()
            .map(|node| match node {
                Node::Paragraph(p) => p.numbering.as_ref().map(|n| (n.level, n.is_ordered)),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![Some((0, false)), Some((1, true)), None]);
    }

    #[test]
    fn test_hyperlinks() {
        let mut context = context();
        context.relationships.add(Relationship {
            id: "rId5".to_string(),
            rel_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink"
                .to_string(),
            target: "https://example.com/page".to_string(),
            external: true,
        });

        let output = read(
            &context,
            r#"<w:p>
                <w:hyperlink r:id="rId5" w:tgtFrame="_blank"><w:r><w:t>ext</w:t></w:r></w:hyperlink>
                <w:hyperlink w:anchor="intro"><w:r><w:t>int</w:t></w:r></w:hyperlink>
                <w:hyperlink r:id="rId5" w:anchor="top"><w:r><w:t>both</w:t></w:r></w:hyperlink>
                <w:hyperlink r:id="rId404"><w:r><w:t>lost</w:t></w:r></w:hyperlink>
            </w:p>"#,
        );
        let paragraph = only_paragraph(&output);
        let links: Vec<(Option<&str>, Option<&str>, Option<&str>)> = paragraph
            .children
            .iter()
            .filter_map(|node| match node {
                Node::Hyperlink(h) => Some((
                    h.href.as_deref(),
                    h.anchor.as_deref(),
                    h.target_frame.as_deref(),
                )),
                _ => None,
            })
            .collect();
        assert_eq!(
            links,
            vec![
                (Some("https://example.com/page"), None, Some("_blank")),
                (None, Some("intro"), None),
                (Some("https://example.com/page#top"), None, None),
            ]
        );
        assert_eq!(paragraph.children.len(), 4);
        assert_eq!(output.warnings.len(), 1);
    }

    #[test]
    fn test_references_breaks_and_bookmarks() {
        let mut context = context();
        context.ignored_bookmarks = vec!["_GoBack".to_string()];
        let output = read(
            &context,
            r#"<w:p>
                <w:bookmarkStart w:id="0" w:name="_GoBack"/><w:bookmarkEnd w:id="0"/>
                <w:bookmarkStart w:id="1" w:name="intro"/>
                <w:commentRangeStart w:id="3"/>
                <w:r><w:footnoteReference w:id="2"/><w:endnoteReference w:id="4"/></w:r>
                <w:commentRangeEnd w:id="3"/>
                <w:r><w:commentReference w:id="3"/><w:br w:type="page"/><w:br/><w:cr/></w:r>
            </w:p>"#,
        );
        assert!(output.warnings.is_empty(), "{:?}", output.warnings);
        let kinds: Vec<String> = only_paragraph(&output)
            .children
            .iter()
            .map(|n| n.kind().to_string())
            .collect();
        assert_eq!(
            kinds,
            vec!["bookmarkStart", "commentRangeStart", "run", "commentRangeEnd", "run"]
        );

        let Node::Run(run) = &only_paragraph(&output).children[2] else {
            panic!("expected run");
        };
        assert_eq!(
            run.children,
            vec![
                Node::NoteReference(NoteReference {
                    note_type: NoteType::Footnote,
                    note_id: "2".to_string()
                }),
                Node::NoteReference(NoteReference {
                    note_type: NoteType::Endnote,
                    note_id: "4".to_string()
                }),
            ]
        );
    }

    #[test]
    fn test_tracked_changes_and_wrappers() {
        let output = read(
            &context(),
            r#"<w:p>
                <w:ins><w:r><w:t>new</w:t></w:r></w:ins>
                <w:del><w:r><w:delText>old</w:delText></w:r></w:del>
                <w:smartTag><w:r><w:t>tag</w:t></w:r></w:smartTag>
                <w:sdt><w:sdtPr/><w:sdtContent><w:r><w:t>sdt</w:t></w:r></w:sdtContent></w:sdt>
                <mc:AlternateContent>
                    <mc:Choice Requires="wps"><w:r><w:t>choice</w:t></w:r></mc:Choice>
                    <mc:Fallback><w:r><w:t>fallback</w:t></w:r></mc:Fallback>
                </mc:AlternateContent>
                <w:r><w:noBreakHyphen/><w:sym w:font="Arial" w:char="00A9"/></w:r>
            </w:p>"#,
        );
        assert!(output.warnings.is_empty(), "{:?}", output.warnings);
        assert_eq!(
            Node::Paragraph(only_paragraph(&output).clone()).raw_text(),
            "newtagsdtfallback\u{2011}\u{a9}\n\n"
        );
    }

    #[test]
    fn test_unknown_element_warns() {
        let output = read(&context(), r#"<w:p><w:r><w:mystery/><w:t>x</w:t></w:r></w:p>"#);
        assert_eq!(
            output.warnings,
            vec!["An unrecognised element was ignored: w:mystery"]
        );
        assert_eq!(output.nodes[0].raw_text(), "x\n\n");
    }

    #[test]
    fn test_table_spans() {
        let output = read(
            &context(),
            r#"<w:tbl>
                <w:tblPr><w:tblStyle w:val="Grid"/></w:tblPr>
                <w:tblGrid><w:gridCol/><w:gridCol/><w:gridCol/></w:tblGrid>
                <w:tr><w:trPr><w:tblHeader/></w:trPr>
                    <w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>wide</w:t></w:r></w:p></w:tc>
                    <w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:t>tall</w:t></w:r></w:p></w:tc>
                </w:tr>
                <w:tr>
                    <w:tc><w:p/></w:tc><w:tc><w:p/></w:tc>
                    <w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc>
                </w:tr>
                <w:tr>
                    <w:tc><w:p/></w:tc><w:tc><w:p/></w:tc>
                    <w:tc><w:tcPr><w:vMerge w:val="continue"/></w:tcPr><w:p/></w:tc>
                </w:tr>
            </w:tbl>"#,
        );
        assert_eq!(
            output.warnings,
            vec!["Table style with ID Grid was referenced but not defined in the document"]
        );

        let Node::Table(table) = &output.nodes[0] else {
            panic!("expected table");
        };
        assert_eq!(table.style_id.as_deref(), Some("Grid"));
        assert_eq!(table.row_count(), 3);
        assert!(table.rows[0].is_header);
        assert!(!table.rows[1].is_header);

        let first = &table.rows[0].cells;
        assert_eq!(first[0].col_span, 2);
        assert_eq!(first[1].row_span, 3);
        assert_eq!(table.rows[1].cells.len(), 2);
        assert_eq!(table.rows[2].cells.len(), 2);
    }

    #[test]
    fn test_wide_cell_closes_merges_in_every_column() {
        let output = read(
            &context(),
            r#"<w:tbl>
                <w:tr>
                    <w:tc><w:p><w:r><w:t>A</w:t></w:r></w:p></w:tc>
                    <w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:t>B</w:t></w:r></w:p></w:tc>
                </w:tr>
                <w:tr>
                    <w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>WIDE</w:t></w:r></w:p></w:tc>
                </w:tr>
                <w:tr>
                    <w:tc><w:p><w:r><w:t>D</w:t></w:r></w:p></w:tc>
                    <w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p><w:r><w:t>E-content</w:t></w:r></w:p></w:tc>
                </w:tr>
            </w:tbl>"#,
        );

        let Node::Table(table) = &output.nodes[0] else {
            panic!("expected table");
        };
        let spans: Vec<u32> = table.rows[0].cells.iter().map(|c| c.row_span).collect();
        assert_eq!(spans, vec![1, 1]);
        assert_eq!(table.rows[2].cells.len(), 2);
        assert_eq!(output.nodes[0].raw_text(), "A\n\nB\n\nWIDE\n\nD\n\nE-content\n\n");
    }

    #[test]
    fn test_wide_continue_cell_extends_merge() {
        let output = read(
            &context(),
            r#"<w:tbl>
                <w:tr>
                    <w:tc><w:tcPr><w:gridSpan w:val="2"/><w:vMerge w:val="restart"/></w:tcPr><w:p/></w:tc>
                </w:tr>
                <w:tr>
                    <w:tc><w:tcPr><w:gridSpan w:val="2"/><w:vMerge/></w:tcPr><w:p/></w:tc>
                </w:tr>
            </w:tbl>"#,
        );

        let Node::Table(table) = &output.nodes[0] else {
            panic!("expected table");
        };
        assert_eq!(table.rows[0].cells[0].row_span, 2);
        assert!(table.rows[1].cells.is_empty());
    }

    #[test]
    fn test_table_borders_widths_and_shading() {
        let output = read(
            &context(),
            r#"<w:tbl>
                <w:tblPr><w:tblBorders>
                    <w:top w:val="nil"/><w:insideH w:val="single" w:sz="4"/>
                </w:tblBorders></w:tblPr>
                <w:tr>
                    <w:tc><w:tcPr><w:tcW w:w="2880" w:type="dxa"/><w:shd w:val="clear" w:fill="D9E2F3"/></w:tcPr><w:p/></w:tc>
                    <w:tc><w:tcPr><w:tcW w:w="50%" w:type="pct"/><w:shd w:val="clear" w:fill="auto"/></w:tcPr><w:p/></w:tc>
                </w:tr>
            </w:tbl>
            <w:tbl>
                <w:tblPr><w:tblBorders><w:top w:val="none"/></w:tblBorders></w:tblPr>
                <w:tr><w:tc><w:p/></w:tc></w:tr>
            </w:tbl>"#,
        );

        let Node::Table(table) = &output.nodes[0] else {
            panic!("expected table");
        };
        assert!(table.is_bordered);
        let cells = &table.rows[0].cells;
        assert_eq!(
            cells[0].width,
            Some(CellWidth {
                value: "2880".to_string(),
                unit: "dxa".to_string()
            })
        );
        assert_eq!(cells[0].bg_color.as_deref(), Some("D9E2F3"));
        assert_eq!(cells[1].width.as_ref().map(|w| w.unit.as_str()), Some("pct"));
        assert_eq!(cells[1].bg_color, None);

        let Node::Table(plain) = &output.nodes[1] else {
            panic!("expected table");
        };
        assert!(!plain.is_bordered);
        assert_eq!(plain.rows[0].cells[0].width, None);
    }

    #[test]
    fn test_run_shading() {
        let output = read(
            &context(),
            r#"<w:p>
                <w:r><w:rPr><w:shd w:val="clear" w:color="auto" w:fill="FFFF00"/></w:rPr><w:t>marked</w:t></w:r>
                <w:r><w:rPr><w:shd w:val="clear" w:fill="auto"/></w:rPr><w:t>plain</w:t></w:r>
            </w:p>"#,
        );
        let shading: Vec<Option<&str>> = only_paragraph(&output)
            .children
            .iter()
            .map(|node| match node {
                Node::Run(run) => run.shading.as_deref(),
                other => panic!("expected run, got {:?}", other),
            })
            .collect();
        assert_eq!(shading, vec![Some("FFFF00"), None]);
    }

    #[test]
    fn test_image_sizes() {
        let mut context = context();
        context.relationships.add(Relationship {
            id: "rId1".to_string(),
            rel_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image"
                .to_string(),
            target: "media/image1.png".to_string(),
            external: false,
        });

        let output = read(
            &context,
            r#"<w:p><w:r>
                <w:drawing><wp:inline>
                    <wp:extent cx="914400" cy="457200"/>
                    <wp:docPr id="1" name="Picture 1"/>
                    <a:graphic><a:graphicData><a:blip r:embed="rId1"/></a:graphicData></a:graphic>
                </wp:inline></w:drawing>
                <w:pict><v:shape style="width:72pt;height:10px"><v:imagedata r:id="rId1"/></v:shape></w:pict>
            </w:r></w:p>"#,
        );
        let Node::Run(run) = &only_paragraph(&output).children[0] else {
            panic!("expected run");
        };
        let sizes: Vec<(Option<u64>, Option<u64>)> = run
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Image(image) => Some((image.width, image.height)),
                _ => None,
            })
            .collect();
        assert_eq!(
            sizes,
            vec![(Some(914_400), Some(457_200)), (Some(914_400), Some(95_250))]
        );
    }

    #[test]
    fn test_vml_size() {
        assert_eq!(vml_size("position:absolute;width:1.5pt; height : 2px"), (Some(19_050), Some(19_050)));
        assert_eq!(vml_size("width:auto"), (None, None));
        assert_eq!(vml_size(""), (None, None));
    }

    #[test]
    fn test_images() {
        let mut context = context();
        for (id, target) in [("rId7", "media/image1.png"), ("rId8", "../shared/logo.gif"), ("rId9", "pics/remote.jpg")] {
            context.relationships.add(Relationship {
                id: id.to_string(),
                rel_type: "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image"
                    .to_string(),
                target: target.to_string(),
                external: id == "rId9",
            });
        }

        let xml = r#"<w:p><w:r>
            <w:drawing><wp:inline>
                <wp:docPr id="1" name="Picture 1" descr="A chart"/>
                <a:graphic><a:graphicData><a:blip r:embed="rId7"/></a:graphicData></a:graphic>
            </wp:inline></w:drawing>
            <w:pict><v:shape><v:imagedata r:id="rId8" o:title="Logo"/></v:shape></w:pict>
            <w:drawing><wp:anchor>
                <wp:docPr id="2" name="Picture 2" descr="  " title="Remote"/>
                <a:graphic><a:graphicData><a:blip r:link="rId9"/></a:graphicData></a:graphic>
            </wp:anchor></w:drawing>
        </w:r></w:p>"#;

        let output = read(&context, xml);
        let Node::Run(run) = &only_paragraph(&output).children[0] else {
            panic!("expected run");
        };
        let images: Vec<&Image> = run
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Image(image) => Some(image),
                _ => None,
            })
            .collect();
        assert_eq!(images.len(), 2);
        assert_eq!(
            images[0].source,
            ImageSource::Embedded(PartPath::new("word/media/image1.png"))
        );
        assert_eq!(images[0].alt_text.as_deref(), Some("A chart"));
        assert_eq!(images[0].content_type.as_deref(), Some("image/png"));
        assert_eq!(
            images[1].source,
            ImageSource::Embedded(PartPath::new("shared/logo.gif"))
        );
        assert_eq!(images[1].alt_text.as_deref(), Some("Logo"));
        assert_eq!(output.warnings.len(), 1);

        context.files = Files::new(Some(PathBuf::from("/docs")));
        let output = read(&context, xml);
        let Node::Run(run) = &only_paragraph(&output).children[0] else {
            panic!("expected run");
        };
        assert_eq!(
            run.children[2],
            Node::Image(Image {
                source: ImageSource::Linked(PathBuf::from("/docs/pics/remote.jpg")),
                alt_text: Some("Remote".to_string()),
                content_type: Some("image/jpeg".to_string()),
                width: None,
                height: None,
            })
        );
    }

    #[test]
    fn test_files_resolve() {
        let files = Files::new(Some(PathBuf::from("/home/user/docs")));
        assert_eq!(
            files.resolve("images/a.png"),
            Some(PathBuf::from("/home/user/docs/images/a.png"))
        );
        assert_eq!(
            files.resolve("file:///tmp/b.png"),
            Some(PathBuf::from("/tmp/b.png"))
        );
        assert_eq!(Files::default().resolve("images/a.png"), None);
    }
}
