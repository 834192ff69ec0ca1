//! Attributed XML tree built from quick-xml events.
//!
//! Element and attribute names are canonicalised by namespace URI rather
//! than by the prefix a producer happened to choose, so a package written
//! with `<ns0:p>` in the WordprocessingML namespace still yields `w:p`.
//! Names in namespaces outside the known table are rendered as
//! `{uri}local`; undeclared prefixes are kept verbatim.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Canonical prefixes for the namespaces a word-processing package uses.
const NAMESPACES: &[(&str, &str)] = &[
    // Transitional
    ("http://schemas.openxmlformats.org/wordprocessingml/2006/main", "w"),
    ("http://schemas.openxmlformats.org/officeDocument/2006/relationships", "r"),
    ("http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing", "wp"),
    ("http://schemas.openxmlformats.org/drawingml/2006/main", "a"),
    ("http://schemas.openxmlformats.org/drawingml/2006/picture", "pic"),
    // Strict
    ("http://purl.oclc.org/ooxml/wordprocessingml/main", "w"),
    ("http://purl.oclc.org/ooxml/officeDocument/relationships", "r"),
    ("http://purl.oclc.org/ooxml/drawingml/wordprocessingDrawing", "wp"),
    ("http://purl.oclc.org/ooxml/drawingml/main", "a"),
    ("http://purl.oclc.org/ooxml/drawingml/picture", "pic"),
    // Package
    ("http://schemas.openxmlformats.org/package/2006/content-types", "content-types"),
    ("http://schemas.openxmlformats.org/package/2006/relationships", "relationships"),
    // Compatibility and legacy drawing
    ("http://schemas.openxmlformats.org/markup-compatibility/2006", "mc"),
    ("urn:schemas-microsoft-com:vml", "v"),
    ("urn:schemas-microsoft-com:office:office", "o"),
    ("http://schemas.microsoft.com/office/word/2010/wordprocessingShape", "wps"),
];

static EMPTY_ELEMENT: XmlElement = XmlElement {
    name: String::new(),
    attributes: BTreeMap::new(),
    children: Vec::new(),
};

/// A node in the attributed tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// An element with attributes and children
    Element(XmlElement),
    /// Character data
    Text(String),
}

impl XmlNode {
    /// The element, if this node is one.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        }
    }
}

/// An element of the attributed tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Canonical qualified name (e.g., "w:p")
    pub name: String,
    /// Attributes by canonical qualified name
    pub attributes: BTreeMap<String, String>,
    /// Child nodes in document order
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse an XML document and return its root element.
    ///
    /// Malformed input is an error; this is not a best-effort parser.
    pub fn parse(xml: &str) -> Result<XmlElement> {
        TreeBuilder::default().build(xml)
    }

    /// The shared empty element, whose lookups all miss.
    pub fn empty() -> &'static XmlElement {
        &EMPTY_ELEMENT
    }

    /// Get an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Iterate over the child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// First child element with the given name.
    pub fn first(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|child| child.name == name)
    }

    /// First child element with the given name, or the empty element.
    ///
    /// Lets lookups chain without a null check at every level:
    /// `style.first_or_empty("w:pPr").first_or_empty("w:numPr")`.
    pub fn first_or_empty(&self, name: &str) -> &XmlElement {
        self.first(name).unwrap_or(&EMPTY_ELEMENT)
    }

    /// All descendant elements with the given name, in document order.
    pub fn elements_by_tag_name(&self, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        collect_by_name(self, name, &mut found);
        found
    }

    /// Concatenated character data of all descendants.
    pub fn text(&self) -> String {
        let mut text = String::new();
        collect_text(self, &mut text);
        text
    }
}

fn collect_by_name<'a>(element: &'a XmlElement, name: &str, found: &mut Vec<&'a XmlElement>) {
    for child in element.child_elements() {
        if child.name == name {
            found.push(child);
        }
        collect_by_name(child, name, found);
    }
}

fn collect_text(element: &XmlElement, text: &mut String) {
    for child in &element.children {
        match child {
            XmlNode::Text(value) => text.push_str(value),
            XmlNode::Element(element) => collect_text(element, text),
        }
    }
}

/// Stack-based tree builder over quick-xml events.
#[derive(Default)]
struct TreeBuilder {
    stack: Vec<XmlElement>,
    scopes: Vec<Vec<(String, String)>>,
    root: Option<XmlElement>,
}

impl TreeBuilder {
    fn build(mut self, xml: &str) -> Result<XmlElement> {
        use quick_xml::events::Event;

        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let element = self.open(&e)?;
                    self.stack.push(element);
                }
                Event::Empty(e) => {
                    let element = self.open(&e)?;
                    self.scopes.pop();
                    self.attach(element)?;
                }
                Event::End(_) => {
                    let element = self
                        .stack
                        .pop()
                        .ok_or_else(|| Error::XmlParse("unexpected closing tag".to_string()))?;
                    self.scopes.pop();
                    self.attach(element)?;
                }
                Event::Text(e) => {
                    let text = e.unescape()?;
                    self.push_text(&text);
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    self.push_text(&text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !self.stack.is_empty() {
            return Err(Error::XmlParse("unexpected end of document".to_string()));
        }
        self.root
            .ok_or_else(|| Error::XmlParse("document has no root element".to_string()))
    }

    /// Read an opening tag, pushing its namespace scope.
    fn open(&mut self, e: &quick_xml::events::BytesStart<'_>) -> Result<XmlElement> {
        let mut declarations = Vec::new();
        let mut raw_attributes = Vec::new();

        for attr in e.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            if key == "xmlns" {
                declarations.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((prefix.to_string(), value));
            } else {
                raw_attributes.push((key, value));
            }
        }
        self.scopes.push(declarations);

        let raw_name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let name = self.resolve(&raw_name, true);
        let attributes = raw_attributes
            .into_iter()
            .map(|(key, value)| (self.resolve(&key, false), value))
            .collect();

        Ok(XmlElement {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    fn resolve(&self, qname: &str, is_element: bool) -> String {
        let (prefix, local) = match qname.split_once(':') {
            Some((prefix, local)) => (prefix, local),
            // Unprefixed attributes never take the default namespace
            None if !is_element => return qname.to_string(),
            None => ("", qname),
        };
        if prefix == "xml" {
            return qname.to_string();
        }

        let uri = self
            .scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(declared, _)| declared == prefix)
            .map(|(_, uri)| uri.as_str());

        match uri {
            Some("") | None => qname.to_string(),
            Some(uri) => match NAMESPACES.iter().find(|(known, _)| *known == uri) {
                Some((_, canonical)) => format!("{}:{}", canonical, local),
                None => format!("{{{}}}{}", uri, local),
            },
        }
    }

    fn attach(&mut self, element: XmlElement) -> Result<()> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(XmlNode::Element(element));
                Ok(())
            }
            None if self.root.is_none() => {
                self.root = Some(element);
                Ok(())
            }
            None => Err(Error::XmlParse("multiple root elements".to_string())),
        }
    }

    fn push_text(&mut self, text: &str) {
        // Character data outside the root element carries no content
        let Some(parent) = self.stack.last_mut() else {
            return;
        };
        if let Some(XmlNode::Text(existing)) = parent.children.last_mut() {
            existing.push_str(text);
        } else {
            parent.children.push(XmlNode::Text(text.to_string()));
        }
    }
}
