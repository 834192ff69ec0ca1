//! DOCX styles parsing and inheritance resolution.
//!
//! The catalog is built in two passes. The first pass records every
//! `w:style` element as a plain [`Style`] in the table for its type. The
//! second pass flattens each style's `basedOn` chain into
//! [`EffectiveProperties`], memoising per id and failing on cycles.

use crate::error::{Error, Result};
use crate::model::VerticalAlignment;
use crate::xml::XmlElement;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};
use tracing::debug;

static EMPTY_STYLES: LazyLock<Arc<StyleCatalog>> =
    LazyLock::new(|| Arc::new(StyleCatalog::default()));

/// Style type (paragraph, character, table, etc.)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StyleType {
    Paragraph,
    Character,
    Table,
    Numbering,
    /// A type this reader does not classify
    Other(String),
}

impl StyleType {
    /// Parse a `w:type` value.
    pub fn from_val(val: &str) -> Self {
        match val {
            "paragraph" => StyleType::Paragraph,
            "character" => StyleType::Character,
            "table" => StyleType::Table,
            "numbering" => StyleType::Numbering,
            other => StyleType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StyleType::Paragraph => "paragraph",
            StyleType::Character => "character",
            StyleType::Table => "table",
            StyleType::Numbering => "numbering",
            StyleType::Other(other) => other,
        }
    }
}

impl Serialize for StyleType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A pointer to a numbering definition and list level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberingReference {
    /// Numbering instance ID (`w:numId`); `None` when not declared
    pub num_id: Option<String>,
    /// List level (`w:ilvl`), 0 when not declared
    pub level: u8,
}

impl NumberingReference {
    /// Read a `w:numPr` element.
    pub fn from_num_pr(num_pr: &XmlElement) -> Option<Self> {
        let num_id = num_pr.first_or_empty("w:numId").attribute("w:val");
        let level = num_pr.first_or_empty("w:ilvl").attribute("w:val");
        if num_id.is_none() && level.is_none() {
            return None;
        }
        Some(Self {
            num_id: num_id.map(str::to_string),
            level: level.and_then(|l| l.parse().ok()).unwrap_or(0),
        })
    }
}

/// Properties as a style (or a run) declares them.
///
/// Toggles are tri-state: `Some(true)` is an explicit on, `Some(false)` an
/// explicit off, `None` leaves the value to the base style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleProperties {
    pub font: Option<String>,
    /// Font size in points
    pub font_size: Option<f64>,
    pub color: Option<String>,
    pub highlight: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strikethrough: Option<bool>,
    pub all_caps: Option<bool>,
    pub small_caps: Option<bool>,
    pub vertical_alignment: Option<VerticalAlignment>,
    pub alignment: Option<String>,
    pub numbering: Option<NumberingReference>,
}

impl StyleProperties {
    /// Read the `w:rPr` and `w:pPr` children of a style element.
    pub fn from_style_element(style: &XmlElement) -> Self {
        let mut props = Self::from_run_properties(style.first_or_empty("w:rPr"));
        props.merge(&Self::from_paragraph_properties(style.first_or_empty("w:pPr")));
        props
    }

    /// Read a `w:rPr` element.
    pub fn from_run_properties(rpr: &XmlElement) -> Self {
        Self {
            font: rpr
                .first_or_empty("w:rFonts")
                .attribute("w:ascii")
                .map(str::to_string),
            font_size: rpr
                .first_or_empty("w:sz")
                .attribute("w:val")
                .and_then(parse_half_points),
            color: rpr
                .first_or_empty("w:color")
                .attribute("w:val")
                .filter(|val| *val != "auto")
                .map(str::to_string),
            highlight: rpr
                .first_or_empty("w:highlight")
                .attribute("w:val")
                .filter(|val| *val != "none")
                .map(str::to_string),
            bold: read_toggle(rpr, "w:b"),
            italic: read_toggle(rpr, "w:i"),
            underline: read_underline(rpr),
            strikethrough: read_toggle(rpr, "w:strike"),
            all_caps: read_toggle(rpr, "w:caps"),
            small_caps: read_toggle(rpr, "w:smallCaps"),
            vertical_alignment: rpr
                .first_or_empty("w:vertAlign")
                .attribute("w:val")
                .and_then(VerticalAlignment::from_val),
            ..Default::default()
        }
    }

    /// Read a `w:pPr` element.
    pub fn from_paragraph_properties(ppr: &XmlElement) -> Self {
        Self {
            alignment: ppr
                .first_or_empty("w:jc")
                .attribute("w:val")
                .map(str::to_string),
            numbering: ppr.first("w:numPr").and_then(NumberingReference::from_num_pr),
            ..Default::default()
        }
    }

    /// Merge with another set of properties (other takes precedence).
    pub fn merge(&mut self, other: &StyleProperties) {
        fn take<T: Clone>(slot: &mut Option<T>, other: &Option<T>) {
            if other.is_some() {
                slot.clone_from(other);
            }
        }

        take(&mut self.font, &other.font);
        take(&mut self.font_size, &other.font_size);
        take(&mut self.color, &other.color);
        take(&mut self.highlight, &other.highlight);
        take(&mut self.bold, &other.bold);
        take(&mut self.italic, &other.italic);
        take(&mut self.underline, &other.underline);
        take(&mut self.strikethrough, &other.strikethrough);
        take(&mut self.all_caps, &other.all_caps);
        take(&mut self.small_caps, &other.small_caps);
        take(&mut self.vertical_alignment, &other.vertical_alignment);
        take(&mut self.alignment, &other.alignment);
        take(&mut self.numbering, &other.numbering);
    }
}

/// Half-points to points. Only plain digit strings count as sizes.
fn parse_half_points(val: &str) -> Option<f64> {
    if val.is_empty() || !val.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    val.parse::<u32>().ok().map(|half_points| f64::from(half_points) / 2.0)
}

fn is_off(val: &str) -> bool {
    matches!(val, "0" | "false" | "off")
}

fn read_toggle(rpr: &XmlElement, name: &str) -> Option<bool> {
    rpr.first(name)
        .map(|element| element.attribute("w:val").is_none_or(|val| !is_off(val)))
}

/// `w:u` is on only with an explicit underline kind.
fn read_underline(rpr: &XmlElement) -> Option<bool> {
    rpr.first("w:u")
        .map(|element| matches!(element.attribute("w:val"), Some(val) if val != "none" && !is_off(val)))
}

/// A single property value in the flattened map view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Inheritance-resolved properties of a style.
///
/// Toggles are `true` only when the nearest style in the chain that
/// mentions them turns them on; an explicit off anywhere closer to the
/// style hides an ancestor's on.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub all_caps: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub small_caps: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_alignment: Option<VerticalAlignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numbering: Option<NumberingReference>,
}

impl From<&StyleProperties> for EffectiveProperties {
    fn from(props: &StyleProperties) -> Self {
        let on = |toggle: Option<bool>| toggle == Some(true);
        Self {
            font: props.font.clone(),
            font_size: props.font_size,
            color: props.color.clone(),
            highlight: props.highlight.clone(),
            bold: on(props.bold),
            italic: on(props.italic),
            underline: on(props.underline),
            strikethrough: on(props.strikethrough),
            all_caps: on(props.all_caps),
            small_caps: on(props.small_caps),
            vertical_alignment: props.vertical_alignment,
            alignment: props.alignment.clone(),
            numbering: props.numbering.clone(),
        }
    }
}

impl EffectiveProperties {
    /// Flattened `name -> value` view; absent values and off toggles are
    /// left out.
    pub fn to_map(&self) -> BTreeMap<&'static str, PropertyValue> {
        let mut map = BTreeMap::new();
        let text = |value: &Option<String>| value.clone().map(PropertyValue::Text);

        let entries = [
            ("font", text(&self.font)),
            ("fontSize", self.font_size.map(PropertyValue::Number)),
            ("color", text(&self.color)),
            ("highlight", text(&self.highlight)),
            ("bold", self.bold.then_some(PropertyValue::Bool(true))),
            ("italic", self.italic.then_some(PropertyValue::Bool(true))),
            ("underline", self.underline.then_some(PropertyValue::Bool(true))),
            ("strikethrough", self.strikethrough.then_some(PropertyValue::Bool(true))),
            ("allCaps", self.all_caps.then_some(PropertyValue::Bool(true))),
            ("smallCaps", self.small_caps.then_some(PropertyValue::Bool(true))),
            (
                "verticalAlignment",
                self.vertical_alignment.map(|v| {
                    PropertyValue::Text(
                        match v {
                            VerticalAlignment::Baseline => "baseline",
                            VerticalAlignment::Superscript => "superscript",
                            VerticalAlignment::Subscript => "subscript",
                        }
                        .to_string(),
                    )
                }),
            ),
            ("alignment", text(&self.alignment)),
            (
                "numId",
                self.numbering
                    .as_ref()
                    .and_then(|n| n.num_id.clone())
                    .map(PropertyValue::Text),
            ),
            (
                "numLevel",
                self.numbering
                    .as_ref()
                    .map(|n| PropertyValue::Number(f64::from(n.level))),
            ),
        ];

        for (name, value) in entries {
            if let Some(value) = value {
                map.insert(name, value);
            }
        }
        map
    }
}

/// A parsed style definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Style ID (e.g., "Heading1")
    pub style_id: String,
    /// Style type
    pub style_type: StyleType,
    /// Display name (e.g., "Heading 1")
    pub name: Option<String>,
    /// ID of the style this one is based on
    pub based_on: Option<String>,
    /// Properties the style declares itself
    pub properties: StyleProperties,
    /// Marked as user-defined (`w:customStyle`)
    pub is_custom: bool,
}

impl Style {
    fn from_element(element: &XmlElement) -> Option<Self> {
        let style_id = element.attribute("w:styleId")?;
        Some(Self {
            style_id: style_id.to_string(),
            style_type: StyleType::from_val(element.attribute("w:type").unwrap_or_default()),
            name: element
                .first("w:name")
                .and_then(|name| name.attribute("w:val"))
                .map(str::to_string),
            based_on: element
                .first("w:basedOn")
                .and_then(|based_on| based_on.attribute("w:val"))
                .map(str::to_string),
            properties: StyleProperties::from_style_element(element),
            is_custom: element
                .attribute("w:customStyle")
                .is_some_and(|val| matches!(val, "1" | "true" | "on")),
        })
    }
}

/// A user-defined style with its resolved properties, for tooling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomStyle {
    pub style_id: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub style_type: StyleType,
    pub properties: EffectiveProperties,
}

/// Styles of one type plus their resolved properties.
#[derive(Debug, Clone, Default)]
struct StyleTable {
    styles: HashMap<String, Style>,
    effective: HashMap<String, EffectiveProperties>,
}

impl StyleTable {
    fn resolve(&mut self, style_type: &StyleType) -> Result<()> {
        let mut ids: Vec<&str> = self.styles.keys().map(String::as_str).collect();
        ids.sort_unstable();

        let mut resolved = HashMap::new();
        for id in ids {
            resolve_style(id, &self.styles, &mut resolved, &mut Vec::new(), style_type)?;
        }

        self.effective = resolved
            .iter()
            .map(|(id, props)| (id.clone(), EffectiveProperties::from(props)))
            .collect();
        Ok(())
    }
}

/// Flatten one style's chain, memoising every style it passes through.
fn resolve_style<'a>(
    id: &'a str,
    styles: &'a HashMap<String, Style>,
    resolved: &mut HashMap<String, StyleProperties>,
    visiting: &mut Vec<&'a str>,
    style_type: &StyleType,
) -> Result<StyleProperties> {
    if let Some(done) = resolved.get(id) {
        return Ok(done.clone());
    }
    if let Some(start) = visiting.iter().position(|v| *v == id) {
        let mut chain: Vec<&str> = visiting[start..].to_vec();
        chain.push(id);
        return Err(Error::StyleCycle {
            style_type: style_type.as_str().to_string(),
            chain: chain.join(" -> "),
        });
    }

    let Some(style) = styles.get(id) else {
        return Ok(StyleProperties::default());
    };

    visiting.push(id);
    let mut merged = match style.based_on.as_deref() {
        Some(base_id) if styles.contains_key(base_id) => {
            resolve_style(base_id, styles, resolved, visiting, style_type)?
        }
        Some(base_id) => {
            debug!(style = id, base = base_id, "basedOn refers to an unknown style");
            StyleProperties::default()
        }
        None => StyleProperties::default(),
    };
    visiting.pop();

    merged.merge(&style.properties);
    resolved.insert(id.to_string(), merged.clone());
    Ok(merged)
}

/// Collection of styles from styles.xml.
///
/// Paragraph, character, and table styles live in separate namespaces: a
/// paragraph style and a character style may share an id.
#[derive(Debug, Clone, Default)]
pub struct StyleCatalog {
    paragraph: StyleTable,
    character: StyleTable,
    table: StyleTable,
    numbering: HashMap<String, NumberingReference>,
    custom_styles: Vec<CustomStyle>,
    unclassified: Vec<Style>,
}

impl StyleCatalog {
    /// The canonical catalog with no styles, for packages without a
    /// styles part.
    pub fn empty() -> Arc<StyleCatalog> {
        Arc::clone(&EMPTY_STYLES)
    }

    /// Build a catalog from the root of a styles part.
    ///
    /// Fails only on a `basedOn` cycle.
    pub fn from_xml(root: &XmlElement) -> Result<Self> {
        let mut catalog = StyleCatalog::default();
        let mut custom = Vec::new();

        for element in root.elements_by_tag_name("w:style") {
            let Some(style) = Style::from_element(element) else {
                debug!("skipping style without w:styleId");
                continue;
            };
            if style.is_custom {
                custom.push(style.clone());
            }

            match style.style_type {
                StyleType::Paragraph => {
                    catalog.paragraph.styles.insert(style.style_id.clone(), style);
                }
                StyleType::Character => {
                    catalog.character.styles.insert(style.style_id.clone(), style);
                }
                StyleType::Table => {
                    catalog.table.styles.insert(style.style_id.clone(), style);
                }
                StyleType::Numbering => {
                    let reference = element
                        .first_or_empty("w:pPr")
                        .first("w:numPr")
                        .and_then(NumberingReference::from_num_pr)
                        .unwrap_or(NumberingReference {
                            num_id: None,
                            level: 0,
                        });
                    catalog.numbering.insert(style.style_id, reference);
                }
                StyleType::Other(ref other) => {
                    debug!(style = %style.style_id, style_type = %other, "unclassified style type");
                    catalog.unclassified.push(style);
                }
            }
        }

        catalog.paragraph.resolve(&StyleType::Paragraph)?;
        catalog.character.resolve(&StyleType::Character)?;
        catalog.table.resolve(&StyleType::Table)?;

        catalog.custom_styles = custom
            .into_iter()
            .map(|style| {
                let properties = catalog
                    .effective_properties(&style.style_type, &style.style_id)
                    .cloned()
                    .unwrap_or_else(|| EffectiveProperties::from(&style.properties));
                CustomStyle {
                    style_id: style.style_id,
                    name: style.name,
                    style_type: style.style_type,
                    properties,
                }
            })
            .collect();

        Ok(catalog)
    }

    fn table_for(&self, style_type: &StyleType) -> Option<&StyleTable> {
        match style_type {
            StyleType::Paragraph => Some(&self.paragraph),
            StyleType::Character => Some(&self.character),
            StyleType::Table => Some(&self.table),
            StyleType::Numbering | StyleType::Other(_) => None,
        }
    }

    pub fn find_paragraph_style_by_id(&self, style_id: &str) -> Option<&Style> {
        self.paragraph.styles.get(style_id)
    }

    pub fn find_character_style_by_id(&self, style_id: &str) -> Option<&Style> {
        self.character.styles.get(style_id)
    }

    pub fn find_table_style_by_id(&self, style_id: &str) -> Option<&Style> {
        self.table.styles.get(style_id)
    }

    /// Numbering reference of a numbering-type style.
    pub fn find_numbering_style_by_id(&self, style_id: &str) -> Option<&NumberingReference> {
        self.numbering.get(style_id)
    }

    /// Resolved properties of a paragraph, character, or table style.
    pub fn effective_properties(
        &self,
        style_type: &StyleType,
        style_id: &str,
    ) -> Option<&EffectiveProperties> {
        self.table_for(style_type)?.effective.get(style_id)
    }

    /// User-defined styles in declaration order.
    pub fn custom_styles(&self) -> &[CustomStyle] {
        &self.custom_styles
    }

    /// Styles whose type is none of paragraph, character, table, numbering.
    pub fn unclassified_styles(&self) -> &[Style] {
        &self.unclassified
    }

    /// Check if the catalog holds no styles at all.
    pub fn is_empty(&self) -> bool {
        self.paragraph.styles.is_empty()
            && self.character.styles.is_empty()
            && self.table.styles.is_empty()
            && self.numbering.is_empty()
            && self.unclassified.is_empty()
    }
}
