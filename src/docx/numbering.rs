//! DOCX numbering (list) definitions.

use crate::model::NumberingLevel;
use crate::xml::XmlElement;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};
use tracing::debug;

use super::styles::StyleCatalog;

static EMPTY_NUMBERING: LazyLock<Arc<NumberingCatalog>> =
    LazyLock::new(|| Arc::new(NumberingCatalog::from_xml(XmlElement::empty(), StyleCatalog::empty())));

/// Abstract numbering definition.
#[derive(Debug, Clone, Default)]
struct AbstractNum {
    /// Levels by index (0-8)
    levels: BTreeMap<u8, NumberingLevel>,
    /// Numbering style whose numbering this definition defers to
    num_style_link: Option<String>,
}

/// Per-level override inside a `w:num`.
#[derive(Debug, Clone, Default)]
struct LevelOverride {
    start: Option<u32>,
    level: Option<NumberingLevel>,
}

/// Concrete numbering instance.
#[derive(Debug, Clone)]
struct NumInstance {
    abstract_num_id: Option<String>,
    overrides: BTreeMap<u8, LevelOverride>,
}

/// Collection of numbering definitions from numbering.xml.
///
/// Read-only: list counters are a rendering concern.
#[derive(Debug, Clone)]
pub struct NumberingCatalog {
    abstract_nums: HashMap<String, AbstractNum>,
    instances: HashMap<String, NumInstance>,
    levels_by_paragraph_style: HashMap<String, NumberingLevel>,
    styles: Arc<StyleCatalog>,
}

impl NumberingCatalog {
    /// The canonical catalog with no definitions.
    pub fn empty() -> Arc<NumberingCatalog> {
        Arc::clone(&EMPTY_NUMBERING)
    }

    /// Build a catalog from the root of a numbering part.
    ///
    /// `styles` resolves `w:numStyleLink` indirections.
    pub fn from_xml(root: &XmlElement, styles: Arc<StyleCatalog>) -> Self {
        let mut abstract_nums = HashMap::new();
        let mut levels_by_paragraph_style = HashMap::new();

        for element in root.elements_by_tag_name("w:abstractNum") {
            let Some(id) = element.attribute("w:abstractNumId") else {
                continue;
            };
            let mut abstract_num = AbstractNum {
                num_style_link: element
                    .first_or_empty("w:numStyleLink")
                    .attribute("w:val")
                    .map(str::to_string),
                ..Default::default()
            };

            for lvl in element.elements_by_tag_name("w:lvl") {
                let level = read_level(lvl);
                if let Some(style_id) = &level.paragraph_style_id {
                    levels_by_paragraph_style.insert(style_id.clone(), level.clone());
                }
                match lvl.attribute("w:ilvl").and_then(|v| v.parse::<u8>().ok()) {
                    Some(index) => {
                        abstract_num.levels.insert(index, level);
                    }
                    None => {
                        debug!(abstract_num = id, "numbering level without w:ilvl");
                        abstract_num.levels.entry(0).or_insert(level);
                    }
                }
            }

            abstract_nums.insert(id.to_string(), abstract_num);
        }

        let mut instances = HashMap::new();
        for element in root.elements_by_tag_name("w:num") {
            let Some(num_id) = element.attribute("w:numId") else {
                continue;
            };
            let mut overrides = BTreeMap::new();
            for lvl_override in element.elements_by_tag_name("w:lvlOverride") {
                let Some(index) = lvl_override
                    .attribute("w:ilvl")
                    .and_then(|v| v.parse::<u8>().ok())
                else {
                    continue;
                };
                overrides.insert(
                    index,
                    LevelOverride {
                        start: lvl_override
                            .first_or_empty("w:startOverride")
                            .attribute("w:val")
                            .and_then(|v| v.parse().ok()),
                        level: lvl_override.first("w:lvl").map(read_level),
                    },
                );
            }
            instances.insert(
                num_id.to_string(),
                NumInstance {
                    abstract_num_id: element
                        .first_or_empty("w:abstractNumId")
                        .attribute("w:val")
                        .map(str::to_string),
                    overrides,
                },
            );
        }

        Self {
            abstract_nums,
            instances,
            levels_by_paragraph_style,
            styles,
        }
    }

    /// Find the level `level` of numbering instance `num_id`.
    ///
    /// Follows `w:numStyleLink` through the style catalog; an unresolvable
    /// or circular link yields `None`.
    pub fn find_level(&self, num_id: &str, level: u8) -> Option<NumberingLevel> {
        self.find_level_guarded(num_id, level, &mut Vec::new())
    }

    fn find_level_guarded<'a>(
        &'a self,
        num_id: &'a str,
        level: u8,
        visited: &mut Vec<&'a str>,
    ) -> Option<NumberingLevel> {
        if visited.contains(&num_id) {
            debug!(num_id, "circular numStyleLink");
            return None;
        }
        visited.push(num_id);

        let instance = self.instances.get(num_id)?;
        let abstract_num = self
            .abstract_nums
            .get(instance.abstract_num_id.as_deref()?)?;

        let mut found = match &abstract_num.num_style_link {
            None => abstract_num.levels.get(&level).cloned(),
            Some(link) => {
                let linked = self.styles.find_numbering_style_by_id(link)?.num_id.as_deref()?;
                self.find_level_guarded(linked, level, visited)
            }
        };

        if let Some(level_override) = instance.overrides.get(&level) {
            if let Some(replacement) = &level_override.level {
                found = Some(replacement.clone());
            }
            if let (Some(start), Some(found)) = (level_override.start, found.as_mut()) {
                found.start = start;
            }
        }
        found
    }

    /// Find the level bound to a paragraph style through `w:pStyle`.
    pub fn find_level_by_paragraph_style_id(&self, style_id: &str) -> Option<&NumberingLevel> {
        self.levels_by_paragraph_style.get(style_id)
    }

    /// Check if the catalog holds no numbering instances.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

fn read_level(lvl: &XmlElement) -> NumberingLevel {
    let format = lvl
        .first_or_empty("w:numFmt")
        .attribute("w:val")
        .map(str::to_string);
    NumberingLevel {
        level: lvl
            .attribute("w:ilvl")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        is_ordered: format.as_deref() != Some("bullet"),
        format,
        level_text: lvl
            .first_or_empty("w:lvlText")
            .attribute("w:val")
            .map(str::to_string),
        start: lvl
            .first_or_empty("w:start")
            .attribute("w:val")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1),
        paragraph_style_id: lvl
            .first_or_empty("w:pStyle")
            .attribute("w:val")
            .map(str::to_string),
    }
}
