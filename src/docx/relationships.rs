//! Relationship (`.rels`) parts.

use crate::xml::XmlElement;
use std::collections::HashMap;

/// A relationship entry from a .rels file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute) or external URI
    pub target: String,
    /// Whether the target is external to the package
    pub external: bool,
}

/// Relationships declared by one part.
///
/// The default value is the empty table used when a part has no `.rels`.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    by_id: HashMap<String, Relationship>,
    by_type: HashMap<String, Vec<Relationship>>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the `relationships:Relationship` children of a `.rels` root.
    pub fn from_xml(root: &XmlElement) -> Self {
        let mut rels = Relationships::new();
        for child in root.child_elements() {
            if child.name != "relationships:Relationship" {
                continue;
            }
            let Some(id) = child.attribute("Id") else {
                continue;
            };
            rels.add(Relationship {
                id: id.to_string(),
                rel_type: child.attribute("Type").unwrap_or_default().to_string(),
                target: child.attribute("Target").unwrap_or_default().to_string(),
                external: child
                    .attribute("TargetMode")
                    .is_some_and(|mode| mode.eq_ignore_ascii_case("external")),
            });
        }
        rels
    }

    /// Add a relationship, keeping declaration order within its type.
    pub fn add(&mut self, rel: Relationship) {
        self.by_type
            .entry(rel.rel_type.clone())
            .or_default()
            .push(rel.clone());
        self.by_id.insert(rel.id.clone(), rel);
    }

    /// Get a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Target of the relationship with the given ID.
    pub fn find_target_by_id(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(|rel| rel.target.as_str())
    }

    /// Targets of every relationship of the given type, in declaration
    /// order. Empty when none match.
    pub fn find_targets_by_type(&self, rel_type: &str) -> Vec<&str> {
        self.by_type
            .get(rel_type)
            .map(|rels| rels.iter().map(|rel| rel.target.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
