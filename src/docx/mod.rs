//! DOCX (Word) package reading.
//!
//! This module resolves the parts of an Office Open XML word-processing
//! package through its relationships, builds the style and numbering
//! catalogs, and assembles the document tree.

pub mod body;
pub mod content_types;
pub mod notes;
pub mod numbering;
pub mod package;
pub mod part_locator;
pub mod reader;
pub mod relationships;
pub mod styles;

pub use body::{BodyContext, BodyOutput, BodyReader, DocxBodyReader, Files};
pub use content_types::ContentTypes;
pub use numbering::NumberingCatalog;
pub use package::Package;
pub use part_locator::{find_part_path, find_part_paths, PartPaths};
pub use reader::{DocumentResult, DocxReader, ReadOptions};
pub use relationships::{Relationship, Relationships};
pub use styles::{
    CustomStyle, EffectiveProperties, NumberingReference, PropertyValue, Style, StyleCatalog,
    StyleProperties, StyleType,
};
