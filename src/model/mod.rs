//! Semantic document model for word-processing documents.
//!
//! This module defines the plain value types the package reader produces.
//! Renderers consume these structures without any knowledge of the
//! package format; everything here is read-only once built.

mod document;
mod node;
mod notes;
mod paragraph;
mod table;

pub use document::*;
pub use node::*;
pub use notes::*;
pub use paragraph::*;
pub use table::*;
