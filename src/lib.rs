//! # docxtree
//!
//! Semantic document trees from Office Open XML word-processing packages.
//!
//! This library locates the parts of a `.docx` package through its
//! relationships, resolves style inheritance and numbering definitions,
//! indexes footnotes, endnotes, and comments, and assembles a document
//! tree that renderers can consume without knowing the package format.
//!
//! ## Quick Start
//!
//! ```no_run
//! // Full read with access to styles and warnings
//! let result = docxtree::read_file("document.docx")?;
//! println!("Blocks: {}", result.document.children.len());
//! for warning in &result.warnings {
//!     eprintln!("{}", warning);
//! }
//!
//! // Raw text
//! let text = docxtree::extract_raw_text("document.docx")?;
//! println!("{}", text);
//! # Ok::<(), docxtree::Error>(())
//! ```
//!
//! ## Async API
//!
//! ```no_run
//! use docxtree::docx::{DocxReader, ReadOptions};
//!
//! # async fn run() -> docxtree::Result<()> {
//! let reader = DocxReader::open("report.docx")?
//!     .with_options(ReadOptions::new().with_base_path("/srv/reports"));
//! let result = reader.read().await?;
//! println!("{}", result.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod container;
pub mod docx;
pub mod error;
pub mod model;
pub mod xml;

// Re-exports
pub use container::{Archive, OoxmlContainer, PartPath};
pub use docx::{DocumentResult, DocxReader, ReadOptions, StyleCatalog};
pub use error::{Error, Result};
pub use model::{Comment, Document, Node, NodeKind, Note, NoteType, Notes};

use std::future::Future;
use std::path::Path;

/// Drive a read on a current-thread runtime.
fn block_on<F: Future<Output = Result<T>>, T>(future: F) -> Result<T> {
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    runtime.block_on(future)
}

/// Read a DOCX file.
///
/// Externally linked images resolve against the file's directory.
///
/// # Example
///
/// ```no_run
/// let result = docxtree::read_file("document.docx")?;
/// println!("Comments: {}", result.document.comments.len());
/// # Ok::<(), docxtree::Error>(())
/// ```
pub fn read_file(path: impl AsRef<Path>) -> Result<DocumentResult> {
    let reader = DocxReader::open(path)?;
    block_on(reader.read())
}

/// Read a DOCX package from bytes with the given options.
///
/// # Example
///
/// ```no_run
/// use docxtree::ReadOptions;
///
/// let data = std::fs::read("document.docx")?;
/// let result = docxtree::read_bytes(data, ReadOptions::default())?;
/// # Ok::<(), docxtree::Error>(())
/// ```
pub fn read_bytes(data: Vec<u8>, options: ReadOptions) -> Result<DocumentResult> {
    let reader = DocxReader::from_bytes(data)?.with_options(options);
    block_on(reader.read())
}

/// Extract the raw text of a DOCX file.
///
/// Each paragraph is followed by a blank line.
pub fn extract_raw_text(path: impl AsRef<Path>) -> Result<String> {
    Ok(read_file(path)?.raw_text())
}
