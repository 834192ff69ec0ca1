//! Error types for the docxtree library.

use std::io;
use thiserror::Error;

/// Result type alias for docxtree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a package.
///
/// Only [`Error::InvalidPackage`] is expected for well-formed input that
/// simply lacks its main document; every optional part degrades to a
/// default value instead of surfacing an error.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reading ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// The main document part could not be located or read.
    #[error("not a valid package: {0}")]
    InvalidPackage(String),

    /// A part that was expected to exist could not be opened.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// A `basedOn` chain loops back on itself.
    #[error("Style inheritance cycle in {style_type} styles: {chain}")]
    StyleCycle {
        /// Style family the cycle was found in
        style_type: String,
        /// The chain of style ids, ending with the repeated id
        chain: String,
    },

    /// A background parsing task failed to complete.
    #[error("Task error: {0}")]
    Task(String),

    /// Error serializing the document model.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Task(err.to_string())
    }
}
