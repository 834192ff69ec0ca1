//! Locating package parts through relationships.

use crate::container::{Archive, PartPath};
use crate::error::{Error, Result};
use serde::Serialize;
use tracing::debug;

use super::package::Package;
use super::relationships::Relationships;

/// Prefix shared by the relationship types of main-document parts.
const RELATIONSHIP_TYPE_PREFIX: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/";

/// Relationship type of the main document part.
pub const OFFICE_DOCUMENT_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// Conventional path of the main document part.
pub const DEFAULT_MAIN_DOCUMENT_PATH: &str = "word/document.xml";

/// Resolved paths of the parts the reader consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartPaths {
    pub main_document: PartPath,
    pub comments: PartPath,
    pub endnotes: PartPath,
    pub footnotes: PartPath,
    pub numbering: PartPath,
    pub styles: PartPath,
}

/// Find the path of the part related by `rel_type`.
///
/// Every target of that type is joined to `base_path`; the first one that
/// exists in the archive wins. When none exists the fallback is returned
/// as-is, whether or not it exists: the reader that opens it substitutes
/// its own default.
pub fn find_part_path(
    archive: &dyn Archive,
    relationships: &Relationships,
    rel_type: &str,
    base_path: &str,
    fallback_path: &str,
) -> PartPath {
    relationships
        .find_targets_by_type(rel_type)
        .into_iter()
        .map(|target| PartPath::join(base_path, target))
        .find(|path| archive.exists(path.as_str()))
        .unwrap_or_else(|| {
            debug!(rel_type, fallback = fallback_path, "no related part found, using fallback");
            PartPath::new(fallback_path)
        })
}

/// Discover the main document and the parts related to it.
///
/// Fails with [`Error::InvalidPackage`] when the main document does not
/// exist; every other part path falls back to `word/<name>.xml`.
pub async fn find_part_paths(package: &Package) -> Result<PartPaths> {
    let package_relationships = package.read_package_relationships().await?;
    let main_document = find_part_path(
        package.archive(),
        &package_relationships,
        OFFICE_DOCUMENT_TYPE,
        "",
        DEFAULT_MAIN_DOCUMENT_PATH,
    );

    if !package.exists(&main_document) {
        return Err(Error::InvalidPackage(format!(
            "could not find main document part '{}'; are you sure this is a valid .docx file?",
            main_document
        )));
    }

    let document_relationships = package.read_relationships(&main_document).await?;
    let related = |name: &str| {
        find_part_path(
            package.archive(),
            &document_relationships,
            &format!("{}{}", RELATIONSHIP_TYPE_PREFIX, name),
            main_document.dirname(),
            &format!("word/{}.xml", name),
        )
    };

    Ok(PartPaths {
        comments: related("comments"),
        endnotes: related("endnotes"),
        footnotes: related("footnotes"),
        numbering: related("numbering"),
        styles: related("styles"),
        main_document,
    })
}
