//! Async part reading over an [`Archive`].

use crate::container::{Archive, PartPath};
use crate::error::{Error, Result};
use crate::xml::XmlElement;
use std::sync::Arc;
use tracing::debug;

use super::relationships::Relationships;

/// Well-known package-level relationships part.
pub const PACKAGE_RELATIONSHIPS_PATH: &str = "_rels/.rels";

/// Well-known content-types part.
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// A shared handle to an archive that reads parts as XML trees.
///
/// Inflating, decoding and tree building run on the blocking pool, so awaiting a
/// part never stalls the scheduler.
#[derive(Clone)]
pub struct Package {
    archive: Arc<dyn Archive>,
}

impl Package {
    /// Wrap an archive.
    pub fn new(archive: Arc<dyn Archive>) -> Self {
        Self { archive }
    }

    /// The underlying archive.
    pub fn archive(&self) -> &dyn Archive {
        self.archive.as_ref()
    }

    /// Check if a part exists.
    pub fn exists(&self, path: &PartPath) -> bool {
        self.archive.exists(path.as_str())
    }

    /// Read a part as an XML tree.
    ///
    /// Returns `None` when the part does not exist or is blank. Malformed
    /// XML is an error.
    pub async fn read_xml(&self, path: &PartPath) -> Result<Option<XmlElement>> {
        if !self.exists(path) {
            debug!(part = %path, "part not present");
            return Ok(None);
        }

        let archive = Arc::clone(&self.archive);
        let name = path.clone();
        let root = tokio::task::spawn_blocking(move || -> Result<Option<XmlElement>> {
            let xml = archive.read_xml(name.as_str())?;
            if xml.trim().is_empty() {
                return Ok(None);
            }
            XmlElement::parse(&xml).map(Some).map_err(|err| match err {
                Error::XmlParse(msg) => Error::XmlParse(format!("{}: {}", name, msg)),
                other => other,
            })
        })
        .await??;
        Ok(root)
    }

    /// Read the relationships of a part, or the empty table if it has none.
    pub async fn read_relationships(&self, part: &PartPath) -> Result<Relationships> {
        self.read_relationships_part(&part.relationships_path()).await
    }

    /// Read the package-level relationships (`_rels/.rels`).
    pub async fn read_package_relationships(&self) -> Result<Relationships> {
        self.read_relationships_part(&PartPath::new(PACKAGE_RELATIONSHIPS_PATH))
            .await
    }

    async fn read_relationships_part(&self, rels_path: &PartPath) -> Result<Relationships> {
        Ok(self
            .read_xml(rels_path)
            .await?
            .map(|root| Relationships::from_xml(&root))
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("entries", &self.archive.entries().len())
            .finish()
    }
}
