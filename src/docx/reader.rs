//! The package assembler.

use crate::container::{OoxmlContainer, PartPath};
use crate::error::{Error, Result};
use crate::model::{Comment, Document, Note, NoteType, Notes};
use crate::xml::{XmlElement, XmlNode};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::body::{BodyContext, BodyOutput, BodyReader, DocxBodyReader, Files};
use super::content_types::ContentTypes;
use super::notes::{read_comments, read_notes, PartItems};
use super::numbering::NumberingCatalog;
use super::package::{Package, CONTENT_TYPES_PATH};
use super::part_locator::{find_part_paths, PartPaths};
use super::styles::{CustomStyle, StyleCatalog};

/// Word's hidden bookmark marking the last edit position.
pub const GO_BACK_BOOKMARK: &str = "_GoBack";

/// Options for reading a package.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Directory that externally linked files are resolved against
    pub base_path: Option<PathBuf>,

    /// Bookmark names left out of the document
    pub ignored_bookmarks: Vec<String>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            base_path: None,
            ignored_bookmarks: vec![GO_BACK_BOOKMARK.to_string()],
        }
    }
}

impl ReadOptions {
    /// Create default read options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory linked files are resolved against.
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Replace the list of ignored bookmark names.
    pub fn with_ignored_bookmarks<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_bookmarks = names.into_iter().map(Into::into).collect();
        self
    }
}

/// Everything read from a package.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResult {
    /// The assembled document, with notes and comments attached
    pub document: Document,

    /// Style catalog the document was resolved against
    #[serde(skip)]
    pub styles: Arc<StyleCatalog>,

    /// Numbering catalog the document was resolved against
    #[serde(skip)]
    pub numbering: Arc<NumberingCatalog>,

    /// User-defined styles with resolved properties
    pub custom_styles: Vec<CustomStyle>,

    /// Footnotes in declaration order
    #[serde(skip)]
    pub footnotes: Vec<Note>,

    /// Endnotes in declaration order
    #[serde(skip)]
    pub endnotes: Vec<Note>,

    /// Comments in declaration order
    #[serde(skip)]
    pub comments: Vec<Comment>,

    #[serde(skip)]
    pub content_types: Arc<ContentTypes>,

    /// Where each part was found
    pub part_paths: PartPaths,

    /// Problems that did not stop the read
    pub warnings: Vec<String>,
}

impl DocumentResult {
    /// Pretty-printed JSON of the document, custom styles, part paths, and
    /// warnings.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Single-line JSON.
    pub fn to_json_compact(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Raw text of the document body.
    pub fn raw_text(&self) -> String {
        self.document.raw_text()
    }
}

/// Catalogs shared by every body-bearing part.
#[derive(Clone)]
struct Catalogs {
    content_types: Arc<ContentTypes>,
    numbering: Arc<NumberingCatalog>,
    styles: Arc<StyleCatalog>,
}

/// Reader for DOCX (Word) packages.
///
/// Stages run in dependency order: content types and part discovery,
/// then styles, then numbering, then notes and comments, then the main
/// document. Independent stages within a step run concurrently and the
/// first failure aborts the read.
pub struct DocxReader {
    package: Package,
    options: ReadOptions,
    body_reader: Arc<dyn BodyReader>,
}

impl DocxReader {
    /// Create a reader over a package.
    pub fn new(package: Package) -> Self {
        Self {
            package,
            options: ReadOptions::default(),
            body_reader: Arc::new(DocxBodyReader),
        }
    }

    /// Open a DOCX file. Linked files resolve against its directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let container = OoxmlContainer::open(path)?;
        let mut reader = Self::new(Package::new(Arc::new(container)));
        if let Some(parent) = path.parent() {
            reader.options.base_path = Some(parent.to_path_buf());
        }
        Ok(reader)
    }

    /// Create a reader from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let container = OoxmlContainer::from_bytes(data)?;
        Ok(Self::new(Package::new(Arc::new(container))))
    }

    /// Replace the read options.
    pub fn with_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the body reader.
    pub fn with_body_reader(mut self, body_reader: Arc<dyn BodyReader>) -> Self {
        self.body_reader = body_reader;
        self
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Read the package into a document.
    pub async fn read(&self) -> Result<DocumentResult> {
        let (content_types, part_paths) =
            tokio::try_join!(self.read_content_types(), find_part_paths(&self.package))?;
        debug!(main_document = %part_paths.main_document, "located main document");

        let styles = self.read_styles(&part_paths.styles).await?;
        let numbering = self
            .read_numbering(&part_paths.numbering, Arc::clone(&styles))
            .await?;
        let catalogs = Catalogs {
            content_types: Arc::new(content_types),
            numbering,
            styles,
        };

        let (footnotes, endnotes, comments) = tokio::try_join!(
            self.read_notes_part(&part_paths.footnotes, NoteType::Footnote, &catalogs),
            self.read_notes_part(&part_paths.endnotes, NoteType::Endnote, &catalogs),
            self.read_comments_part(&part_paths.comments, &catalogs),
        )?;

        let body = self
            .read_main_document(&part_paths.main_document, &catalogs)
            .await?;

        let mut warnings = Vec::new();
        warnings.extend(footnotes.warnings);
        warnings.extend(endnotes.warnings);
        warnings.extend(comments.warnings);
        warnings.extend(body.warnings);
        for message in &warnings {
            warn!("{}", message);
        }

        let notes = Notes::new(
            footnotes
                .items
                .iter()
                .chain(endnotes.items.iter())
                .cloned(),
        );
        let document = Document::new(body.nodes, notes, comments.items.clone());

        Ok(DocumentResult {
            document,
            custom_styles: catalogs.styles.custom_styles().to_vec(),
            styles: catalogs.styles,
            numbering: catalogs.numbering,
            footnotes: footnotes.items,
            endnotes: endnotes.items,
            comments: comments.items,
            content_types: catalogs.content_types,
            part_paths,
            warnings,
        })
    }

    async fn read_content_types(&self) -> Result<ContentTypes> {
        let root = self.package.read_xml(&PartPath::new(CONTENT_TYPES_PATH)).await?;
        Ok(match root {
            Some(root) => ContentTypes::from_xml(&root),
            None => {
                debug!("no content types part");
                ContentTypes::default()
            }
        })
    }

    async fn read_styles(&self, path: &PartPath) -> Result<Arc<StyleCatalog>> {
        let Some(root) = self.package.read_xml(path).await? else {
            debug!(part = %path, "no styles part, using empty catalog");
            return Ok(StyleCatalog::empty());
        };
        let catalog = tokio::task::spawn_blocking(move || StyleCatalog::from_xml(&root)).await??;
        Ok(Arc::new(catalog))
    }

    async fn read_numbering(
        &self,
        path: &PartPath,
        styles: Arc<StyleCatalog>,
    ) -> Result<Arc<NumberingCatalog>> {
        let Some(root) = self.package.read_xml(path).await? else {
            debug!(part = %path, "no numbering part, using empty catalog");
            return Ok(NumberingCatalog::empty());
        };
        let catalog =
            tokio::task::spawn_blocking(move || NumberingCatalog::from_xml(&root, styles)).await?;
        Ok(Arc::new(catalog))
    }

    async fn body_context(&self, path: &PartPath, catalogs: &Catalogs) -> Result<BodyContext> {
        Ok(BodyContext {
            part_path: path.clone(),
            relationships: self.package.read_relationships(path).await?,
            content_types: Arc::clone(&catalogs.content_types),
            numbering: Arc::clone(&catalogs.numbering),
            styles: Arc::clone(&catalogs.styles),
            files: Files::new(self.options.base_path.clone()),
            ignored_bookmarks: self.options.ignored_bookmarks.clone(),
        })
    }

    async fn read_notes_part(
        &self,
        path: &PartPath,
        note_type: NoteType,
        catalogs: &Catalogs,
    ) -> Result<PartItems<Note>> {
        let Some(root) = self.package.read_xml(path).await? else {
            debug!(part = %path, note_type = note_type.as_str(), "no notes part");
            return Ok(PartItems::default());
        };
        let context = self.body_context(path, catalogs).await?;
        let body_reader = Arc::clone(&self.body_reader);
        let notes = tokio::task::spawn_blocking(move || {
            read_notes(&root, note_type, body_reader.as_ref(), &context)
        })
        .await?;
        Ok(notes)
    }

    async fn read_comments_part(
        &self,
        path: &PartPath,
        catalogs: &Catalogs,
    ) -> Result<PartItems<Comment>> {
        let Some(root) = self.package.read_xml(path).await? else {
            debug!(part = %path, "no comments part");
            return Ok(PartItems::default());
        };
        let context = self.body_context(path, catalogs).await?;
        let body_reader = Arc::clone(&self.body_reader);
        let comments = tokio::task::spawn_blocking(move || {
            read_comments(&root, body_reader.as_ref(), &context)
        })
        .await?;
        Ok(comments)
    }

    async fn read_main_document(&self, path: &PartPath, catalogs: &Catalogs) -> Result<BodyOutput> {
        let root = self.package.read_xml(path).await?.ok_or_else(|| {
            Error::InvalidPackage(format!("main document part '{}' is empty", path))
        })?;
        let body = take_body(root).ok_or_else(|| {
            Error::InvalidPackage(format!("main document part '{}' has no w:body", path))
        })?;

        let context = self.body_context(path, catalogs).await?;
        let body_reader = Arc::clone(&self.body_reader);
        let output = tokio::task::spawn_blocking(move || {
            body_reader.read_body(&context, &body.children)
        })
        .await?;
        Ok(output)
    }
}

impl std::fmt::Debug for DocxReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocxReader")
            .field("package", &self.package)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Move the `w:body` element out of a document root.
fn take_body(root: XmlElement) -> Option<XmlElement> {
    root.children.into_iter().find_map(|node| match node {
        XmlNode::Element(element) if element.name == "w:body" => Some(element),
        _ => None,
    })
}
