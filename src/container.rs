//! ZIP container abstraction for OOXML packages.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use std::sync::Mutex;

/// Read access to the entries of a package.
///
/// Paths are archive-relative and slash-separated, without a leading `/`.
pub trait Archive: Send + Sync {
    /// Check if an entry exists.
    fn exists(&self, path: &str) -> bool;

    /// Read the raw bytes of an entry.
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// List all entry names.
    fn entries(&self) -> Vec<String>;

    /// Read an entry as XML text, handling UTF-8 and UTF-16 encodings.
    fn read_xml(&self, path: &str) -> Result<String> {
        decode_xml_bytes(&self.read(path)?)
    }
}

/// A normalized, archive-relative part path.
///
/// A leading `/` is stripped and `.`/`..` segments are collapsed, so two
/// paths naming the same entry compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartPath(String);

impl PartPath {
    /// Create a normalized part path.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(normalize(path.as_ref()))
    }

    /// Join a relationship target onto a base directory.
    ///
    /// Absolute targets (leading `/`) ignore the base.
    ///
    /// ```
    /// use docxtree::PartPath;
    ///
    /// assert_eq!(PartPath::join("word", "styles.xml").as_str(), "word/styles.xml");
    /// assert_eq!(PartPath::join("word", "/custom/styles.xml").as_str(), "custom/styles.xml");
    /// assert_eq!(PartPath::join("word", "../media/a.png").as_str(), "media/a.png");
    /// ```
    pub fn join(base: &str, target: &str) -> Self {
        if target.starts_with('/') || base.is_empty() {
            Self::new(target)
        } else {
            Self::new(format!("{}/{}", base, target))
        }
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory part of the path (empty at the package root).
    pub fn dirname(&self) -> &str {
        match self.0.rfind('/') {
            Some(index) => &self.0[..index],
            None => "",
        }
    }

    /// File name part of the path.
    pub fn basename(&self) -> &str {
        match self.0.rfind('/') {
            Some(index) => &self.0[index + 1..],
            None => &self.0,
        }
    }

    /// Path of the `.rels` part holding this part's relationships.
    pub fn relationships_path(&self) -> PartPath {
        let rels = format!("_rels/{}.rels", self.basename());
        PartPath::join(self.dirname(), &rels)
    }
}

impl std::fmt::Display for PartPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PartPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Fix XML encoding declaration from UTF-16 to UTF-8.
///
/// When we decode UTF-16 XML to a Rust String (UTF-8), the XML declaration
/// still says encoding="UTF-16", which quick-xml would try to honour.
fn fix_xml_encoding_declaration(content: &str) -> String {
    if content.starts_with("<?xml") {
        if let Some(end_decl) = content.find("?>") {
            let decl = &content[..end_decl + 2];
            let rest = &content[end_decl + 2..];

            let fixed_decl = decl
                .replace("encoding=\"UTF-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='UTF-16'", "encoding='UTF-8'")
                .replace("encoding=\"utf-16\"", "encoding=\"UTF-8\"")
                .replace("encoding='utf-16'", "encoding='UTF-8'");

            return format!("{}{}", fixed_decl, rest);
        }
    }
    content.to_string()
}

/// Decode XML bytes handling different encodings (UTF-8, UTF-16 LE/BE).
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    if bytes.len() >= 3 && bytes[0] == 0xEF && bytes[1] == 0xBB && bytes[2] == 0xBF {
        return String::from_utf8(bytes[3..].to_vec())
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)));
    }

    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xFE {
        let content = decode_utf16_le(&bytes[2..])?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let content = decode_utf16_be(&bytes[2..])?;
        return Ok(fix_xml_encoding_declaration(&content));
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(s) => Ok(s),
        Err(_) => {
            // UTF-16 without BOM: ASCII markup leaves zero bytes in every other slot
            if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 {
                decode_utf16_le(bytes).map(|s| fix_xml_encoding_declaration(&s))
            } else if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 {
                decode_utf16_be(bytes).map(|s| fix_xml_encoding_declaration(&s))
            } else {
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

fn decode_utf16_le(bytes: &[u8]) -> Result<String> {
    let len = bytes.len() & !1;

    let u16_iter = (0..len)
        .step_by(2)
        .map(|i| u16::from_le_bytes([bytes[i], bytes[i + 1]]));

    char::decode_utf16(u16_iter)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn decode_utf16_be(bytes: &[u8]) -> Result<String> {
    let len = bytes.len() & !1;

    let u16_iter = (0..len)
        .step_by(2)
        .map(|i| u16::from_be_bytes([bytes[i], bytes[i + 1]]));

    char::decode_utf16(u16_iter)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// OOXML package backed by an in-memory ZIP archive.
pub struct OoxmlContainer {
    archive: Mutex<zip::ZipArchive<Cursor<Vec<u8>>>>,
    names: HashSet<String>,
}

impl OoxmlContainer {
    /// Open an OOXML container from a file path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use docxtree::container::OoxmlContainer;
    ///
    /// let container = OoxmlContainer::open("document.docx")?;
    /// # Ok::<(), docxtree::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Create an OOXML container from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data))?;
        let names = archive.file_names().map(String::from).collect();
        Ok(Self {
            archive: Mutex::new(archive),
            names,
        })
    }

}

impl Archive for OoxmlContainer {
    fn exists(&self, path: &str) -> bool {
        self.names.contains(path)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let mut archive = self
            .archive
            .lock()
            .map_err(|_| Error::ZipArchive("archive lock poisoned".to_string()))?;
        let mut file = archive
            .by_name(path)
            .map_err(|_| Error::MissingComponent(path.to_string()))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    fn entries(&self) -> Vec<String> {
        let mut entries: Vec<String> = self.names.iter().cloned().collect();
        entries.sort();
        entries
    }
}

/// Unzipped entries held in memory, keyed by path.
impl Archive for BTreeMap<String, Vec<u8>> {
    fn exists(&self, path: &str) -> bool {
        self.contains_key(path)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.get(path)
            .cloned()
            .ok_or_else(|| Error::MissingComponent(path.to_string()))
    }

    fn entries(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}

impl std::fmt::Debug for OoxmlContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OoxmlContainer")
            .field("files", &self.names.len())
            .finish()
    }
}
