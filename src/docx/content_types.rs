//! The package content-types table (`[Content_Types].xml`).

use crate::xml::XmlElement;
use std::collections::HashMap;

/// Image extensions recognised even when the package declares no default.
const FALLBACK_IMAGE_TYPES: &[(&str, &str)] = &[
    ("png", "png"),
    ("gif", "gif"),
    ("jpeg", "jpeg"),
    ("jpg", "jpeg"),
    ("tif", "tiff"),
    ("tiff", "tiff"),
    ("bmp", "bmp"),
];

/// Content types by part path and by extension.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    overrides: HashMap<String, String>,
    extension_defaults: HashMap<String, String>,
}

impl ContentTypes {
    /// Read `content-types:Default` and `content-types:Override` entries.
    pub fn from_xml(root: &XmlElement) -> Self {
        let mut types = ContentTypes::default();
        for child in root.child_elements() {
            match child.name.as_str() {
                "content-types:Default" => {
                    if let (Some(extension), Some(content_type)) =
                        (child.attribute("Extension"), child.attribute("ContentType"))
                    {
                        types
                            .extension_defaults
                            .insert(extension.to_string(), content_type.to_string());
                    }
                }
                "content-types:Override" => {
                    if let (Some(part_name), Some(content_type)) =
                        (child.attribute("PartName"), child.attribute("ContentType"))
                    {
                        let part_name = part_name.strip_prefix('/').unwrap_or(part_name);
                        types
                            .overrides
                            .insert(part_name.to_string(), content_type.to_string());
                    }
                }
                _ => {}
            }
        }
        types
    }

    /// Content type of a part: override, then extension default, then
    /// the image fallback table.
    pub fn find_content_type(&self, path: &str) -> Option<String> {
        if let Some(content_type) = self.overrides.get(path) {
            return Some(content_type.clone());
        }

        let extension = path.rsplit('.').next().unwrap_or(path);
        if let Some(content_type) = self.extension_defaults.get(extension) {
            return Some(content_type.clone());
        }

        let lower = extension.to_lowercase();
        FALLBACK_IMAGE_TYPES
            .iter()
            .find(|(ext, _)| *ext == lower)
            .map(|(_, subtype)| format!("image/{}", subtype))
    }
}
