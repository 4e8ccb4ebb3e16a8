//! Shared types persisted in an attachment's metadata record.
//!
//! The record is owned durably by an [`AssetStore`](crate::store::AssetStore)
//! and in memory by one [`SizeRegistrar`](crate::registrar::SizeRegistrar)
//! at a time. Its JSON shape is part of the external contract:
//!
//! ```json
//! {
//!   "width": 4000,
//!   "height": 3000,
//!   "file": "2024/05/sunset.jpg",
//!   "sizes": {
//!     "thumbnail": { "width": 150, "height": 150, "file": "sunset-150x150.jpg", "mime-type": "image/jpeg" }
//!   },
//!   "image_meta": { "title": "Sunset", "...": "..." }
//! }
//! ```
//!
//! Size entries never carry an absolute path: records move between machines
//! and storage roots, so only the file name relative to the original is kept.

use crate::metadata::ImageMetadataFields;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque attachment identifier.
///
/// What the identifier means is up to the [`AssetStore`](crate::store::AssetStore);
/// [`JsonAssetStore`](crate::store::JsonAssetStore) uses a path relative to
/// its library root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(String);

impl AttachmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttachmentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A stored size variant: what remains of a [`SavedImage`](crate::imaging::SavedImage)
/// once its absolute path is stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeDescriptor {
    pub width: u32,
    pub height: u32,
    /// File name of the encoded variant, relative to the original.
    pub file: String,
    #[serde(rename = "mime-type")]
    pub mime_type: String,
}

/// Per-attachment metadata record.
///
/// Only `sizes` is interpreted by the registrar. The original's dimensions,
/// file reference and extracted `image_meta` are filled in by
/// [`import_attachment`](crate::import::import_attachment). Any other keys
/// found in a stored record are kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Size name → descriptor. Keys are unique; the last successful store wins.
    #[serde(default)]
    pub sizes: BTreeMap<String, SizeDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_meta: Option<ImageMetadataFields>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MetadataRecord {
    pub fn has_size(&self, name: &str) -> bool {
        self.sizes.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thumb() -> SizeDescriptor {
        SizeDescriptor {
            width: 150,
            height: 150,
            file: "sunset-150x150.jpg".into(),
            mime_type: "image/jpeg".into(),
        }
    }

    #[test]
    fn size_descriptor_uses_hyphenated_mime_key() {
        let json = serde_json::to_value(thumb()).unwrap();
        assert_eq!(json["mime-type"], "image/jpeg");
        assert!(json.get("mime_type").is_none());
        assert!(json.get("path").is_none());
    }

    #[test]
    fn empty_record_serializes_only_sizes() {
        let json = serde_json::to_string(&MetadataRecord::default()).unwrap();
        assert_eq!(json, r#"{"sizes":{}}"#);
    }

    #[test]
    fn record_preserves_unknown_fields() {
        let json = r#"{"sizes":{},"alt_text":"a red door","custom":{"n":3}}"#;
        let record: MetadataRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.extra["alt_text"], "a red door");

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["custom"]["n"], 3);
    }

    #[test]
    fn record_without_sizes_key_loads_empty_map() {
        let record: MetadataRecord = serde_json::from_str(r#"{"width":10}"#).unwrap();
        assert_eq!(record.width, Some(10));
        assert!(record.sizes.is_empty());
    }

    #[test]
    fn has_size_checks_names() {
        let mut record = MetadataRecord::default();
        record.sizes.insert("thumbnail".into(), thumb());
        assert!(record.has_size("thumbnail"));
        assert!(!record.has_size("large"));
    }

    #[test]
    fn attachment_id_displays_raw_value() {
        let id = AttachmentId::from("2024/05/sunset.jpg");
        assert_eq!(id.to_string(), "2024/05/sunset.jpg");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""2024/05/sunset.jpg""#);
    }
}
