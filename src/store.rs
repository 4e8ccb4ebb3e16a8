//! Attachment storage and the size registry.
//!
//! Two capabilities the registrar consumes:
//!
//! - [`AssetStore`] resolves an attachment to its file and loads/saves its
//!   [`MetadataRecord`].
//! - [`SizeRegistry`] answers which size names are registered library-wide.
//!   [`LibraryConfig`](crate::config::LibraryConfig) is the usual registry.
//!
//! [`JsonAssetStore`] is the filesystem implementation. An attachment id is
//! a path relative to the library root, and its record lives in a JSON
//! sidecar next to the image:
//!
//! ```text
//! library/
//! ├── config.toml
//! └── 2024/
//!     ├── harbour.jpg
//!     ├── harbour.jpg.meta.json     # record for id "2024/harbour.jpg"
//!     ├── harbour-150x150.jpg
//!     └── harbour-300x200.jpg
//! ```

use crate::imaging::rust_editor::has_supported_extension;
use crate::types::{AttachmentId, MetadataRecord};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Suffix appended to an image's file name to form its record file.
pub const SIDECAR_SUFFIX: &str = ".meta.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("attachment {0} does not resolve to an image")]
    Unresolved(AttachmentId),
}

/// Durable home of attachments and their metadata records.
pub trait AssetStore {
    /// Absolute path of the attachment's image file, if it exists.
    fn resolve_attachment(&self, id: &AttachmentId) -> Option<PathBuf>;

    /// Load the attachment's record. Total: a missing record is the default.
    fn load_metadata(&self, id: &AttachmentId) -> MetadataRecord;

    fn save_metadata(&self, id: &AttachmentId, record: &MetadataRecord) -> Result<(), StoreError>;
}

/// Library-wide registered size names.
pub trait SizeRegistry {
    fn registered_size_names(&self) -> BTreeSet<String>;

    fn is_registered(&self, name: &str) -> bool {
        self.registered_size_names().contains(name)
    }
}

impl SizeRegistry for BTreeSet<String> {
    fn registered_size_names(&self) -> BTreeSet<String> {
        self.clone()
    }

    fn is_registered(&self, name: &str) -> bool {
        self.contains(name)
    }
}

/// Attachments as image files under a root directory, records as JSON sidecars.
#[derive(Debug, Clone)]
pub struct JsonAssetStore {
    root: PathBuf,
}

impl JsonAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record file for an image path.
    pub fn sidecar_for(image: &Path) -> PathBuf {
        let mut name = image.file_name().unwrap_or_default().to_os_string();
        name.push(SIDECAR_SUFFIX);
        image.with_file_name(name)
    }

    /// The id as a path below the root. Absolute ids and any `..`, `.` or
    /// prefix component are refused.
    fn relative_path(id: &AttachmentId) -> Option<PathBuf> {
        let path = Path::new(id.as_str());
        if id.as_str().is_empty()
            || !path
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(path.to_path_buf())
    }
}

impl AssetStore for JsonAssetStore {
    fn resolve_attachment(&self, id: &AttachmentId) -> Option<PathBuf> {
        let path = self.root.join(Self::relative_path(id)?);
        if has_supported_extension(&path) && path.is_file() {
            Some(path)
        } else {
            log::debug!("attachment {id} does not resolve under {}", self.root.display());
            None
        }
    }

    fn load_metadata(&self, id: &AttachmentId) -> MetadataRecord {
        let Some(image) = self.resolve_attachment(id) else {
            return MetadataRecord::default();
        };
        let path = Self::sidecar_for(&image);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return MetadataRecord::default(),
        };
        match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                log::debug!("ignoring unreadable record {}: {e}", path.display());
                MetadataRecord::default()
            }
        }
    }

    fn save_metadata(&self, id: &AttachmentId, record: &MetadataRecord) -> Result<(), StoreError> {
        let image = self
            .resolve_attachment(id)
            .ok_or_else(|| StoreError::Unresolved(id.clone()))?;
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(Self::sidecar_for(&image), json)?;
        Ok(())
    }
}
