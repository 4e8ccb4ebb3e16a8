//! Image-editor capability.
//!
//! Pixel work is delegated entirely: the registrar asks an [`EditorFactory`]
//! for an [`ImageEditor`] bound to one source file, then calls
//! [`resize`](ImageEditor::resize) and [`save`](ImageEditor::save). Neither
//! the geometry nor the encoding is the registrar's concern.
//!
//! The production implementation is
//! [`RustEditorFactory`](super::rust_editor::RustEditorFactory), built on the
//! `image` crate.

use crate::types::SizeDescriptor;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Editor failure. Cloneable so a failed acquisition can be memoized and
/// reported again on every later request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("attachment has no image file")]
    Unresolved,
    #[error("failed to load {path}: {message}")]
    Load { path: PathBuf, message: String },
    #[error("unsupported image: {0}")]
    Unsupported(String),
    #[error("resize failed: {0}")]
    Resize(String),
    #[error("save failed: {0}")]
    Save(String),
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    /// Absolute location of the written file. Never persisted.
    pub path: PathBuf,
    /// File name relative to the original.
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
}

impl SavedImage {
    /// A save result is usable only if it names a file and has a size.
    pub fn is_valid(&self) -> bool {
        !self.file.is_empty() && self.width > 0 && self.height > 0
    }

    /// Drop the absolute path, keeping what a metadata record stores.
    pub fn into_descriptor(self) -> SizeDescriptor {
        SizeDescriptor {
            width: self.width,
            height: self.height,
            file: self.file,
            mime_type: self.mime_type,
        }
    }
}

/// An image opened for editing.
pub trait ImageEditor {
    /// Scale to fit within `max_width` × `max_height` (0 = unbounded), or
    /// with `crop`, scale and centre-crop to exactly that box.
    fn resize(&mut self, max_width: u32, max_height: u32, crop: bool) -> Result<(), EditorError>;

    /// Encode the current image beside the original.
    fn save(&mut self) -> Result<SavedImage, EditorError>;
}

/// Opens editors for source files.
pub trait EditorFactory {
    type Editor: ImageEditor;

    fn acquire(&self, path: &Path) -> Result<Self::Editor, EditorError>;
}
