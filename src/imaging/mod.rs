//! Image access: metadata readers and the image editor.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Type sniffing** | magic bytes ([`ImageType::sniff`]) |
//! | **IPTC metadata** | custom parser (JPEG APP13 + TIFF IFD) |
//! | **EXIF metadata** | `kamadak-exif` |
//! | **Resize / crop** | `image`, Lanczos3 |
//! | **Encode** | `image`, source format, JPEG at [`Quality`] |
//!
//! The module is split into:
//! - **Readers**: [`MetadataReader`] trait + [`FileMetadataReader`], on top of
//!   [`iptc_parser`] and [`exif_reader`]
//! - **Editor**: [`EditorFactory`] / [`ImageEditor`] traits + [`RustEditorFactory`]
//! - **Calculations**: Pure functions for resize geometry (unit testable)
//! - **Parameters**: Encoding settings

pub mod calculations;
pub mod editor;
pub mod exif_reader;
pub mod iptc_parser;
pub mod params;
pub mod reader;
pub mod rust_editor;

pub use calculations::{ResizeGeometry, constrain_dimensions, resize_geometry};
pub use editor::{EditorError, EditorFactory, ImageEditor, SavedImage};
pub use exif_reader::ExifTags;
pub use iptc_parser::{IptcTag, IptcTags};
pub use params::Quality;
pub use reader::{FileMetadataReader, ImageType, MetadataReader};
pub use rust_editor::{RustEditorFactory, RustImageEditor, supported_input_extensions};
