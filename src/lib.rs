//! # Attachment Meta
//!
//! Descriptive metadata and size variants for image attachments.
//!
//! Two independent pieces of logic sit at the core:
//!
//! ```text
//! MetadataExtractor   file  →  IPTC + EXIF  →  ImageMetadataFields
//! SizeRegistrar       id    →  record + editor  →  sizes[name] persisted
//! ```
//!
//! The extractor never fails: missing or malformed segments just leave the
//! affected fields at their zero values. The registrar guards a size name
//! against two collision domains (names registered library-wide, and sizes
//! this attachment already has) before it hands the pixel work to an image
//! editor and files the result in the attachment's record.
//!
//! Everything outside that logic is a capability trait with a default
//! implementation, so either side can be swapped out:
//!
//! | Capability | Trait | Default |
//! |---|---|---|
//! | Read IPTC/EXIF, detect type | [`MetadataReader`](imaging::MetadataReader) | [`FileMetadataReader`](imaging::FileMetadataReader) |
//! | Resize and encode | [`EditorFactory`](imaging::EditorFactory) | [`RustEditorFactory`](imaging::RustEditorFactory) |
//! | Attachment files and records | [`AssetStore`](store::AssetStore) | [`JsonAssetStore`](store::JsonAssetStore) |
//! | Registered size names | [`SizeRegistry`](store::SizeRegistry) | [`LibraryConfig`](config::LibraryConfig) |
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`metadata`] | IPTC/EXIF extraction and merge into [`ImageMetadataFields`](metadata::ImageMetadataFields) |
//! | [`registrar`] | Per-attachment size registration with lazy record and editor |
//! | [`import`] | One-pass import: dimensions, metadata, every registered size |
//! | [`store`] | Asset store and size registry capabilities, JSON sidecar store |
//! | [`config`] | `config.toml` loading, validation, and merging over stock defaults |
//! | [`types`] | Persisted record shapes (`MetadataRecord`, `SizeDescriptor`) |
//! | [`imaging`] | Metadata readers, the image editor, resize geometry |
//!
//! # Example
//!
//! ```no_run
//! use attachment_meta::config::load_config;
//! use attachment_meta::imaging::RustEditorFactory;
//! use attachment_meta::import::import_attachment;
//! use attachment_meta::metadata::MetadataExtractor;
//! use attachment_meta::registrar::SizeRegistrar;
//! use attachment_meta::store::JsonAssetStore;
//! use std::path::Path;
//!
//! let root = Path::new("library");
//! let config = load_config(root)?;
//! let store = JsonAssetStore::new(root);
//! let editors = RustEditorFactory::new(config.quality());
//! let extractor = MetadataExtractor::new().with_exif_types(config.extract.exif_types.clone());
//!
//! let id = "2024/harbour.jpg".into();
//! let (record, report) = import_attachment(&store, &editors, &config, &extractor, &id)?;
//! println!("{}: {:?}", record.image_meta.unwrap_or_default().title, report.generated);
//!
//! let mut registrar = SizeRegistrar::new(id, &store, &editors, &config);
//! registrar.add_size("square-600", 600, 600, true, false)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod imaging;
pub mod import;
pub mod metadata;
pub mod registrar;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
