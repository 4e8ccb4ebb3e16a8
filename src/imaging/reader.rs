//! Binary-metadata reader capability.
//!
//! The extractor never touches file bytes itself; it asks a
//! [`MetadataReader`] for three things:
//!
//! - the IPTC datasets ([`IptcTags`]),
//! - the EXIF dictionary ([`ExifTags`]),
//! - the container type ([`ImageType`]), which gates the EXIF pass.
//!
//! Each answer may be absent. A reader without a given capability simply
//! returns `None` for it. [`FileMetadataReader`] is the production reader.

use super::exif_reader::{self, ExifTags};
use super::iptc_parser::{self, IptcTags};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Image container type, as sniffed from the leading bytes.
///
/// TIFF is split by byte order because EXIF support has historically been
/// tracked per byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageType {
    Gif,
    Jpeg,
    Png,
    Bmp,
    #[serde(rename = "tiff-le")]
    TiffLittleEndian,
    #[serde(rename = "tiff-be")]
    TiffBigEndian,
    Webp,
}

impl ImageType {
    /// Types whose EXIF block the extractor reads unless configured otherwise.
    pub const EXIF_DEFAULTS: [ImageType; 3] = [
        ImageType::Jpeg,
        ImageType::TiffLittleEndian,
        ImageType::TiffBigEndian,
    ];

    /// Identify a container from its first bytes (12 are enough for all types).
    pub fn sniff(header: &[u8]) -> Option<ImageType> {
        match header {
            [0xFF, 0xD8, 0xFF, ..] => Some(ImageType::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(ImageType::Png),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(ImageType::Gif),
            [b'B', b'M', ..] => Some(ImageType::Bmp),
            [b'I', b'I', 0x2A, 0x00, ..] => Some(ImageType::TiffLittleEndian),
            [b'M', b'M', 0x00, 0x2A, ..] => Some(ImageType::TiffBigEndian),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => {
                Some(ImageType::Webp)
            }
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageType::Gif => "image/gif",
            ImageType::Jpeg => "image/jpeg",
            ImageType::Png => "image/png",
            ImageType::Bmp => "image/bmp",
            ImageType::TiffLittleEndian | ImageType::TiffBigEndian => "image/tiff",
            ImageType::Webp => "image/webp",
        }
    }
}

/// Source of raw IPTC/EXIF tags and image type for a file.
pub trait MetadataReader {
    /// IPTC datasets, or `None` when absent or unsupported.
    fn read_iptc(&self, path: &Path) -> Option<IptcTags>;

    /// EXIF dictionary, or `None` when absent or unsupported.
    fn read_exif(&self, path: &Path) -> Option<ExifTags>;

    /// Container type, or `None` for unreadable or non-image files.
    fn detect_image_type(&self, path: &Path) -> Option<ImageType>;
}

/// Reads metadata straight from files on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileMetadataReader;

impl MetadataReader for FileMetadataReader {
    fn read_iptc(&self, path: &Path) -> Option<IptcTags> {
        iptc_parser::read_iptc(path)
    }

    fn read_exif(&self, path: &Path) -> Option<ExifTags> {
        exif_reader::read_exif(path)
    }

    fn detect_image_type(&self, path: &Path) -> Option<ImageType> {
        let mut header = [0u8; 12];
        let mut file = std::fs::File::open(path).ok()?;
        let mut filled = 0;
        while filled < header.len() {
            match file.read(&mut header[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(_) => return None,
            }
        }
        ImageType::sniff(&header[..filled])
    }
}
