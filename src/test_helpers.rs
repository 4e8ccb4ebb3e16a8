//! Shared test utilities.
//!
//! Synthetic image writers and an in-memory [`MetadataReader`] so extraction
//! tests can state exactly which IPTC and EXIF values a file carries.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let reader = StaticReader::jpeg()
//!     .with_iptc(iptc_tags(&[(IptcTag::HEADLINE, b"Harbour")]))
//!     .with_exif(exif_tags(&[("Model", b"Canon EOS")]));
//! let fields = MetadataExtractor::with_reader(reader).extract(Path::new("/x.jpg"));
//! assert_eq!(fields.title, "Harbour");
//! ```

use std::path::Path;

use image::{ImageEncoder, RgbImage};

use crate::imaging::exif_reader::ExifTags;
use crate::imaging::iptc_parser::{IptcTag, IptcTags};
use crate::imaging::reader::{ImageType, MetadataReader};

// =========================================================================
// Synthetic files
// =========================================================================

/// Encode a gradient JPEG of the given size.
pub fn test_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Write a gradient JPEG with no metadata segments.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, test_jpeg_bytes(width, height)).unwrap();
}

/// Encode one IIM dataset.
pub fn iim_dataset(tag: IptcTag, value: &[u8]) -> Vec<u8> {
    let mut out = vec![0x1C, tag.record, tag.dataset];
    out.extend_from_slice(&(value.len() as u16).to_be_bytes());
    out.extend_from_slice(value);
    out
}

/// A small JPEG with `iim` wrapped in an APP13 Photoshop IPTC resource,
/// spliced in right after SOI.
pub fn jpeg_with_iptc(iim: &[u8]) -> Vec<u8> {
    let mut resource = b"Photoshop 3.0\0".to_vec();
    resource.extend_from_slice(b"8BIM");
    resource.extend_from_slice(&0x0404u16.to_be_bytes());
    // empty pascal name, padded to even
    resource.extend_from_slice(&[0, 0]);
    resource.extend_from_slice(&(iim.len() as u32).to_be_bytes());
    resource.extend_from_slice(iim);
    if iim.len() % 2 == 1 {
        resource.push(0);
    }

    let jpeg = test_jpeg_bytes(8, 8);
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xED]);
    out.extend_from_slice(&((resource.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&resource);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Write a JPEG carrying the given IPTC datasets.
pub fn write_jpeg_with_iptc(path: &Path, tags: &[(IptcTag, &[u8])]) {
    let iim: Vec<u8> = tags
        .iter()
        .flat_map(|(tag, value)| iim_dataset(*tag, value))
        .collect();
    std::fs::write(path, jpeg_with_iptc(&iim)).unwrap();
}

/// A small JPEG with an APP1 EXIF block holding `fields`, spliced in right
/// after SOI. The TIFF body is written little-endian.
pub fn jpeg_with_exif(fields: &[kamadak_exif::Field]) -> Vec<u8> {
    let mut writer = kamadak_exif::experimental::Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut tiff = std::io::Cursor::new(Vec::new());
    writer.write(&mut tiff, true).unwrap();

    let mut app1 = b"Exif\0\0".to_vec();
    app1.extend_from_slice(tiff.get_ref());

    let jpeg = test_jpeg_bytes(8, 8);
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// A primary-IFD EXIF field.
pub fn exif_field(tag: kamadak_exif::Tag, value: kamadak_exif::Value) -> kamadak_exif::Field {
    kamadak_exif::Field {
        tag,
        ifd_num: kamadak_exif::In::PRIMARY,
        value,
    }
}

/// UTF-16LE bytes with a trailing NUL, as Windows writes XP tags.
pub fn xp_text(value: &str) -> Vec<u8> {
    value
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

// =========================================================================
// In-memory metadata
// =========================================================================

pub fn iptc_tags(tags: &[(IptcTag, &[u8])]) -> IptcTags {
    let mut out = IptcTags::new();
    for (tag, value) in tags {
        out.insert(*tag, *value);
    }
    out
}

pub fn exif_tags(tags: &[(&str, &[u8])]) -> ExifTags {
    let mut out = ExifTags::new();
    for (name, value) in tags {
        out.insert(*name, *value);
    }
    out
}

/// [`MetadataReader`] that answers from fixed values regardless of path.
#[derive(Debug, Clone, Default)]
pub struct StaticReader {
    image_type: Option<ImageType>,
    iptc: Option<IptcTags>,
    exif: Option<ExifTags>,
}

impl StaticReader {
    pub fn jpeg() -> Self {
        Self::with_type(ImageType::Jpeg)
    }

    pub fn with_type(image_type: ImageType) -> Self {
        Self {
            image_type: Some(image_type),
            ..Self::default()
        }
    }

    pub fn with_iptc(mut self, tags: IptcTags) -> Self {
        self.iptc = Some(tags);
        self
    }

    pub fn with_exif(mut self, tags: ExifTags) -> Self {
        self.exif = Some(tags);
        self
    }
}

impl MetadataReader for StaticReader {
    fn read_iptc(&self, _path: &Path) -> Option<IptcTags> {
        self.iptc.clone()
    }

    fn read_exif(&self, _path: &Path) -> Option<ExifTags> {
        self.exif.clone()
    }

    fn detect_image_type(&self, _path: &Path) -> Option<ImageType> {
        self.image_type
    }
}
