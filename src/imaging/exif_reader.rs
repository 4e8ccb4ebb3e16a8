//! EXIF tag dictionary reader built on `kamadak-exif`.
//!
//! Only the tags the extractor consumes are copied out, keyed by their
//! conventional EXIF names. Every value is rendered as text the way
//! camera-facing tools print it:
//!
//! | EXIF type | Rendition |
//! |---|---|
//! | ASCII | raw bytes (encoding untouched) |
//! | RATIONAL / SRATIONAL | `"num/denom"` per component |
//! | BYTE / SHORT / LONG | decimal per component |
//! | UserComment | character-code prefix decoded (ASCII, UNICODE) |
//! | Windows XP tags | UTF-16LE decoded to UTF-8 |
//!
//! Multi-component tags (`ISOSpeedRatings` on some bodies) keep every
//! component; callers decide which one they want.

use kamadak_exif::{Context, Exif, In, Reader, Tag, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// EXIF tags by name, each with one or more text renditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifTags(BTreeMap<String, Vec<Vec<u8>>>);

impl ExifTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.0.entry(name.into()).or_default().push(value.into());
    }

    pub fn first(&self, name: &str) -> Option<&[u8]> {
        self.0.get(name)?.first().map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Windows Explorer "XP" tags live in IFD0 as UTF-16LE byte arrays.
const TAG_XP_TITLE: Tag = Tag(Context::Tiff, 0x9C9B);
const TAG_XP_COMMENT: Tag = Tag(Context::Tiff, 0x9C9C);
const TAG_XP_AUTHOR: Tag = Tag(Context::Tiff, 0x9C9D);

const FIELDS: &[(&str, Tag)] = &[
    ("Title", TAG_XP_TITLE),
    ("Comments", TAG_XP_COMMENT),
    ("Author", TAG_XP_AUTHOR),
    ("ImageDescription", Tag::ImageDescription),
    ("UserComment", Tag::UserComment),
    ("Artist", Tag::Artist),
    ("Copyright", Tag::Copyright),
    ("Model", Tag::Model),
    ("FNumber", Tag::FNumber),
    ("DateTimeDigitized", Tag::DateTimeDigitized),
    ("FocalLength", Tag::FocalLength),
    ("ISOSpeedRatings", Tag::PhotographicSensitivity),
    ("ExposureTime", Tag::ExposureTime),
    ("Orientation", Tag::Orientation),
];

/// Read the EXIF dictionary of a file.
///
/// Returns `None` if the file can't be opened or has no parsable EXIF block.
pub fn read_exif(path: &Path) -> Option<ExifTags> {
    let file = File::open(path)
        .inspect_err(|e| log::debug!("cannot open {} for EXIF: {e}", path.display()))
        .ok()?;
    let exif = Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .inspect_err(|e| log::debug!("no EXIF in {}: {e}", path.display()))
        .ok()?;
    Some(collect_tags(&exif))
}

fn collect_tags(exif: &Exif) -> ExifTags {
    let little_endian = exif.little_endian();
    let mut tags = ExifTags::new();

    for &(name, tag) in FIELDS {
        let Some(field) = exif.get_field(tag, In::PRIMARY) else {
            continue;
        };
        let rendered = if tag == Tag::UserComment {
            match &field.value {
                Value::Undefined(bytes, _) => vec![decode_user_comment(bytes, little_endian)],
                other => render_value(other),
            }
        } else if [TAG_XP_TITLE, TAG_XP_COMMENT, TAG_XP_AUTHOR].contains(&tag) {
            match &field.value {
                Value::Byte(bytes) => vec![decode_utf16(bytes, true)],
                other => render_value(other),
            }
        } else {
            render_value(&field.value)
        };

        for value in rendered {
            tags.insert(name, value);
        }
    }

    tags
}

/// Render each component of a value as text bytes.
fn render_value(value: &Value) -> Vec<Vec<u8>> {
    fn numbers<T: ToString>(values: &[T]) -> Vec<Vec<u8>> {
        values.iter().map(|v| v.to_string().into_bytes()).collect()
    }

    match value {
        Value::Ascii(parts) => parts.clone(),
        Value::Rational(parts) => parts
            .iter()
            .map(|r| format!("{}/{}", r.num, r.denom).into_bytes())
            .collect(),
        Value::SRational(parts) => parts
            .iter()
            .map(|r| format!("{}/{}", r.num, r.denom).into_bytes())
            .collect(),
        Value::Byte(v) => numbers(v),
        Value::Short(v) => numbers(v),
        Value::Long(v) => numbers(v),
        Value::SByte(v) => numbers(v),
        Value::SShort(v) => numbers(v),
        Value::SLong(v) => numbers(v),
        Value::Float(v) => numbers(v),
        Value::Double(v) => numbers(v),
        Value::Undefined(bytes, _) => vec![bytes.clone()],
        _ => Vec::new(),
    }
}

/// Decode a UserComment: 8-byte character code, then the text.
pub(crate) fn decode_user_comment(bytes: &[u8], little_endian: bool) -> Vec<u8> {
    if bytes.len() < 8 {
        return bytes.to_vec();
    }
    let (code, text) = bytes.split_at(8);
    match code {
        b"UNICODE\0" => decode_utf16(text, little_endian),
        // ASCII, JIS and the all-zero "undefined" code pass through as bytes.
        _ => text.to_vec(),
    }
}

/// Decode UTF-16 text up to the first NUL, as UTF-8 bytes.
pub(crate) fn decode_utf16(bytes: &[u8], little_endian: bool) -> Vec<u8> {
    let units = bytes.chunks_exact(2).map(|pair| {
        if little_endian {
            u16::from_le_bytes([pair[0], pair[1]])
        } else {
            u16::from_be_bytes([pair[0], pair[1]])
        }
    });
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .take_while(|&c| c != '\0')
        .collect::<String>()
        .into_bytes()
}
