//! Descriptive image metadata: IPTC and EXIF extraction and merge.
//!
//! Each image can carry descriptive fields in two embedded segments:
//!
//! - **IPTC** (JPEG APP13, TIFF IPTC-NAA): editorial fields typed in by a
//!   person: headline, object name, caption, credit, copyright, keywords.
//! - **EXIF**: capture parameters written by the camera (model, aperture,
//!   exposure, focal length, ISO) plus a few editorial tags (artist,
//!   copyright, image description, Windows "XP" title/comment/author).
//!
//! ## Precedence
//!
//! IPTC is read first, then EXIF refines or overrides it. EXIF is the more
//! structured source, so any EXIF value that is present wins; IPTC fills the
//! fields EXIF lacks (caption semantics, explicit credit wording, keywords).
//!
//! | Field | IPTC | EXIF (overrides when present) |
//! |---|---|---|
//! | title | Headline (2:105) → Object Name (2:05) | Title (XP) |
//! | caption | Caption-Abstract (2:120) | ImageDescription → Comments (XP) |
//! | credit | Credit (2:110) → By-line (2:80) | Artist → Author (XP) |
//! | copyright | Copyright Notice (2:116) | Copyright |
//! | created_timestamp | Date Created (2:55) + Time Created (2:60) | DateTimeDigitized |
//! | camera, aperture, focal_length, iso, shutter_speed, orientation | — | Model, FNumber, FocalLength, ISOSpeedRatings, ExposureTime, Orientation |
//! | keywords | Keywords (2:25) | — |
//!
//! ## Short captions are titles
//!
//! Many tools only expose a single "description" box, so a caption shorter
//! than [`TITLE_FROM_CAPTION_MAX`] characters found while no title is known is
//! taken as the title instead. Once a title exists, a caption is only kept
//! when it differs from it.
//!
//! ## Encoding
//!
//! Segment values are raw bytes. Text that is not valid UTF-8 is assumed to
//! be Latin-1 (what most legacy IPTC/EXIF writers produced) and re-encoded.
//!
//! ## Failure
//!
//! Extraction is total. A missing file, a missing or malformed segment, or an
//! unparsable value just leaves the affected fields at their zero values.

use crate::imaging::exif_reader::ExifTags;
use crate::imaging::iptc_parser::{IptcTag, IptcTags};
use crate::imaging::reader::{FileMetadataReader, ImageType, MetadataReader};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Captions shorter than this (in characters) become the title when none is set.
pub const TITLE_FROM_CAPTION_MAX: usize = 80;

/// Descriptive metadata extracted from an image.
///
/// Every field is always present; absent metadata leaves the zero value
/// (`0`, `""`, or `"0"` for the decimal-as-text fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageMetadataFields {
    pub aperture: f64,
    pub credit: String,
    pub camera: String,
    pub caption: String,
    /// Seconds since the Unix epoch (UTC).
    pub created_timestamp: i64,
    pub copyright: String,
    pub focal_length: String,
    pub iso: String,
    pub shutter_speed: String,
    pub title: String,
    pub orientation: u16,
    pub keywords: Vec<String>,
}

impl Default for ImageMetadataFields {
    fn default() -> Self {
        Self {
            aperture: 0.0,
            credit: String::new(),
            camera: String::new(),
            caption: String::new(),
            created_timestamp: 0,
            copyright: String::new(),
            focal_length: "0".to_string(),
            iso: "0".to_string(),
            shutter_speed: "0".to_string(),
            title: String::new(),
            orientation: 0,
            keywords: Vec::new(),
        }
    }
}

/// Caller-supplied adjustments around an extraction.
///
/// Every method has a pass-through default, so implementors override only
/// what they need.
pub trait ExtractHooks {
    /// Rewrite the path before anything is read.
    fn file_path(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }

    /// Adjust which image types get an EXIF pass.
    fn exif_image_types(&self, allowed: Vec<ImageType>) -> Vec<ImageType> {
        allowed
    }

    /// Post-process the assembled fields.
    fn finish(
        &self,
        fields: ImageMetadataFields,
        _path: &Path,
        _image_type: Option<ImageType>,
    ) -> ImageMetadataFields {
        fields
    }
}

/// Hooks that change nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl ExtractHooks for NoHooks {}

/// Extracts [`ImageMetadataFields`] from image files.
#[derive(Debug, Clone)]
pub struct MetadataExtractor<R = FileMetadataReader, H = NoHooks> {
    reader: R,
    hooks: H,
    exif_types: Vec<ImageType>,
}

impl MetadataExtractor {
    pub fn new() -> Self {
        Self::with_reader(FileMetadataReader)
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: MetadataReader> MetadataExtractor<R, NoHooks> {
    pub fn with_reader(reader: R) -> Self {
        Self {
            reader,
            hooks: NoHooks,
            exif_types: ImageType::EXIF_DEFAULTS.to_vec(),
        }
    }
}

impl<R: MetadataReader, H: ExtractHooks> MetadataExtractor<R, H> {
    pub fn with_hooks<H2: ExtractHooks>(self, hooks: H2) -> MetadataExtractor<R, H2> {
        MetadataExtractor {
            reader: self.reader,
            hooks,
            exif_types: self.exif_types,
        }
    }

    /// Replace the image types that get an EXIF pass.
    pub fn with_exif_types(mut self, types: impl IntoIterator<Item = ImageType>) -> Self {
        self.exif_types = types.into_iter().collect();
        self
    }

    /// Extract and merge IPTC and EXIF metadata from `path`. Never fails.
    pub fn extract(&self, path: &Path) -> ImageMetadataFields {
        let path = self.hooks.file_path(path);
        let image_type = self.reader.detect_image_type(&path);
        let mut raw = RawFields::default();

        match self.reader.read_iptc(&path) {
            Some(iptc) => raw.apply_iptc(&iptc),
            None => log::debug!("no IPTC block in {}", path.display()),
        }

        let allowed = self.hooks.exif_image_types(self.exif_types.clone());
        match image_type {
            Some(t) if allowed.contains(&t) => match self.reader.read_exif(&path) {
                Some(exif) => raw.apply_exif(&exif),
                None => log::debug!("no EXIF block in {}", path.display()),
            },
            Some(t) => log::debug!("skipping EXIF for {:?} image {}", t, path.display()),
            None => log::debug!("{} is not a recognized image", path.display()),
        }

        self.hooks.finish(raw.into_fields(), &path, image_type)
    }
}

// ============================================================================
// Merge
// ============================================================================

/// Fields while still in segment encoding.
#[derive(Debug, Default)]
struct RawFields {
    title: Vec<u8>,
    caption: Vec<u8>,
    credit: Vec<u8>,
    copyright: Vec<u8>,
    camera: Vec<u8>,
    iso: Vec<u8>,
    keywords: Vec<Vec<u8>>,
    aperture: f64,
    created_timestamp: i64,
    focal_length: Option<String>,
    shutter_speed: Option<String>,
    orientation: u16,
}

impl RawFields {
    fn apply_iptc(&mut self, iptc: &IptcTags) {
        if let Some(title) = first_text(&[
            iptc.first(IptcTag::HEADLINE),
            iptc.first(IptcTag::OBJECT_NAME),
        ]) {
            self.title = title;
        }

        if let Some(caption) = text(iptc.first(IptcTag::CAPTION)) {
            if self.title.is_empty() {
                if is_short(&caption) {
                    self.title = caption;
                } else {
                    self.caption = caption;
                }
            } else if caption != self.title {
                self.caption = caption;
            }
        }

        if let Some(credit) =
            first_text(&[iptc.first(IptcTag::CREDIT), iptc.first(IptcTag::BYLINE)])
        {
            self.credit = credit;
        }

        if let (Some(date), Some(time)) = (
            text(iptc.first(IptcTag::DATE_CREATED)),
            text(iptc.first(IptcTag::TIME_CREATED)),
        ) && let Some(ts) = iptc_timestamp(&date, &time)
        {
            self.created_timestamp = ts;
        }

        if let Some(copyright) = text(iptc.first(IptcTag::COPYRIGHT_NOTICE)) {
            self.copyright = copyright;
        }

        self.keywords = iptc
            .all(IptcTag::KEYWORDS)
            .iter()
            .filter_map(|k| text(Some(k.as_slice())))
            .collect();
    }

    fn apply_exif(&mut self, exif: &ExifTags) {
        if let Some(title) = text(exif.first("Title")) {
            self.title = title;
        }

        if let Some(description) = text(exif.first("ImageDescription")) {
            if self.title.is_empty() && is_short(&description) {
                self.title = description;
                if let Some(comment) = text(exif.first("UserComment"))
                    && comment != self.title
                {
                    self.caption = comment;
                }
            } else if description != self.title {
                self.caption = description;
            }
        } else if let Some(comments) = text(exif.first("Comments"))
            && comments != self.title
        {
            self.caption = comments;
        }

        if let Some(credit) = first_text(&[exif.first("Artist"), exif.first("Author")]) {
            self.credit = credit;
        }
        if let Some(copyright) = text(exif.first("Copyright")) {
            self.copyright = copyright;
        }
        if let Some(f_number) = ascii(exif.first("FNumber")) {
            self.aperture = round2(fraction_to_decimal(&f_number));
        }
        if let Some(model) = text(exif.first("Model")) {
            self.camera = model;
        }
        if let Some(ts) = ascii(exif.first("DateTimeDigitized")).and_then(|d| exif_timestamp(&d)) {
            self.created_timestamp = ts;
        }
        if let Some(focal) = ascii(exif.first("FocalLength")) {
            self.focal_length = Some(decimal_text(fraction_to_decimal(&focal)));
        }
        if let Some(iso) = text(exif.first("ISOSpeedRatings")) {
            self.iso = iso;
        }
        if let Some(exposure) = ascii(exif.first("ExposureTime")) {
            self.shutter_speed = Some(decimal_text(fraction_to_decimal(&exposure)));
        }
        if let Some(orientation) = ascii(exif.first("Orientation")).and_then(|o| o.parse().ok()) {
            self.orientation = orientation;
        }
    }

    fn into_fields(self) -> ImageMetadataFields {
        let zero = ImageMetadataFields::default();
        ImageMetadataFields {
            aperture: self.aperture,
            credit: normalize_encoding(self.credit),
            camera: normalize_encoding(self.camera),
            caption: normalize_encoding(self.caption),
            created_timestamp: self.created_timestamp,
            copyright: normalize_encoding(self.copyright),
            focal_length: self.focal_length.unwrap_or(zero.focal_length),
            iso: if self.iso.is_empty() {
                zero.iso
            } else {
                normalize_encoding(self.iso)
            },
            shutter_speed: self.shutter_speed.unwrap_or(zero.shutter_speed),
            title: normalize_encoding(self.title),
            orientation: self.orientation,
            keywords: self.keywords.into_iter().map(normalize_encoding).collect(),
        }
    }
}

/// Trimmed value, or `None` if missing or blank.
fn text(value: Option<&[u8]>) -> Option<Vec<u8>> {
    value
        .map(trim_bytes)
        .filter(|v| !v.is_empty())
        .map(<[u8]>::to_vec)
}

/// First non-blank value in priority order.
fn first_text(sources: &[Option<&[u8]>]) -> Option<Vec<u8>> {
    sources.iter().find_map(|v| text(*v))
}

/// Trimmed value as a `String`, for numeric and date tags.
fn ascii(value: Option<&[u8]>) -> Option<String> {
    text(value).map(|v| String::from_utf8_lossy(&v).into_owned())
}

/// Whether segment text is short enough to serve as a title. Counts
/// characters of the decoded text, so a Latin-1 byte counts as one.
fn is_short(value: &[u8]) -> bool {
    match std::str::from_utf8(value) {
        Ok(s) => s.chars().count() < TITLE_FROM_CAPTION_MAX,
        Err(_) => value.len() < TITLE_FROM_CAPTION_MAX,
    }
}

/// Strip leading and trailing whitespace and NUL padding.
fn trim_bytes(bytes: &[u8]) -> &[u8] {
    let is_blank = |b: &u8| matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x00 | 0x0B);
    let start = bytes.iter().position(|b| !is_blank(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_blank(b)).map_or(start, |p| p + 1);
    &bytes[start..end]
}

// ============================================================================
// Value conversions
// ============================================================================

/// Re-encode segment text as UTF-8.
///
/// Valid UTF-8 passes through; anything else is read as Latin-1.
pub fn normalize_encoding(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}

/// Convert an EXIF rational (`"28/10"`) or plain number (`"2.8"`) to a decimal.
///
/// A zero denominator or anything unparsable yields `0.0`.
pub fn fraction_to_decimal(value: &str) -> f64 {
    let value = value.trim();
    let decimal = match value.split_once('/') {
        None => value.parse::<f64>().unwrap_or(0.0),
        Some((num, den)) => match (num.trim().parse::<f64>(), den.trim().parse::<f64>()) {
            (Ok(_), Ok(d)) if d == 0.0 => 0.0,
            (Ok(n), Ok(d)) => n / d,
            _ => 0.0,
        },
    };
    if decimal.is_finite() { decimal } else { 0.0 }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Shortest decimal text for a value (`50`, `0.004`).
fn decimal_text(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

/// Parse an EXIF date (`"2019:07:14 18:02:33"`) as UTC epoch seconds.
pub fn exif_timestamp(value: &str) -> Option<i64> {
    ["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
        .map(|dt| dt.and_utc().timestamp())
}

/// Parse IPTC Date Created (`CCYYMMDD`) and Time Created (`HHMMSS±HHMM`)
/// as epoch seconds. A time without offset is taken as UTC.
fn iptc_timestamp(date: &[u8], time: &[u8]) -> Option<i64> {
    let date = std::str::from_utf8(date).ok()?.trim();
    let time = std::str::from_utf8(time).ok()?.trim();
    let combined = format!("{date}{time}");

    if let Ok(dt) = DateTime::parse_from_str(&combined, "%Y%m%d%H%M%S%z") {
        return Some(dt.timestamp());
    }
    NaiveDateTime::parse_from_str(&combined, "%Y%m%d%H%M%S")
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}
