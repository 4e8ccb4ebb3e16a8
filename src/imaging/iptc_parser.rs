//! Minimal IPTC-IIM reader for JPEG and TIFF files.
//!
//! Produces every dataset found in the IIM block as a tag-code → values map.
//! Values are raw bytes: older producers wrote Latin-1 or other single-byte
//! encodings, and normalizing that is the extractor's job, not the reader's.
//!
//! For JPEG: reads from the APP13 marker (Photoshop 8BIM resource 0x0404).
//! For TIFF: reads from IFD tag 33723 (IPTC-NAA, raw IIM bytes) or tag 34377
//! (Photoshop image resources).
//!
//! The container is sniffed from the leading bytes, not the file extension.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// IIM dataset address: record number and dataset number (`2:120` is the
/// caption in the application record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IptcTag {
    pub record: u8,
    pub dataset: u8,
}

impl IptcTag {
    pub const fn new(record: u8, dataset: u8) -> Self {
        Self { record, dataset }
    }

    pub const OBJECT_NAME: IptcTag = IptcTag::new(2, 5);
    pub const KEYWORDS: IptcTag = IptcTag::new(2, 25);
    pub const DATE_CREATED: IptcTag = IptcTag::new(2, 55);
    pub const TIME_CREATED: IptcTag = IptcTag::new(2, 60);
    pub const BYLINE: IptcTag = IptcTag::new(2, 80);
    pub const HEADLINE: IptcTag = IptcTag::new(2, 105);
    pub const CREDIT: IptcTag = IptcTag::new(2, 110);
    pub const COPYRIGHT_NOTICE: IptcTag = IptcTag::new(2, 116);
    pub const CAPTION: IptcTag = IptcTag::new(2, 120);
}

impl fmt::Display for IptcTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:03}", self.record, self.dataset)
    }
}

/// All IIM datasets of one file. Repeatable datasets (keywords) keep every
/// occurrence in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IptcTags(BTreeMap<IptcTag, Vec<Vec<u8>>>);

impl IptcTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: IptcTag, value: impl Into<Vec<u8>>) {
        self.0.entry(tag).or_default().push(value.into());
    }

    /// First value of a dataset.
    pub fn first(&self, tag: IptcTag) -> Option<&[u8]> {
        self.0.get(&tag)?.first().map(Vec::as_slice)
    }

    pub fn all(&self, tag: IptcTag) -> &[Vec<u8>] {
        self.0.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Read the IPTC block of a file.
///
/// Returns `None` when the file can't be read, isn't a JPEG/TIFF, or carries
/// no IPTC block.
pub fn read_iptc(path: &Path) -> Option<IptcTags> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            log::debug!("cannot read {} for IPTC: {e}", path.display());
            return None;
        }
    };

    if bytes.starts_with(&[0xFF, 0xD8]) {
        find_jpeg_app13_iptc(&bytes).map(parse_iptc_iim)
    } else if bytes.starts_with(b"II") || bytes.starts_with(b"MM") {
        read_iptc_from_tiff(&bytes)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// IPTC-IIM record parsing
// ---------------------------------------------------------------------------

/// Parse raw IPTC-IIM bytes into a dataset map.
///
/// IIM dataset layout:
///   Byte 0:    0x1C (tag marker)
///   Byte 1:    Record number
///   Byte 2:    Dataset number
///   Bytes 3-4: Data length (big-endian u16)
///   Bytes 5+:  Data
pub(crate) fn parse_iptc_iim(data: &[u8]) -> IptcTags {
    let mut result = IptcTags::new();
    let mut pos = 0;

    while pos + 5 <= data.len() {
        if data[pos] != 0x1C {
            pos += 1;
            continue;
        }

        let tag = IptcTag::new(data[pos + 1], data[pos + 2]);
        let length = u16::from_be_bytes([data[pos + 3], data[pos + 4]]) as usize;
        pos += 5;

        // Extended datasets (high bit set) are never text; stop rather than misread.
        if length & 0x8000 != 0 || pos + length > data.len() {
            break;
        }

        result.insert(tag, &data[pos..pos + length]);
        pos += length;
    }

    result
}

// ---------------------------------------------------------------------------
// JPEG: extract IPTC from APP13 / Photoshop 8BIM
// ---------------------------------------------------------------------------

const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";
const BIM_MARKER: &[u8] = b"8BIM";
const IPTC_RESOURCE_ID: u16 = 0x0404;

/// Find the raw IPTC-IIM bytes inside a JPEG's APP13 segment.
fn find_jpeg_app13_iptc(data: &[u8]) -> Option<&[u8]> {
    // Scan for the APP13 marker (0xFF 0xED)
    let mut pos = 0;
    while pos + 4 < data.len() {
        if data[pos] == 0xFF && data[pos + 1] == 0xED {
            let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
            let seg_start = pos + 4;
            // A length running past EOF is clamped to what was read
            let seg_end = (pos + 2 + seg_len).min(data.len());
            if seg_start <= seg_end
                && let Some(iptc) = extract_iptc_from_8bim(&data[seg_start..seg_end])
            {
                return Some(iptc);
            }
        }

        // On a marker, jump over its segment; otherwise step one byte
        if data[pos] == 0xFF && pos + 3 < data.len() && data[pos + 1] != 0x00 {
            let marker = data[pos + 1];
            // SOS: entropy-coded data follows, no more metadata segments
            if marker == 0xDA {
                break;
            }
            // SOI, EOI and RSTn carry no length field
            if marker == 0xD8 || marker == 0xD9 || (0xD0..=0xD7).contains(&marker) {
                pos += 2;
            } else {
                let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
                pos += 2 + len;
            }
        } else {
            pos += 1;
        }
    }
    None
}

/// Extract IPTC-IIM bytes from a Photoshop 8BIM resource block.
///
/// `segment` is the APP13 payload after the length field. It normally opens
/// with `"Photoshop 3.0\0"`, but bare `8BIM` resource lists are accepted too.
fn extract_iptc_from_8bim(segment: &[u8]) -> Option<&[u8]> {
    let data = segment.strip_prefix(PHOTOSHOP_HEADER).unwrap_or(segment);

    let mut pos = 0;
    while pos + 12 <= data.len() {
        // "8BIM" (4) + resource_id (2) + pascal_string + data_len (4) + data
        if &data[pos..pos + 4] != BIM_MARKER {
            pos += 1;
            continue;
        }
        pos += 4;

        if pos + 2 > data.len() {
            break;
        }
        let resource_id = u16::from_be_bytes([data[pos], data[pos + 1]]);
        pos += 2;

        // Resource name: Pascal string, length byte included, padded to even
        if pos >= data.len() {
            break;
        }
        let pascal_len = data[pos] as usize;
        pos += 1 + pascal_len + ((1 + pascal_len) % 2);

        if pos + 4 > data.len() {
            break;
        }
        let res_len =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        pos += 4;

        if pos + res_len > data.len() {
            break;
        }

        if resource_id == IPTC_RESOURCE_ID {
            return Some(&data[pos..pos + res_len]);
        }

        // Resource data is padded to even as well
        pos += res_len + (res_len % 2);
    }

    None
}

// ---------------------------------------------------------------------------
// TIFF: extract IPTC from IFD tags
// ---------------------------------------------------------------------------

const TIFF_TAG_IPTC_NAA: u16 = 33723;
const TIFF_TAG_PHOTOSHOP: u16 = 34377;

fn read_iptc_from_tiff(data: &[u8]) -> Option<IptcTags> {
    if data.len() < 8 {
        return None;
    }

    let big_endian = match &data[0..2] {
        b"MM" => true,
        b"II" => false,
        _ => return None,
    };

    let read_u16 = |offset: usize| -> u16 {
        let b = [data[offset], data[offset + 1]];
        if big_endian {
            u16::from_be_bytes(b)
        } else {
            u16::from_le_bytes(b)
        }
    };

    let read_u32 = |offset: usize| -> u32 {
        let b = [
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ];
        if big_endian {
            u32::from_be_bytes(b)
        } else {
            u32::from_le_bytes(b)
        }
    };

    if read_u16(2) != 42 {
        return None;
    }

    // Count is in values, not bytes.
    let type_size = |typ: u16| -> usize {
        match typ {
            1 | 2 | 6 | 7 => 1,
            3 | 8 => 2,
            4 | 9 | 11 => 4,
            5 | 10 | 12 => 8,
            _ => 1,
        }
    };

    let mut ifd_offset = read_u32(4) as usize;
    // Bounded walk; a malformed file can link IFDs in a cycle.
    let mut remaining_ifds = 64;

    while ifd_offset > 0 && ifd_offset + 2 < data.len() && remaining_ifds > 0 {
        remaining_ifds -= 1;
        let entry_count = read_u16(ifd_offset) as usize;
        let entries_start = ifd_offset + 2;

        for i in 0..entry_count {
            let entry_offset = entries_start + i * 12;
            if entry_offset + 12 > data.len() {
                return None;
            }

            let tag = read_u16(entry_offset);
            let typ = read_u16(entry_offset + 2);
            let count = read_u32(entry_offset + 4) as usize;
            let byte_len = count.saturating_mul(type_size(typ));
            let value_offset = read_u32(entry_offset + 8) as usize;
            let Some(value_end) = value_offset.checked_add(byte_len) else {
                continue;
            };
            if value_end > data.len() {
                continue;
            }
            let value = &data[value_offset..value_end];

            let parsed = match tag {
                TIFF_TAG_IPTC_NAA => Some(parse_iptc_iim(value)),
                TIFF_TAG_PHOTOSHOP => extract_iptc_from_8bim(value).map(parse_iptc_iim),
                _ => None,
            };
            if let Some(tags) = parsed.filter(|t| !t.is_empty()) {
                return Some(tags);
            }
        }

        let next_offset_pos = entries_start + entry_count * 12;
        if next_offset_pos + 4 <= data.len() {
            ifd_offset = read_u32(next_offset_pos) as usize;
        } else {
            break;
        }
    }

    None
}
