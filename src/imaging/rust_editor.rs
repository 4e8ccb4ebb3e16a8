//! Pure Rust image editor built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image::ImageReader` with content sniffing |
//! | Geometry | [`resize_geometry`](super::calculations::resize_geometry) |
//! | Crop | `DynamicImage::crop_imm` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode | source format; JPEG honours [`Quality`] |
//!
//! Variants are written beside the original as `<stem>-<w>x<h>.<ext>`.

use super::calculations::resize_geometry;
use super::editor::{EditorError, EditorFactory, ImageEditor, SavedImage};
use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("jpe", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether a path carries one of the [`supported_input_extensions`].
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// Opens [`RustImageEditor`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustEditorFactory {
    quality: Quality,
}

impl RustEditorFactory {
    pub fn new(quality: Quality) -> Self {
        Self { quality }
    }
}

impl EditorFactory for RustEditorFactory {
    type Editor = RustImageEditor;

    fn acquire(&self, path: &Path) -> Result<RustImageEditor, EditorError> {
        let (image, format) = load_image(path)?;
        Ok(RustImageEditor {
            source: path.to_path_buf(),
            format,
            image,
            resized: None,
            quality: self.quality,
        })
    }
}

/// A decoded image plus where it came from.
///
/// Every resize starts from the decoded original, so one editor can produce
/// several variants in turn.
pub struct RustImageEditor {
    source: PathBuf,
    format: ImageFormat,
    image: DynamicImage,
    resized: Option<DynamicImage>,
    quality: Quality,
}

impl RustImageEditor {
    /// Dimensions of the decoded original.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    fn current(&self) -> &DynamicImage {
        self.resized.as_ref().unwrap_or(&self.image)
    }
}

/// Load and decode an image, sniffing the format from its content.
fn load_image(path: &Path) -> Result<(DynamicImage, ImageFormat), EditorError> {
    let load_err = |message: String| EditorError::Load {
        path: path.to_path_buf(),
        message,
    };

    let reader = ImageReader::open(path)
        .map_err(|e| load_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| load_err(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| EditorError::Unsupported(path.display().to_string()))?;
    let image = reader.decode().map_err(|e| load_err(e.to_string()))?;
    Ok((image, format))
}

/// Save a DynamicImage in the given format.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    format: ImageFormat,
    quality: Quality,
) -> Result<(), EditorError> {
    let save_err = |e: &dyn std::fmt::Display| {
        EditorError::Save(format!("{}: {}", path.display(), e))
    };

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path).map_err(|e| save_err(&e))?;
            let writer = std::io::BufWriter::new(file);
            let encoder = JpegEncoder::new_with_quality(writer, quality.value() as u8);
            // JPEG has no alpha channel
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(|e| save_err(&e))
        }
        other => img.save_with_format(path, other).map_err(|e| save_err(&e)),
    }
}

impl ImageEditor for RustImageEditor {
    fn resize(&mut self, max_width: u32, max_height: u32, crop: bool) -> Result<(), EditorError> {
        let (orig_w, orig_h) = self.dimensions();
        let g = resize_geometry((orig_w, orig_h), (max_width, max_height), crop).ok_or_else(
            || {
                EditorError::Resize(format!(
                    "{orig_w}x{orig_h} cannot be reduced to {max_width}x{max_height}"
                ))
            },
        )?;

        let resized = if crop {
            self.image
                .crop_imm(g.src_x, g.src_y, g.src_width, g.src_height)
                .resize_exact(g.width, g.height, FilterType::Lanczos3)
        } else {
            self.image
                .resize_exact(g.width, g.height, FilterType::Lanczos3)
        };
        self.resized = Some(resized);
        Ok(())
    }

    fn save(&mut self) -> Result<SavedImage, EditorError> {
        let current = self.current();
        let (width, height) = (current.width(), current.height());
        let stem = self
            .source
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| EditorError::Save(format!("bad file name {}", self.source.display())))?;
        let ext = self
            .source
            .extension()
            .and_then(|e| e.to_str())
            .or_else(|| self.format.extensions_str().first().copied())
            .unwrap_or("img")
            .to_string();

        let file = format!("{stem}-{width}x{height}.{ext}");
        let path = self.source.with_file_name(&file);
        save_image(self.current(), &path, self.format, self.quality)?;

        log::debug!("wrote {}", path.display());
        Ok(SavedImage {
            path,
            file,
            width,
            height,
            mime_type: self.format.to_mime_type().to_string(),
        })
    }
}
