//! Library configuration module.
//!
//! Handles loading, validating, and merging the `config.toml` that sits at
//! the root of an attachment library. User values are merged on top of the
//! stock defaults, so a config file only needs the keys it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! remove_sizes = []         # Stock size names to unregister, e.g. ["large"]
//!
//! [sizes.thumbnail]
//! width = 150
//! height = 150
//! crop = true               # Centre-crop to exactly width x height
//!
//! [sizes.medium]
//! width = 300
//! height = 300
//!
//! [sizes.medium_large]
//! width = 768
//! height = 0                # 0 = unbounded on this axis
//!
//! [sizes.large]
//! width = 1024
//! height = 1024
//!
//! [extract]
//! exif_types = ["jpeg", "tiff-le", "tiff-be"]
//!
//! [editor]
//! quality = 82              # JPEG quality (1-100)
//! ```
//!
//! ## Registered sizes
//!
//! The `[sizes]` table is the set of size definitions known library-wide.
//! [`LibraryConfig`] implements [`SizeRegistry`], so these names are the
//! ones an ad-hoc [`add_size`](crate::registrar::SizeRegistrar::add_size)
//! may not reuse, and the ones [`import_attachment`](crate::import::import_attachment)
//! generates for every new attachment.
//!
//! A `[sizes]` table in `config.toml` is merged into the stock set, so it can
//! add sizes or change one field of a stock size. To unregister a stock size
//! list it in `remove_sizes`.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::params::Quality;
use crate::imaging::reader::ImageType;
use crate::store::SizeRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Library configuration loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibraryConfig {
    /// Size names dropped from `sizes` after merging. Emptied once applied.
    pub remove_sizes: Vec<String>,
    /// Registered size definitions, keyed by size name.
    pub sizes: BTreeMap<String, SizeDefinition>,
    /// Metadata extraction settings.
    pub extract: ExtractConfig,
    /// Settings for the built-in image editor.
    pub editor: EditorConfig,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        let sizes = [
            ("thumbnail", SizeDefinition::new(150, 150, true)),
            ("medium", SizeDefinition::new(300, 300, false)),
            ("medium_large", SizeDefinition::new(768, 0, false)),
            ("large", SizeDefinition::new(1024, 1024, false)),
        ]
        .into_iter()
        .map(|(name, def)| (name.to_string(), def))
        .collect();

        Self {
            remove_sizes: Vec::new(),
            sizes,
            extract: ExtractConfig::default(),
            editor: EditorConfig::default(),
        }
    }
}

impl LibraryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.editor.quality) {
            return Err(ConfigError::Validation(
                "editor.quality must be 1-100".into(),
            ));
        }
        for (name, def) in &self.sizes {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "size names must not be empty".into(),
                ));
            }
            if def.width == 0 && def.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "sizes.{name} needs a non-zero width or height"
                )));
            }
        }
        Ok(())
    }

    /// Drop every size named in `remove_sizes`. Naming a size that is not
    /// defined is an error, so typos don't go unnoticed.
    pub fn apply_removals(&mut self) -> Result<(), ConfigError> {
        for name in std::mem::take(&mut self.remove_sizes) {
            if self.sizes.remove(&name).is_none() {
                return Err(ConfigError::Validation(format!(
                    "remove_sizes names unknown size \"{name}\""
                )));
            }
        }
        Ok(())
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.editor.quality)
    }
}

impl SizeRegistry for LibraryConfig {
    fn registered_size_names(&self) -> BTreeSet<String> {
        self.sizes.keys().cloned().collect()
    }

    fn is_registered(&self, name: &str) -> bool {
        self.sizes.contains_key(name)
    }
}

/// One named size: a bounding box plus whether to crop to it exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizeDefinition {
    /// Maximum width in pixels (0 = unbounded).
    pub width: u32,
    /// Maximum height in pixels (0 = unbounded).
    pub height: u32,
    pub crop: bool,
}

impl SizeDefinition {
    pub const fn new(width: u32, height: u32, crop: bool) -> Self {
        Self {
            width,
            height,
            crop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractConfig {
    /// Image types whose EXIF block is read.
    pub exif_types: Vec<ImageType>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            exif_types: ImageType::EXIF_DEFAULTS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Lossy encoding quality (1-100).
    pub quality: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(LibraryConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<LibraryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let mut config: LibraryConfig = merged.try_into()?;
    config.apply_removals()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given library root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<LibraryConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
pub fn stock_config_toml() -> &'static str {
    r##"# Attachment library configuration
# ================================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file at the root of the library. Unknown keys cause an error.

# Stock size names to unregister, e.g. ["medium_large", "large"]. Sizes
# defined below are merged into the stock set, so this is the only way to
# drop one.
remove_sizes = []

# ---------------------------------------------------------------------------
# Registered sizes
# ---------------------------------------------------------------------------
# Every attachment gets one variant per size on import. A 0 bound means
# "unbounded" on that axis. With crop = true the variant is centre-cropped
# to exactly width x height; otherwise it is scaled to fit inside the box.
# Variants are never upscaled.

[sizes.thumbnail]
width = 150
height = 150
crop = true

[sizes.medium]
width = 300
height = 300
crop = false

[sizes.medium_large]
width = 768
height = 0
crop = false

[sizes.large]
width = 1024
height = 1024
crop = false

# ---------------------------------------------------------------------------
# Metadata extraction
# ---------------------------------------------------------------------------
[extract]
# Image types whose EXIF block is read. IPTC is read whenever present.
# Any of: "jpeg", "tiff-le", "tiff-be", "png", "gif", "bmp", "webp"
exif_types = ["jpeg", "tiff-le", "tiff-be"]

# ---------------------------------------------------------------------------
# Built-in editor
# ---------------------------------------------------------------------------
[editor]
# JPEG quality for generated variants (1-100).
quality = 82
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_stock_sizes() {
        let config = LibraryConfig::default();
        assert_eq!(config.sizes["thumbnail"], SizeDefinition::new(150, 150, true));
        assert_eq!(config.sizes["medium"], SizeDefinition::new(300, 300, false));
        assert_eq!(config.sizes["medium_large"], SizeDefinition::new(768, 0, false));
        assert_eq!(config.sizes["large"], SizeDefinition::new(1024, 1024, false));
        assert_eq!(config.sizes.len(), 4);
    }

    #[test]
    fn default_config_has_extract_and_editor_settings() {
        let config = LibraryConfig::default();
        assert_eq!(config.extract.exif_types, ImageType::EXIF_DEFAULTS.to_vec());
        assert_eq!(config.editor.quality, 82);
        assert_eq!(config.quality(), Quality::default());
    }

    #[test]
    fn parse_partial_size() {
        let toml = r#"
[sizes.hero]
width = 1600
"#;
        let config: LibraryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.sizes["hero"], SizeDefinition::new(1600, 0, false));
        // A bare [sizes] table replaces the stock set when parsed directly
        assert!(!config.sizes.contains_key("thumbnail"));
    }

    #[test]
    fn parse_exif_types() {
        let toml = r#"
[extract]
exif_types = ["jpeg", "webp"]
"#;
        let config: LibraryConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.extract.exif_types,
            vec![ImageType::Jpeg, ImageType::Webp]
        );
    }

    #[test]
    fn parse_unknown_image_type_is_error() {
        let toml = r#"
[extract]
exif_types = ["heic"]
"#;
        let result: Result<LibraryConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    // =========================================================================
    // Registry
    // =========================================================================

    #[test]
    fn registry_names_are_size_keys() {
        let config = LibraryConfig::default();
        let names: Vec<String> = config.registered_size_names().into_iter().collect();
        assert_eq!(names, vec!["large", "medium", "medium_large", "thumbnail"]);
        assert!(config.is_registered("thumbnail"));
        assert!(!config.is_registered("hero"));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, LibraryConfig::default());
    }

    #[test]
    fn load_config_adds_sizes_to_stock_set() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[sizes.hero]
width = 1600
height = 900
crop = true
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.sizes["hero"], SizeDefinition::new(1600, 900, true));
        // Stock sizes survive the merge
        assert!(config.sizes.contains_key("thumbnail"));
        assert_eq!(config.sizes.len(), 5);
    }

    #[test]
    fn load_config_overrides_one_field_of_a_stock_size() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[sizes.thumbnail]
width = 200
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.sizes["thumbnail"], SizeDefinition::new(200, 150, true));
    }

    #[test]
    fn load_config_removes_stock_sizes() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
remove_sizes = ["medium_large", "large"]

[sizes.hero]
width = 1600
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        let names: Vec<&str> = config.sizes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["hero", "medium", "thumbnail"]);
        assert!(!config.is_registered("large"));
        assert!(config.remove_sizes.is_empty());
    }

    #[test]
    fn load_config_can_remove_every_size() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"remove_sizes = ["thumbnail", "medium", "medium_large", "large"]"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert!(config.sizes.is_empty());
    }

    #[test]
    fn removing_unknown_size_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), r#"remove_sizes = ["huge"]"#).unwrap();

        let err = load_config(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("huge"));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "[editor\nquality = ").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"quality = 82"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"quality = 70"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("quality").unwrap().as_integer(), Some(70));
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value = toml::from_str(
            r#"
[sizes.large]
width = 1024
height = 1024
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[sizes.large]
height = 0
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let large = merged.get("sizes").unwrap().get("large").unwrap();
        assert_eq!(large.get("width").unwrap().as_integer(), Some(1024));
        assert_eq!(large.get("height").unwrap().as_integer(), Some(0));
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base: toml::Value = toml::from_str(r#"exif_types = ["jpeg", "tiff-le"]"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"exif_types = ["png"]"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("exif_types").unwrap().as_array().unwrap().len(), 1);
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[editor]
qualty = 90
"#;
        let result: Result<LibraryConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let toml_str = r#"
[images]
quality = 90
"#;
        let result: Result<LibraryConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_size_key_rejected() {
        let toml_str = r#"
[sizes.hero]
widht = 1600
"#;
        let result: Result<LibraryConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(LibraryConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_quality_bounds() {
        let mut config = LibraryConfig::default();
        config.editor.quality = 100;
        assert!(config.validate().is_ok());
        config.editor.quality = 1;
        assert!(config.validate().is_ok());

        config.editor.quality = 0;
        assert!(config.validate().unwrap_err().to_string().contains("quality"));
        config.editor.quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_unbounded_size_rejected() {
        let mut config = LibraryConfig::default();
        config
            .sizes
            .insert("nothing".into(), SizeDefinition::new(0, 0, false));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sizes.nothing"));
    }

    #[test]
    fn validate_blank_size_name_rejected() {
        let mut config = LibraryConfig::default();
        config.sizes.insert(" ".into(), SizeDefinition::new(10, 10, false));
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r#"
[editor]
quality = 200
"#,
        )
        .unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // resolve_config / load_raw_config tests
    // =========================================================================

    #[test]
    fn load_raw_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        assert!(load_raw_config(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn resolve_config_with_overlay() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str(
            r#"
[editor]
quality = 70
"#,
        )
        .unwrap();
        let config = resolve_config(base, Some(overlay)).unwrap();
        assert_eq!(config.editor.quality, 70);
        assert_eq!(config.sizes.len(), 4);
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: LibraryConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, LibraryConfig::default());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        assert!(val.is_table());
        assert!(val.get("sizes").is_some());
        assert!(val.get("extract").is_some());
        assert!(val.get("editor").is_some());
    }
}
