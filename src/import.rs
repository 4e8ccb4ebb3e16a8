//! Attachment import: fill a new attachment's record in one pass.
//!
//! ```text
//! import_attachment(id)
//!   ├─ resolve file             (unresolvable → ImportError::Unresolved)
//!   ├─ read original width/height
//!   ├─ extract IPTC/EXIF        → record.image_meta
//!   ├─ make_size for every registered size
//!   │    └─ editor declines (image already smaller) → skipped, not fatal
//!   └─ persist record
//! ```

use crate::config::LibraryConfig;
use crate::imaging::editor::{EditorError, EditorFactory};
use crate::imaging::reader::MetadataReader;
use crate::metadata::{ExtractHooks, MetadataExtractor};
use crate::registrar::{RegistrationError, SizeRegistrar};
use crate::store::AssetStore;
use crate::types::{AttachmentId, MetadataRecord};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("attachment {0} does not resolve to an image")]
    Unresolved(AttachmentId),
    #[error("cannot read dimensions of {path}: {source}")]
    Dimensions {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error("failed to save record for {0}")]
    Persistence(AttachmentId),
}

/// What happened to each registered size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Size names generated and stored, in registry order.
    pub generated: Vec<String>,
    /// Size names the editor declined, with its reason.
    pub skipped: Vec<(String, String)>,
}

/// Import one attachment: record its dimensions and descriptive metadata,
/// generate every registered size, and persist the result.
pub fn import_attachment<S, F, R, H>(
    store: &S,
    editors: &F,
    config: &LibraryConfig,
    extractor: &MetadataExtractor<R, H>,
    id: &AttachmentId,
) -> Result<(MetadataRecord, ImportReport), ImportError>
where
    S: AssetStore,
    F: EditorFactory,
    R: MetadataReader,
    H: ExtractHooks,
{
    let path = store
        .resolve_attachment(id)
        .ok_or_else(|| ImportError::Unresolved(id.clone()))?;
    let (width, height) =
        image::image_dimensions(&path).map_err(|source| ImportError::Dimensions {
            path: path.clone(),
            source,
        })?;
    let fields = extractor.extract(&path);

    let mut registrar = SizeRegistrar::new(id.clone(), store, editors, config);
    let record = registrar.metadata_mut();
    record.width = Some(width);
    record.height = Some(height);
    record.file = Some(id.as_str().to_string());
    record.image_meta = Some(fields);

    let mut report = ImportReport::default();
    for (name, definition) in &config.sizes {
        match registrar.make_size(name, definition) {
            Ok(_) => report.generated.push(name.clone()),
            Err(RegistrationError::ResizeOrSave(EditorError::Resize(reason))) => {
                log::warn!("{id}: skipping size {name}: {reason}");
                report.skipped.push((name.clone(), reason));
            }
            Err(e) => return Err(e.into()),
        }
    }

    if !registrar.update_metadata() {
        return Err(ImportError::Persistence(id.clone()));
    }

    log::info!(
        "imported {id} ({width}x{height}), {} sizes generated, {} skipped",
        report.generated.len(),
        report.skipped.len()
    );
    Ok((registrar.get_metadata().clone(), report))
}
