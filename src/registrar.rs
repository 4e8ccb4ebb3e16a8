//! Size-variant registration for one attachment.
//!
//! A [`SizeRegistrar`] is bound to a single attachment. It lazily loads the
//! attachment's [`MetadataRecord`] and lazily opens an image editor for the
//! attachment's file, keeping both for its lifetime. [`add_size`] checks a
//! requested size name against two separate collision domains, delegates the
//! pixel work to the editor, and files the result under `sizes[name]`.
//!
//! ```text
//! add_size(name, w, h, crop, force)
//!   ├─ name registered library-wide?     → DuplicateSizeDefinition
//!   ├─ get_metadata()                    (first call loads from the store)
//!   ├─ sizes[name] exists and !force?    → SizeAlreadyExists
//!   ├─ get_editor()                      (first call acquires; failure sticks)
//!   ├─ editor.resize(w, h, crop)
//!   ├─ editor.save()
//!   └─ store_image(name, saved)          → update_metadata() → store.save_metadata
//! ```
//!
//! There is no rollback: a variant written by the editor stays on disk even
//! if the record cannot be persisted afterwards.
//!
//! [`add_size`]: SizeRegistrar::add_size

use crate::config::SizeDefinition;
use crate::imaging::editor::{EditorError, EditorFactory, ImageEditor, SavedImage};
use crate::store::{AssetStore, SizeRegistry};
use crate::types::{AttachmentId, MetadataRecord, SizeDescriptor};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    #[error("size \"{0}\" is already registered library-wide")]
    DuplicateSizeDefinition(String),
    #[error("attachment already has a \"{0}\" size")]
    SizeAlreadyExists(String),
    #[error("cannot open image editor: {0}")]
    EditorAcquisition(#[source] EditorError),
    #[error(transparent)]
    ResizeOrSave(#[from] EditorError),
    #[error("size \"{0}\" was generated but the record could not be saved")]
    Persistence(String),
}

/// Registers size variants against one attachment.
pub struct SizeRegistrar<'a, S, F, R>
where
    S: AssetStore,
    F: EditorFactory,
    R: SizeRegistry,
{
    id: AttachmentId,
    store: &'a S,
    editors: &'a F,
    registry: &'a R,
    file_path: Option<PathBuf>,
    editor: Option<Result<F::Editor, EditorError>>,
    metadata: Option<MetadataRecord>,
}

impl<'a, S, F, R> SizeRegistrar<'a, S, F, R>
where
    S: AssetStore,
    F: EditorFactory,
    R: SizeRegistry,
{
    /// Bind to an attachment. The file is resolved once, here; if it does not
    /// resolve the registrar is inert and every editor request fails with
    /// [`EditorError::Unresolved`].
    pub fn new(id: AttachmentId, store: &'a S, editors: &'a F, registry: &'a R) -> Self {
        let file_path = store.resolve_attachment(&id);
        if file_path.is_none() {
            log::debug!("attachment {id} has no image file, registrar is inert");
        }
        Self {
            id,
            store,
            editors,
            registry,
            file_path,
            editor: None,
            metadata: None,
        }
    }

    pub fn id(&self) -> &AttachmentId {
        &self.id
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn is_inert(&self) -> bool {
        self.file_path.is_none()
    }

    /// The editor for this attachment's file, acquired on first call.
    ///
    /// A failed acquisition is remembered and returned again on every later
    /// call without retrying.
    pub fn get_editor(&mut self) -> Result<&mut F::Editor, EditorError> {
        let editors = self.editors;
        let file_path = self.file_path.as_deref();
        self.editor
            .get_or_insert_with(|| match file_path {
                Some(path) => editors.acquire(path),
                None => Err(EditorError::Unresolved),
            })
            .as_mut()
            .map_err(|e| e.clone())
    }

    /// The attachment's record, loaded from the store on first call.
    pub fn get_metadata(&mut self) -> &MetadataRecord {
        self.metadata_mut()
    }

    /// Mutable access to the loaded record. Changes are persisted by the
    /// next [`update_metadata`](Self::update_metadata).
    pub fn metadata_mut(&mut self) -> &mut MetadataRecord {
        let (store, id) = (self.store, &self.id);
        self.metadata.get_or_insert_with(|| store.load_metadata(id))
    }

    /// Generate and record a size variant named `name`.
    ///
    /// Fails with [`RegistrationError::DuplicateSizeDefinition`] if `name` is
    /// registered library-wide, and with [`RegistrationError::SizeAlreadyExists`]
    /// if this attachment already has it and `force` is false.
    pub fn add_size(
        &mut self,
        name: &str,
        max_width: u32,
        max_height: u32,
        crop: bool,
        force: bool,
    ) -> Result<SizeDescriptor, RegistrationError> {
        if self.registry.is_registered(name) {
            return Err(RegistrationError::DuplicateSizeDefinition(name.to_string()));
        }
        let exists = self.get_metadata().has_size(name);
        if exists && !force {
            return Err(RegistrationError::SizeAlreadyExists(name.to_string()));
        }
        self.generate(name, max_width, max_height, crop)
    }

    /// Generate a registered size unconditionally, overwriting any existing
    /// variant of that name. Neither collision check applies.
    pub fn make_size(
        &mut self,
        name: &str,
        definition: &SizeDefinition,
    ) -> Result<SizeDescriptor, RegistrationError> {
        self.generate(name, definition.width, definition.height, definition.crop)
    }

    fn generate(
        &mut self,
        name: &str,
        max_width: u32,
        max_height: u32,
        crop: bool,
    ) -> Result<SizeDescriptor, RegistrationError> {
        let editor = self
            .get_editor()
            .map_err(RegistrationError::EditorAcquisition)?;
        editor.resize(max_width, max_height, crop)?;
        let saved = editor.save()?;

        let descriptor = saved.clone().into_descriptor();
        if !self.store_image(name, saved) {
            return Err(RegistrationError::Persistence(name.to_string()));
        }
        Ok(descriptor)
    }

    /// File a save result under `sizes[name]` and persist the record.
    ///
    /// An invalid result (no file name or a zero dimension) is rejected
    /// without touching the record. Any existing entry is overwritten.
    pub fn store_image(&mut self, name: &str, saved: SavedImage) -> bool {
        if !saved.is_valid() {
            log::debug!("not storing size {name} for {}: empty save result", self.id);
            return false;
        }
        let descriptor = saved.into_descriptor();
        log::info!(
            "{}: size {name} = {} ({}x{})",
            self.id,
            descriptor.file,
            descriptor.width,
            descriptor.height
        );
        self.metadata_mut().sizes.insert(name.to_string(), descriptor);
        self.update_metadata()
    }

    /// Persist the loaded record. Returns false without calling the store if
    /// nothing was ever loaded.
    pub fn update_metadata(&self) -> bool {
        let Some(record) = &self.metadata else {
            log::debug!("no record loaded for {}, nothing to save", self.id);
            return false;
        };
        match self.store.save_metadata(&self.id, record) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("failed to save record for {}: {e}", self.id);
                false
            }
        }
    }
}
