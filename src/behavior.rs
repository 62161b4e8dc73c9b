//! Lifecycle manager for one file attribute.
//!
//! The host calls the hooks in record order: [`FileBehavior::after_find`] on
//! load, then [`FileBehavior::before_validate`], [`FileBehavior::before_save`]
//! and [`FileBehavior::after_save`] for a save, or
//! [`FileBehavior::after_delete`] once the row is gone.

use std::path::PathBuf;

use crate::{
    alias::Aliases,
    builder::FileBehaviorBuilder,
    config::FileBehaviorConfig,
    error::{BehaviorError, ConfigError},
    events::{FileEvent, FileEventKind},
    field::AttributeValue,
    handle::{FileMeta, UploadedFile},
    record::{Record, RecordStore},
    storage::{disk, StorageLocation},
    upload::UploadSource,
};

/// Number of suffixed names tried before giving up on a collision.
pub const MAX_NAME_ATTEMPTS: usize = 10;

/// Where a behavior is in the record lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LifecycleState {
    /// No upload pending.
    #[default]
    Idle,
    /// An upload is bound and will be written by the next save.
    AwaitingSave,
    /// The record was deleted; further hooks do nothing.
    Deleted,
}

/// A file written to permanent storage.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoredFile {
    /// Attribute the file belongs to.
    pub attribute: String,
    /// Final file name.
    pub file_name: String,
    /// Absolute storage path.
    pub path: PathBuf,
    /// Public URL written to the attribute.
    pub url: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type.
    pub content_type: String,
}

/// Result of [`FileBehavior::after_save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing was pending.
    Unchanged,
    /// The pending upload was stored.
    Stored(StoredFile),
    /// A `beforeFileSaving` listener vetoed the write.
    Cancelled,
}

/// File lifecycle manager attached to one record attribute.
#[derive(Debug)]
pub struct FileBehavior {
    config: FileBehaviorConfig,
    location: StorageLocation,
    file: Option<UploadedFile>,
    old_value: Option<String>,
    state: LifecycleState,
}

impl FileBehavior {
    /// Creates a fluent builder.
    pub fn builder() -> FileBehaviorBuilder {
        FileBehaviorBuilder::default()
    }

    /// Validates `config` and resolves its storage location for `record_type`.
    pub fn with_config(
        config: FileBehaviorConfig,
        aliases: &Aliases,
        record_type: &str,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let location = config.resolve_location(aliases, record_type)?;
        Ok(Self::with_location(config, location))
    }

    /// Uses an already resolved storage location.
    ///
    /// `config.base_path` and `config.base_url` are ignored.
    pub fn with_location(config: FileBehaviorConfig, location: StorageLocation) -> Self {
        Self {
            config,
            location,
            file: None,
            old_value: None,
            state: LifecycleState::Idle,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &FileBehaviorConfig {
        &self.config
    }

    /// Attribute this behavior manages.
    pub fn attribute(&self) -> &str {
        &self.config.attribute
    }

    /// Resolved storage root and public URL.
    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// URL of the file currently stored for the record.
    pub fn previous_url(&self) -> Option<&str> {
        self.old_value.as_deref()
    }

    /// Upload awaiting the next save.
    pub fn pending(&self) -> Option<&UploadedFile> {
        self.file.as_ref()
    }

    /// Storage path of the file currently stored for the record.
    pub fn file_path(&self) -> Option<PathBuf> {
        self.old_value
            .as_deref()
            .and_then(|url| self.location.path_from_url(url))
    }

    /// Captures the loaded attribute value as the stored file.
    pub fn after_find(&mut self, record: &dyn Record) {
        if self.state == LifecycleState::Deleted {
            return;
        }
        self.old_value = record
            .field(&self.config.attribute)
            .and_then(AttributeValue::as_text)
            .map(str::to_owned);
    }

    /// Binds a new upload to the attribute, or reverts non-file input.
    pub fn before_validate(&mut self, record: &mut dyn Record, uploads: &dyn UploadSource) {
        let attribute = self.config.attribute.as_str();
        if self.state == LifecycleState::Deleted || !record.is_field_writable(attribute) {
            return;
        }

        if matches!(record.field(attribute), Some(AttributeValue::Upload(_))) {
            if let AttributeValue::Upload(file) = record.set_field(attribute, AttributeValue::Null) {
                self.file = Some(file);
            }
        }
        if self.file.is_none() {
            self.file = uploads.take(&*record, attribute);
        }

        match self.file.take() {
            Some(file) if !file.has_error() => {
                tracing::debug!(
                    attribute = %attribute,
                    name = %file.name(),
                    size_bytes = file.size(),
                    "upload bound to attribute"
                );
                record.set_field(attribute, AttributeValue::Bound(file.meta().clone()));
                self.file = Some(file);
                self.state = LifecycleState::AwaitingSave;
            }
            rejected => {
                if let Some(file) = rejected {
                    tracing::debug!(
                        attribute = %attribute,
                        name = %file.name(),
                        code = %file.error(),
                        "ignoring failed upload"
                    );
                }
                self.state = LifecycleState::Idle;

                if self.config.change_by_file_only {
                    record.set_field(attribute, AttributeValue::from_url(self.old_value.as_deref()));
                }

                if let Some(flag) = self.config.delete_attribute.as_deref() {
                    if record.field(flag).is_some_and(AttributeValue::is_truthy) {
                        record.set_field(attribute, AttributeValue::Null);
                    }
                }
            }
        }
    }

    /// Drops the pending upload after the host rejected validation.
    pub fn discard_pending(&mut self, record: &mut dyn Record) {
        if self.file.take().is_some() {
            record.set_field(
                &self.config.attribute,
                AttributeValue::from_url(self.old_value.as_deref()),
            );
        }
        if self.state == LifecycleState::AwaitingSave {
            self.state = LifecycleState::Idle;
        }
    }

    /// Removes a superseded file and puts a placeholder name on the attribute.
    pub async fn before_save(&mut self, record: &mut dyn Record) {
        if self.state == LifecycleState::Deleted {
            return;
        }

        if let Some(meta) = self.file.as_ref().map(|file| file.meta().clone()) {
            // The new name is not known yet and may equal the old one.
            if self.config.delete_old_file {
                self.delete_file_internal().await;
            }
            self.old_value = None;
            record.set_field(&self.config.attribute, AttributeValue::Text(placeholder_name(&meta)));
            return;
        }

        let changed = record
            .field(&self.config.attribute)
            .and_then(AttributeValue::as_text)
            != self.old_value.as_deref();
        if changed && self.config.delete_old_file {
            self.delete_file_internal().await;
        }
    }

    /// Writes the pending upload and points the attribute and row at it.
    pub async fn after_save(
        &mut self,
        record: &mut dyn Record,
        store: &dyn RecordStore,
    ) -> Result<SaveOutcome, BehaviorError> {
        if self.state == LifecycleState::Deleted {
            return Ok(SaveOutcome::Unchanged);
        }

        let Some(file) = self.file.take() else {
            self.old_value = record
                .field(&self.config.attribute)
                .and_then(AttributeValue::as_text)
                .map(str::to_owned);
            return Ok(SaveOutcome::Unchanged);
        };
        self.state = LifecycleState::Idle;

        if file.has_error() {
            return Err(BehaviorError::InvalidUpload {
                attribute: self.config.attribute.clone(),
                code: file.error(),
            });
        }

        let (file_name, path) = self.resolve_destination(record, file.meta()).await?;
        let url = self.location.url_for(&file_name);
        let attribute = self.config.attribute.clone();

        let mut event = FileEvent::new(FileEventKind::BeforeFileSaving, &attribute, &path, &url);
        record.trigger(&mut event);
        if !event.is_valid() {
            tracing::info!(attribute = %attribute, path = %path.display(), "file saving cancelled");
            drop(file);
            record.set_field(&attribute, AttributeValue::Null);
            record.mark_persisted(&attribute);
            self.update_row(record, store, None).await?;
            return Ok(SaveOutcome::Cancelled);
        }

        if let Some(dir) = path.parent() {
            disk::ensure_dir(dir)
                .await
                .map_err(|source| BehaviorError::CreateDirectory {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }

        let size = file.size();
        let content_type = file.content_type().to_string();
        file.save_as(&path)
            .await
            .map_err(|source| BehaviorError::Write {
                path: path.clone(),
                source,
            })?;

        tracing::info!(
            attribute = %attribute,
            path = %path.display(),
            url = %url,
            size_bytes = size,
            "stored uploaded file"
        );

        let mut event = FileEvent::new(FileEventKind::AfterFileSaving, &attribute, &path, &url);
        record.trigger(&mut event);

        record.set_field(&attribute, AttributeValue::Text(url.clone()));
        record.mark_persisted(&attribute);
        self.old_value = Some(url.clone());

        self.update_row(record, store, Some(&url)).await?;

        Ok(SaveOutcome::Stored(StoredFile {
            attribute,
            file_name,
            path,
            url,
            size,
            content_type,
        }))
    }

    /// Removes the stored file once the record is deleted.
    pub async fn after_delete(&mut self) {
        if self.state == LifecycleState::Deleted {
            return;
        }
        if self.config.delete_file_with_model {
            self.delete_file_internal().await;
        }
        self.file = None;
        self.state = LifecycleState::Deleted;
    }

    /// Removes the stored file now and forgets its URL.
    ///
    /// Returns `true` when a file was removed; repeated calls are no-ops.
    pub async fn delete_file(&mut self) -> bool {
        self.delete_file_internal().await
    }

    /// File name for one attempt; `index` is the collision suffix.
    pub fn generate_name(&self, record: &dyn Record, meta: &FileMeta, index: Option<usize>) -> String {
        self.config.file_name.generate(record, meta, index)
    }

    async fn resolve_destination(
        &self,
        record: &mut dyn Record,
        meta: &FileMeta,
    ) -> Result<(String, PathBuf), BehaviorError> {
        let name = self.generate_name(&*record, meta, None);
        let path = self.destination(&name)?;
        if self.config.overwrite_file || !disk::exists(&path).await {
            return Ok((name, path));
        }

        let mut last = path;
        for index in 0..MAX_NAME_ATTEMPTS {
            let name = self.generate_name(&*record, meta, Some(index));
            let path = self.destination(&name)?;
            if !disk::exists(&path).await {
                tracing::debug!(
                    attribute = %self.config.attribute,
                    name = %name,
                    "resolved file name collision"
                );
                return Ok((name, path));
            }
            last = path;
        }

        Err(BehaviorError::NameExhausted {
            attribute: self.config.attribute.clone(),
            path: last,
            attempts: MAX_NAME_ATTEMPTS,
        })
    }

    fn destination(&self, name: &str) -> Result<PathBuf, BehaviorError> {
        self.location
            .path_for(name)
            .ok_or_else(|| BehaviorError::InvalidFileName {
                attribute: self.config.attribute.clone(),
                name: name.to_owned(),
            })
    }

    async fn update_row(
        &self,
        record: &mut dyn Record,
        store: &dyn RecordStore,
        value: Option<&str>,
    ) -> Result<(), BehaviorError> {
        let table = record.table_name();
        let key = record.primary_key();
        let attribute = &self.config.attribute;

        let affected = store
            .update_column(&table, &key, attribute, value)
            .await
            .map_err(|source| BehaviorError::RecordUpdate {
                attribute: attribute.clone(),
                source,
            })?;
        if affected == 0 {
            return Err(BehaviorError::RecordNotUpdated {
                attribute: attribute.clone(),
            });
        }
        Ok(())
    }

    async fn delete_file_internal(&mut self) -> bool {
        let Some(url) = self.old_value.take() else {
            return false;
        };
        match self.location.path_from_url(&url) {
            Some(path) => disk::remove_file_best_effort(&path).await,
            None => {
                tracing::debug!(
                    attribute = %self.config.attribute,
                    url = %url,
                    "previous url is outside the storage location"
                );
                false
            }
        }
    }
}

fn placeholder_name(meta: &FileMeta) -> String {
    match meta.extension() {
        "" => meta.base_name().to_owned(),
        extension => format!("{}.{extension}", meta.base_name()),
    }
}
