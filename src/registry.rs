use std::{collections::HashMap, path::PathBuf};

use crate::{
    behavior::{FileBehavior, SaveOutcome},
    error::{BehaviorError, ConfigError},
    record::{Record, RecordStore},
    upload::UploadSource,
};

/// File behaviors attached to one record, indexed by attribute.
///
/// Lifecycle hooks run every behavior in attach order.
#[derive(Debug, Default)]
pub struct FileBehaviors {
    behaviors: Vec<FileBehavior>,
    by_attribute: HashMap<String, usize>,
}

impl FileBehaviors {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a behavior. Each attribute may have only one.
    pub fn attach(&mut self, behavior: FileBehavior) -> Result<(), ConfigError> {
        let attribute = behavior.attribute().to_owned();
        if self.by_attribute.contains_key(&attribute) {
            return Err(ConfigError::DuplicateAttribute { attribute });
        }
        self.by_attribute.insert(attribute, self.behaviors.len());
        self.behaviors.push(behavior);
        Ok(())
    }

    /// Attaches a behavior, builder style.
    pub fn with(mut self, behavior: FileBehavior) -> Result<Self, ConfigError> {
        self.attach(behavior)?;
        Ok(self)
    }

    /// Behavior responsible for `attribute`.
    pub fn get(&self, attribute: &str) -> Option<&FileBehavior> {
        self.by_attribute
            .get(attribute)
            .map(|&index| &self.behaviors[index])
    }

    /// Mutable behavior responsible for `attribute`.
    pub fn get_mut(&mut self, attribute: &str) -> Option<&mut FileBehavior> {
        let index = *self.by_attribute.get(attribute)?;
        self.behaviors.get_mut(index)
    }

    /// Attached behaviors in attach order.
    pub fn iter(&self) -> impl Iterator<Item = &FileBehavior> {
        self.behaviors.iter()
    }

    /// Number of attached behaviors.
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    /// Returns `true` when nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Storage path of the file stored for `attribute`.
    pub fn file_path(&self, attribute: &str) -> Option<PathBuf> {
        self.get(attribute).and_then(FileBehavior::file_path)
    }

    /// Deletes the file stored for `attribute`.
    ///
    /// Returns `false` when no behavior covers the attribute or nothing was removed.
    pub async fn delete_file(&mut self, attribute: &str) -> bool {
        match self.get_mut(attribute) {
            Some(behavior) => behavior.delete_file().await,
            None => false,
        }
    }

    /// Runs [`FileBehavior::after_find`] on every behavior.
    pub fn after_find(&mut self, record: &dyn Record) {
        for behavior in &mut self.behaviors {
            behavior.after_find(record);
        }
    }

    /// Runs [`FileBehavior::before_validate`] on every behavior.
    pub fn before_validate(&mut self, record: &mut dyn Record, uploads: &dyn UploadSource) {
        for behavior in &mut self.behaviors {
            behavior.before_validate(&mut *record, uploads);
        }
    }

    /// Runs [`FileBehavior::discard_pending`] on every behavior.
    pub fn discard_pending(&mut self, record: &mut dyn Record) {
        for behavior in &mut self.behaviors {
            behavior.discard_pending(&mut *record);
        }
    }

    /// Runs [`FileBehavior::before_save`] on every behavior.
    pub async fn before_save(&mut self, record: &mut dyn Record) {
        for behavior in &mut self.behaviors {
            behavior.before_save(&mut *record).await;
        }
    }

    /// Runs [`FileBehavior::after_save`] on every behavior, stopping at the first error.
    pub async fn after_save(
        &mut self,
        record: &mut dyn Record,
        store: &dyn RecordStore,
    ) -> Result<Vec<SaveOutcome>, BehaviorError> {
        let mut outcomes = Vec::with_capacity(self.behaviors.len());
        for behavior in &mut self.behaviors {
            outcomes.push(behavior.after_save(&mut *record, store).await?);
        }
        Ok(outcomes)
    }

    /// Runs [`FileBehavior::after_delete`] on every behavior.
    pub async fn after_delete(&mut self) {
        for behavior in &mut self.behaviors {
            behavior.after_delete().await;
        }
    }
}
