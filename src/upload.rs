use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use crate::{handle::UploadedFile, record::Record};

/// Ambient source of uploads received with the current request.
pub trait UploadSource: Send + Sync {
    /// Takes the pending upload for `attribute` of `record`, if one was sent.
    fn take(&self, record: &dyn Record, attribute: &str) -> Option<UploadedFile>;
}

/// Upload source for requests without files.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUploads;

impl UploadSource for NoUploads {
    fn take(&self, _record: &dyn Record, _attribute: &str) -> Option<UploadedFile> {
        None
    }
}

/// In-memory upload source keyed by attribute name.
///
/// Every handle is handed out at most once.
#[derive(Debug, Default)]
pub struct MemoryUploads {
    files: Mutex<HashMap<String, UploadedFile>>,
}

impl MemoryUploads {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an upload for `attribute`, builder style.
    pub fn with_file(self, attribute: impl Into<String>, file: UploadedFile) -> Self {
        self.insert(attribute, file);
        self
    }

    /// Adds or replaces the upload for `attribute`.
    pub fn insert(&self, attribute: impl Into<String>, file: UploadedFile) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(attribute.into(), file);
    }

    /// Number of uploads not yet taken.
    pub fn len(&self) -> usize {
        self.files.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` when every upload was taken.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UploadSource for MemoryUploads {
    fn take(&self, _record: &dyn Record, attribute: &str) -> Option<UploadedFile> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(attribute)
    }
}
