use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Notification fired around the physical write of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventKind {
    /// Fired before any filesystem change; listeners may veto the save.
    BeforeFileSaving,
    /// Fired once the file is in place.
    AfterFileSaving,
}

impl FileEventKind {
    /// Event name as seen by listeners.
    pub fn name(self) -> &'static str {
        match self {
            Self::BeforeFileSaving => "beforeFileSaving",
            Self::AfterFileSaving => "afterFileSaving",
        }
    }
}

impl fmt::Display for FileEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload passed to record listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    kind: FileEventKind,
    attribute: String,
    path: PathBuf,
    url: String,
    is_valid: bool,
}

impl FileEvent {
    pub(crate) fn new(kind: FileEventKind, attribute: &str, path: &Path, url: &str) -> Self {
        Self {
            kind,
            attribute: attribute.to_owned(),
            path: path.to_path_buf(),
            url: url.to_owned(),
            is_valid: true,
        }
    }

    /// Which notification this is.
    pub fn kind(&self) -> FileEventKind {
        self.kind
    }

    /// Attribute whose file is being saved.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Public URL the file will be served from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the save may proceed.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Vetoes the save. Only honored for [`FileEventKind::BeforeFileSaving`].
    pub fn invalidate(&mut self) {
        self.is_valid = false;
    }
}
