use std::{io, path::PathBuf};

use thiserror::Error;

use crate::handle::UploadErrorCode;

/// Fatal error raised by a lifecycle hook.
///
/// Any of these aborts the save or delete operation that triggered the hook.
/// The record's in-memory attribute may already have been changed when the
/// error surfaces.
#[derive(Debug, Error)]
pub enum BehaviorError {
    /// Behavior configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A handle carrying a transport error reached the write step.
    #[error("upload for `{attribute}` cannot be stored: {code}")]
    InvalidUpload {
        /// Attribute the handle was bound to.
        attribute: String,
        /// Error code carried by the handle.
        code: UploadErrorCode,
    },
    /// Destination directory could not be created.
    #[error("directory `{}` could not be created: {source}", path.display())]
    CreateDirectory {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },
    /// A generated file name does not stay inside the storage root.
    #[error("file name `{name}` for `{attribute}` leaves the storage root")]
    InvalidFileName {
        /// Attribute being saved.
        attribute: String,
        /// Offending file name.
        name: String,
    },
    /// Every collision-avoidance candidate already exists.
    #[error("file for `{attribute}` already exists after {attempts} attempts: `{}`", path.display())]
    NameExhausted {
        /// Attribute being saved.
        attribute: String,
        /// Last candidate path tried.
        path: PathBuf,
        /// Number of suffixed candidates tried.
        attempts: usize,
    },
    /// Temp file could not be moved or copied into place.
    #[error("saving file to `{}` failed: {source}", path.display())]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },
    /// The host store failed to update the attribute column.
    #[error("record update for `{attribute}` failed: {source}")]
    RecordUpdate {
        /// Column being updated.
        attribute: String,
        /// Store error.
        #[source]
        source: RecordError,
    },
    /// The host store reported that no row was updated.
    #[error("record update for `{attribute}` affected no rows")]
    RecordNotUpdated {
        /// Column being updated.
        attribute: String,
    },
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The `attribute` option was not set.
    #[error("attribute name must be set")]
    MissingAttribute,
    /// A second behavior was attached for an attribute that already has one.
    #[error("attribute `{attribute}` already has a file behavior attached")]
    DuplicateAttribute {
        /// Attribute name.
        attribute: String,
    },
    /// A path or URL referenced an alias that was never registered.
    #[error("unknown alias `{alias}`")]
    UnknownAlias {
        /// Alias including the leading `@`.
        alias: String,
    },
}

/// Error reported by a host [`RecordStore`](crate::RecordStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RecordError {
    message: String,
}

impl RecordError {
    /// Creates a new record error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure while fetching a remote file.
///
/// [`FileSource`](crate::FileSource) logs these and reports "no file".
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Connection, TLS, or body transfer failed.
    #[error("transport error: {0}")]
    Transport(String),
    /// Remote answered with a non-success status.
    #[error("remote returned status {0}")]
    Status(u16),
    /// No transport is available for the URL.
    #[error("unsupported url `{0}`")]
    Unsupported(String),
}
