#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Record lifecycle behavior for uploaded files.
//!
//! A [`FileBehavior`] watches one attribute of a record. During validation it
//! picks up a new upload, on save it writes the file under a storage root and
//! rewrites the attribute to the file's public URL, and it removes files that
//! were replaced or whose record was deleted. [`FileSource`] builds the same
//! kind of upload handle from a URL, so remote or already-published files go
//! through the same path.

/// Path and URL aliases.
pub mod alias;
/// Per-attribute lifecycle manager.
pub mod behavior;
/// Fluent builder API.
pub mod builder;
/// Behavior configuration.
pub mod config;
/// Error types exposed by this crate.
pub mod error;
/// Extensibility events fired around file writes.
pub mod events;
/// Record field values.
pub mod field;
/// Upload handles.
pub mod handle;
/// File naming strategies.
pub mod naming;
pub mod record;
/// Attribute-indexed behavior registry.
pub mod registry;
pub mod source;
pub mod storage;
/// Ambient upload sources.
pub mod upload;

pub use alias::{Aliases, STATIC_PATH_ALIAS, STATIC_URL_ALIAS};
pub use behavior::{FileBehavior, LifecycleState, SaveOutcome, StoredFile, MAX_NAME_ATTEMPTS};
pub use builder::FileBehaviorBuilder;
pub use config::FileBehaviorConfig;
pub use error::{BehaviorError, ConfigError, DownloadError, RecordError};
pub use events::{FileEvent, FileEventKind};
pub use field::AttributeValue;
pub use handle::{detect_mime, FileMeta, UploadErrorCode, UploadedFile, STORED_FILE_MODE};
pub use naming::{slugify, tableize, NameGenerator, NameStrategy};
pub use record::{MapRecord, PrimaryKey, Record, RecordStore};
pub use registry::FileBehaviors;
#[cfg(feature = "ftp")]
pub use source::FtpDownloader;
#[cfg(feature = "http")]
pub use source::HttpDownloader;
pub use source::{
    is_external_url, ByteStream, Downloader, FileSource, SchemeDownloader, UnsupportedDownloader,
};
pub use storage::StorageLocation;
pub use upload::{MemoryUploads, NoUploads, UploadSource};
