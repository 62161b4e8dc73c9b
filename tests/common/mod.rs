#![allow(dead_code, missing_docs, unreachable_pub)]

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use bytes::Bytes;
use file_behavior::{
    Aliases, AttributeValue, ByteStream, DownloadError, Downloader, MapRecord, PrimaryKey,
    RecordError, RecordStore, UploadedFile,
};
use futures::{stream, StreamExt};
use uuid::Uuid;

pub const STATIC_URL: &str = "/static";

/// One `update_column` call seen by [`MemoryTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub table: String,
    pub key: PrimaryKey,
    pub column: String,
    pub value: Option<String>,
}

#[derive(Debug)]
pub struct MemoryTable {
    updates: Mutex<Vec<Update>>,
    affected: u64,
    fail: bool,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            affected: 1,
            fail: false,
        }
    }

    pub fn affecting(affected: u64) -> Self {
        Self {
            affected,
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn updates(&self) -> Vec<Update> {
        self.updates.lock().expect("updates lock").clone()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryTable {
    async fn update_column(
        &self,
        table: &str,
        key: &PrimaryKey,
        column: &str,
        value: Option<&str>,
    ) -> Result<u64, RecordError> {
        if self.fail {
            return Err(RecordError::new("connection lost"));
        }
        self.updates.lock().expect("updates lock").push(Update {
            table: table.to_owned(),
            key: key.clone(),
            column: column.to_owned(),
            value: value.map(ToOwned::to_owned),
        });
        Ok(self.affected)
    }
}

/// Downloader that records requested URLs and replays fixed chunks.
#[derive(Debug, Clone, Default)]
pub struct RecordingDownloader {
    calls: Arc<Mutex<Vec<String>>>,
    chunks: Option<Vec<Vec<u8>>>,
}

impl RecordingDownloader {
    pub fn serving(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            calls: Arc::default(),
            chunks: Some(chunks),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait::async_trait]
impl Downloader for RecordingDownloader {
    async fn fetch(&self, url: &str) -> Result<ByteStream, DownloadError> {
        self.calls.lock().expect("calls lock").push(url.to_owned());
        match &self.chunks {
            Some(chunks) => Ok(stream::iter(
                chunks
                    .clone()
                    .into_iter()
                    .map(|chunk| Ok::<Bytes, DownloadError>(Bytes::from(chunk))),
            )
            .boxed()),
            None => Err(DownloadError::Transport("connection refused".into())),
        }
    }
}

pub fn temp_root() -> PathBuf {
    std::env::temp_dir().join(format!("file-behavior-test-{}", Uuid::new_v4()))
}

pub async fn cleanup(path: PathBuf) {
    let _ = tokio::fs::remove_dir_all(path).await;
}

/// Static directory used as `@static` under `root`.
pub fn static_dir(root: &Path) -> PathBuf {
    root.join("static")
}

pub fn aliases(root: &Path) -> Aliases {
    Aliases::with_static(static_dir(root).display().to_string(), STATIC_URL)
}

pub fn user(id: i64) -> MapRecord {
    MapRecord::new("User").with_field("id", id)
}

/// Bytes recognised as PNG, padded to `len`.
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.resize(len.max(bytes.len()), 0);
    bytes
}

/// Bytes recognised as JPEG, padded to `len`.
pub fn jpeg_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.resize(len.max(bytes.len()), 0);
    bytes
}

pub fn upload(name: &str, bytes: &[u8]) -> UploadedFile {
    let content_type = if name.to_ascii_lowercase().ends_with(".png") {
        mime::IMAGE_PNG
    } else {
        mime::IMAGE_JPEG
    };
    UploadedFile::from_bytes(name, content_type, bytes).expect("temp upload should be written")
}

pub async fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.expect("create parent dir");
    }
    tokio::fs::write(path, bytes).await.expect("write fixture file");
}

pub fn is_bound(record: &MapRecord, field: &str) -> bool {
    use file_behavior::Record;
    matches!(record.field(field), Some(AttributeValue::Bound(_)))
}
