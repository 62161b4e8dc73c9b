use std::{
    fmt, io,
    io::Write,
    path::{Path, PathBuf},
};

use mime::Mime;
use tempfile::TempPath;
use tokio::{fs, io::AsyncReadExt};

/// Bytes inspected when sniffing a file's MIME type.
const SNIFF_LEN: usize = 8192;

/// Unix mode given to files moved into permanent storage.
pub const STORED_FILE_MODE: u32 = 0o644;

/// Prefix used for every temporary file this crate creates.
pub(crate) const TEMP_PREFIX: &str = "file-behavior-";

/// Transport status of an uploaded file.
///
/// Mirrors the status codes web servers report for multipart uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UploadErrorCode {
    /// Upload completed.
    #[default]
    Ok,
    /// File exceeds the server-wide size limit.
    IniSize,
    /// File exceeds the form's declared size limit.
    FormSize,
    /// File was only partially received.
    Partial,
    /// No file was sent for the field.
    NoFile,
    /// Server has no temporary directory.
    NoTmpDir,
    /// Temporary file could not be written.
    CantWrite,
    /// An extension stopped the upload.
    Extension,
}

impl UploadErrorCode {
    /// Returns `true` for [`UploadErrorCode::Ok`].
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl fmt::Display for UploadErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Ok => "ok",
            Self::IniSize => "file exceeds server size limit",
            Self::FormSize => "file exceeds form size limit",
            Self::Partial => "file was partially uploaded",
            Self::NoFile => "no file was uploaded",
            Self::NoTmpDir => "missing temporary directory",
            Self::CantWrite => "failed to write file to disk",
            Self::Extension => "upload stopped by extension",
        };
        f.write_str(text)
    }
}

/// Descriptive metadata of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// Client-declared file name.
    pub name: String,
    /// Detected or declared MIME type.
    pub content_type: Mime,
    /// Size in bytes.
    pub size: u64,
}

impl FileMeta {
    /// Declared name without its last extension.
    ///
    /// `archive.tar.gz` gives `archive.tar`; `README` gives `README`.
    pub fn base_name(&self) -> &str {
        let name = declared_file_name(&self.name);
        match name.rfind('.') {
            Some(0) | None => name,
            Some(dot) => &name[..dot],
        }
    }

    /// Text after the last dot of the declared name, or an empty string.
    pub fn extension(&self) -> &str {
        let name = declared_file_name(&self.name);
        match name.rfind('.') {
            Some(0) | None => "",
            Some(dot) => &name[dot + 1..],
        }
    }
}

fn declared_file_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// A file awaiting permanent storage.
///
/// The handle exclusively owns its temporary file. Dropping the handle
/// deletes the temp file; [`UploadedFile::save_as`] moves it into place.
#[derive(Debug)]
pub struct UploadedFile {
    meta: FileMeta,
    error: UploadErrorCode,
    temp: Option<TempPath>,
    source_url: Option<String>,
}

impl UploadedFile {
    /// Wraps an already written temporary file.
    pub fn from_temp_path(temp: TempPath, name: impl Into<String>, content_type: Mime, size: u64) -> Self {
        Self {
            meta: FileMeta {
                name: name.into(),
                content_type,
                size,
            },
            error: UploadErrorCode::Ok,
            temp: Some(temp),
            source_url: None,
        }
    }

    /// Writes `bytes` to a new temporary file and wraps it.
    pub fn from_bytes(name: impl Into<String>, content_type: Mime, bytes: &[u8]) -> io::Result<Self> {
        let mut file = new_temp_file()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self::from_temp_path(
            file.into_temp_path(),
            name,
            content_type,
            bytes.len() as u64,
        ))
    }

    /// Describes an upload that failed in transport and has no data.
    pub fn failed(name: impl Into<String>, error: UploadErrorCode) -> Self {
        Self {
            meta: FileMeta {
                name: name.into(),
                content_type: mime::APPLICATION_OCTET_STREAM,
                size: 0,
            },
            error,
            temp: None,
            source_url: None,
        }
    }

    pub(crate) fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// File metadata.
    pub fn meta(&self) -> &FileMeta {
        &self.meta
    }

    /// Client-declared file name.
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// MIME type.
    pub fn content_type(&self) -> &Mime {
        &self.meta.content_type
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.meta.size
    }

    /// Transport status.
    pub fn error(&self) -> UploadErrorCode {
        self.error
    }

    /// Returns `true` when the upload has an error code.
    pub fn has_error(&self) -> bool {
        !self.error.is_ok() || self.temp.is_none()
    }

    /// Location of the temporary file, if the handle carries data.
    pub fn temp_path(&self) -> Option<&Path> {
        self.temp.as_deref()
    }

    /// URL this handle was fabricated from, if any.
    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    /// Moves the temporary file to `dest`, consuming the handle.
    ///
    /// Falls back to copy-then-delete when a rename is not possible, for
    /// example across filesystems.
    pub async fn save_as(mut self, dest: impl AsRef<Path>) -> io::Result<()> {
        let dest = dest.as_ref();
        let temp = self.take_temp()?;

        if fs::rename(&temp, dest).await.is_ok() {
            // The temp path no longer exists; stop its guard from deleting the new owner.
            let _ = temp.keep();
        } else {
            fs::copy(&temp, dest).await?;
            temp.close()?;
        }
        publish_permissions(dest).await
    }

    /// Copies the temporary file to `dest`, leaving the handle intact.
    pub async fn copy_to(&self, dest: impl AsRef<Path>) -> io::Result<u64> {
        let temp = self.temp.as_deref().ok_or_else(|| self.missing_data())?;
        if !self.error.is_ok() {
            return Err(self.missing_data());
        }
        fs::copy(temp, dest).await
    }

    fn take_temp(&mut self) -> io::Result<TempPath> {
        if !self.error.is_ok() {
            return Err(self.missing_data());
        }
        self.temp.take().ok_or_else(|| self.missing_data())
    }

    fn missing_data(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("upload `{}` has no stored data ({})", self.meta.name, self.error),
        )
    }
}

/// Temp files are created owner-only; stored files must be readable by
/// whatever serves the public URL.
#[cfg(unix)]
async fn publish_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(STORED_FILE_MODE)).await
}

#[cfg(not(unix))]
async fn publish_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

pub(crate) fn new_temp_file() -> io::Result<tempfile::NamedTempFile> {
    tempfile::Builder::new().prefix(TEMP_PREFIX).tempfile()
}

/// Detects a file's MIME type from its leading bytes.
///
/// Unknown content is reported as `application/octet-stream`.
pub async fn detect_mime(path: impl AsRef<Path>) -> io::Result<Mime> {
    let mut file = fs::File::open(path.as_ref()).await?;
    let mut buffer = Vec::with_capacity(SNIFF_LEN);
    (&mut file).take(SNIFF_LEN as u64).read_to_end(&mut buffer).await?;

    Ok(infer::get(&buffer)
        .and_then(|kind| kind.mime_type().parse::<Mime>().ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM))
}

/// Builds a handle for a file that was just written to `temp`.
pub(crate) async fn describe_temp(temp: TempPath, name: String) -> io::Result<UploadedFile> {
    let path: PathBuf = temp.to_path_buf();
    let size = fs::metadata(&path).await?.len();
    let content_type = detect_mime(&path).await?;
    Ok(UploadedFile::from_temp_path(temp, name, content_type, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str) -> FileMeta {
        FileMeta {
            name: name.to_owned(),
            content_type: mime::IMAGE_PNG,
            size: 1,
        }
    }

    #[test]
    fn splits_base_name_and_extension() {
        assert_eq!(meta("photo.JPG").base_name(), "photo");
        assert_eq!(meta("photo.JPG").extension(), "JPG");
        assert_eq!(meta("archive.tar.gz").base_name(), "archive.tar");
        assert_eq!(meta("README").extension(), "");
        assert_eq!(meta(".env").base_name(), ".env");
        assert_eq!(meta("dir/sub\\pic.png").base_name(), "pic");
    }

    #[tokio::test]
    async fn dropping_handle_removes_temp_file() {
        let file = UploadedFile::from_bytes("a.txt", mime::TEXT_PLAIN, b"hello").expect("temp file");
        let temp = file.temp_path().expect("temp path").to_path_buf();
        assert!(temp.exists());
        drop(file);
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn saved_file_is_moved_and_world_readable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let dest = dir.path().join("stored.txt");
        let file = UploadedFile::from_bytes("a.txt", mime::TEXT_PLAIN, b"hello").expect("temp file");
        let temp = file.temp_path().expect("temp path").to_path_buf();

        file.save_as(&dest).await.expect("save should succeed");
        assert!(!temp.exists());
        assert_eq!(fs::read(&dest).await.expect("read stored"), b"hello");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = fs::metadata(&dest).await.expect("stat stored").permissions().mode();
            assert_eq!(mode & 0o777, STORED_FILE_MODE);
        }
    }

    #[tokio::test]
    async fn copy_keeps_the_handle_usable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let copy = dir.path().join("copy.txt");
        let file = UploadedFile::from_bytes("a.txt", mime::TEXT_PLAIN, b"hello").expect("temp file");

        assert_eq!(file.copy_to(&copy).await.expect("copy should succeed"), 5);
        assert_eq!(fs::read(&copy).await.expect("read copy"), b"hello");
        assert!(file.temp_path().expect("temp path").exists());

        let failed = UploadedFile::failed("b.txt", UploadErrorCode::NoFile);
        let err = failed.copy_to(dir.path().join("never.txt")).await.expect_err("no data");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn failed_upload_cannot_be_saved() {
        let file = UploadedFile::failed("a.txt", UploadErrorCode::Partial);
        assert!(file.has_error());
        let dest = std::env::temp_dir().join("file-behavior-never-written.txt");
        let err = file.save_as(&dest).await.expect_err("save must fail");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(!dest.exists());
    }
}
