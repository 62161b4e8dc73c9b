//! Mapping between public URLs and files under a storage root.

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use path_absolutize::Absolutize;

/// Filesystem helpers used when writing and removing stored files.
pub mod disk;

/// Storage root paired with the public URL serving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    base_path: PathBuf,
    base_url: String,
}

impl StorageLocation {
    /// Creates a location from an absolute directory and its public URL.
    pub fn new(base_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_path: base_path.into(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Storage root.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Public URL root, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Path of `file_name` under the storage root.
    ///
    /// Returns `None` when the name is empty or would leave the root.
    pub fn path_for(&self, file_name: &str) -> Option<PathBuf> {
        join_within(&self.base_path, file_name)
    }

    /// Public URL of `file_name`.
    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.base_url, file_name.trim_start_matches('/'))
    }

    /// Resolves a public URL back to a path under the storage root.
    ///
    /// Returns `None` when the URL is not under the public root or the
    /// resulting path would leave the storage root. Existence is not checked.
    pub fn path_from_url(&self, url: &str) -> Option<PathBuf> {
        let rest = url.strip_prefix(self.base_url.as_str())?;
        if !rest.starts_with('/') {
            return None;
        }
        contained_path(&self.base_path, rest)
    }
}

/// Joins a URL-encoded relative path onto `root`, rejecting anything that
/// does not resolve strictly inside it.
pub fn contained_path(root: &Path, relative: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(relative).unwrap_or(Cow::Borrowed(relative));
    join_within(root, &decoded)
}

/// Joins `relative` onto `root` as-is, rejecting anything that does not
/// resolve strictly inside it.
fn join_within(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = relative.trim_start_matches('/');
    if relative.is_empty() || relative.contains('\0') {
        return None;
    }

    let root = root.absolutize().ok()?.into_owned();
    let candidate = Path::new(relative)
        .absolutize_virtually(&root)
        .ok()?
        .into_owned();

    if candidate == root || !candidate.starts_with(&root) {
        return None;
    }
    Some(candidate)
}
