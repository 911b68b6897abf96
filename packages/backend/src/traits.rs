//! The `Backend` capability trait and its metadata record.

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::SystemTime;

use crate::BackendError;

/// Metadata for one file or directory, as reported by a backend.
///
/// `size` and `modified` are optional because not every backend can report
/// them (a remote listing may omit sizes; an in-memory directory has no
/// meaningful mtime).
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// Base name of the entry, without any path separators.
    pub name: String,
    pub is_dir: bool,
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
}

impl Metadata {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Metadata {
            name: name.into(),
            is_dir: false,
            size: Some(size),
            modified: None,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Metadata {
            name: name.into(),
            is_dir: true,
            size: None,
            modified: None,
        }
    }

    pub fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = Some(modified);
        self
    }
}

/// Byte stream returned by [`Backend::open_read`].
pub type ReadStream = Box<dyn Read + Send>;

/// Byte sink returned by [`Backend::open_write`].
///
/// Implementations commit the written bytes no later than drop; callers that
/// need to observe commit errors should call `flush` explicitly.
pub type WriteSink = Box<dyn Write + Send>;

/// A backend shared between the registry and in-flight operations.
pub type BackendBox = Arc<dyn Backend>;

/// Minimal storage capability consumed by the routing core.
///
/// All methods take `&self`; implementations manage their own
/// synchronization (interior mutability), which keeps the trait object-safe
/// and lets a single backend serve concurrent requests.
///
/// Paths are POSIX-style absolute strings. A backend may assume the leading
/// slash is present and `.`/`..` segments have been collapsed.
pub trait Backend: Send + Sync {
    /// Short tag describing the backend type ("memory", "local", ...).
    /// Surfaced to clients in the listing response's storage info.
    fn kind(&self) -> &'static str;

    /// List the immediate children of a directory.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the path does not exist.
    /// * `NotADirectory` if the path names a file.
    fn list(&self, path: &str) -> Result<Vec<Metadata>, BackendError>;

    /// Report metadata for a single path.
    fn stat(&self, path: &str) -> Result<Metadata, BackendError>;

    /// Open a file for reading.
    fn open_read(&self, path: &str) -> Result<ReadStream, BackendError>;

    /// Open a file for writing, creating it if absent.
    ///
    /// With `truncate` the previous contents are discarded; without it the
    /// sink appends. The parent directory must already exist.
    fn open_write(&self, path: &str, truncate: bool) -> Result<WriteSink, BackendError>;

    /// Create a single directory level.
    ///
    /// # Errors
    ///
    /// * `AlreadyExists` if the path is already present.
    /// * `NotFound` if the parent directory is missing.
    fn make_dir(&self, path: &str) -> Result<(), BackendError>;

    /// Remove a single file.
    fn remove_file(&self, path: &str) -> Result<(), BackendError>;

    /// Remove a directory and everything beneath it.
    fn remove_tree(&self, path: &str) -> Result<(), BackendError>;

    fn exists(&self, path: &str) -> Result<bool, BackendError>;

    fn is_dir(&self, path: &str) -> Result<bool, BackendError>;
}

impl<T: Backend + ?Sized> Backend for Arc<T> {
    fn kind(&self) -> &'static str {
        self.as_ref().kind()
    }

    fn list(&self, path: &str) -> Result<Vec<Metadata>, BackendError> {
        self.as_ref().list(path)
    }

    fn stat(&self, path: &str) -> Result<Metadata, BackendError> {
        self.as_ref().stat(path)
    }

    fn open_read(&self, path: &str) -> Result<ReadStream, BackendError> {
        self.as_ref().open_read(path)
    }

    fn open_write(&self, path: &str, truncate: bool) -> Result<WriteSink, BackendError> {
        self.as_ref().open_write(path, truncate)
    }

    fn make_dir(&self, path: &str) -> Result<(), BackendError> {
        self.as_ref().make_dir(path)
    }

    fn remove_file(&self, path: &str) -> Result<(), BackendError> {
        self.as_ref().remove_file(path)
    }

    fn remove_tree(&self, path: &str) -> Result<(), BackendError> {
        self.as_ref().remove_tree(path)
    }

    fn exists(&self, path: &str) -> Result<bool, BackendError> {
        self.as_ref().exists(path)
    }

    fn is_dir(&self, path: &str) -> Result<bool, BackendError> {
        self.as_ref().is_dir(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_constructors() {
        let f = Metadata::file("a.txt", 12);
        assert!(!f.is_dir);
        assert_eq!(f.size, Some(12));
        assert_eq!(f.modified, None);

        let d = Metadata::dir("sub");
        assert!(d.is_dir);
        assert_eq!(d.size, None);

        let now = SystemTime::now();
        let f = Metadata::file("b", 0).with_modified(now);
        assert_eq!(f.modified, Some(now));
    }
}
