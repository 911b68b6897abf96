//! On-disk backend rooted at a host directory.
//!
//! Virtual absolute paths map to host paths under the root. The root must
//! exist and be a directory when the backend is constructed; it is
//! canonicalized so later joins cannot escape it through symlinked parents.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::PathBuf;

use cabinet_backend::{Backend, BackendError, Metadata, ReadStream, WriteSink};

/// Backend storing files under a directory on the host filesystem.
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Open a backend rooted at `root`.
    ///
    /// # Errors
    ///
    /// Fails when the root does not exist, is not a directory, or cannot be
    /// canonicalized.
    pub fn new(root: PathBuf) -> Result<LocalBackend, BackendError> {
        let display = root.display().to_string();
        let attr = fs::metadata(&root).map_err(|e| BackendError::io(&display, e))?;
        if !attr.is_dir() {
            return Err(BackendError::NotADirectory { path: display });
        }

        let root = root
            .canonicalize()
            .map_err(|e| BackendError::io(&display, e))?;
        Ok(LocalBackend { root })
    }

    /// Map a virtual absolute path to the host path under the root.
    fn host_path(&self, path: &str) -> PathBuf {
        let mut host = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty() && *s != "." && *s != "..") {
            host.push(segment);
        }
        host
    }

    fn map_io(path: &str, error: io::Error) -> BackendError {
        match error.kind() {
            io::ErrorKind::NotFound => BackendError::not_found(path),
            io::ErrorKind::AlreadyExists => BackendError::already_exists(path),
            _ => BackendError::io(path, error),
        }
    }

    fn metadata_of(name: String, attr: &fs::Metadata) -> Metadata {
        Metadata {
            name,
            is_dir: attr.is_dir(),
            size: if attr.is_dir() { None } else { Some(attr.len()) },
            modified: attr.modified().ok(),
        }
    }
}

impl Backend for LocalBackend {
    fn kind(&self) -> &'static str {
        "local"
    }

    fn list(&self, path: &str) -> Result<Vec<Metadata>, BackendError> {
        let host = self.host_path(path);
        log::debug!("Listing {}...", host.display());

        let attr = fs::metadata(&host).map_err(|e| Self::map_io(path, e))?;
        if !attr.is_dir() {
            return Err(BackendError::NotADirectory {
                path: path.to_string(),
            });
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&host).map_err(|e| Self::map_io(path, e))? {
            let entry = entry.map_err(|e| Self::map_io(path, e))?;
            let attr = entry.metadata().map_err(|e| Self::map_io(path, e))?;
            entries.push(Self::metadata_of(
                entry.file_name().to_string_lossy().into_owned(),
                &attr,
            ));
        }
        Ok(entries)
    }

    fn stat(&self, path: &str) -> Result<Metadata, BackendError> {
        let host = self.host_path(path);
        let attr = fs::metadata(&host).map_err(|e| Self::map_io(path, e))?;
        let name = host
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::metadata_of(name, &attr))
    }

    fn open_read(&self, path: &str) -> Result<ReadStream, BackendError> {
        let host = self.host_path(path);
        log::debug!("Reading {}...", host.display());
        let file = File::open(&host).map_err(|e| Self::map_io(path, e))?;
        Ok(Box::new(file))
    }

    fn open_write(&self, path: &str, truncate: bool) -> Result<WriteSink, BackendError> {
        let host = self.host_path(path);
        log::debug!("Writing {}...", host.display());
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(truncate)
            .append(!truncate)
            .open(&host)
            .map_err(|e| Self::map_io(path, e))?;
        Ok(Box::new(file))
    }

    fn make_dir(&self, path: &str) -> Result<(), BackendError> {
        fs::create_dir(self.host_path(path)).map_err(|e| Self::map_io(path, e))
    }

    fn remove_file(&self, path: &str) -> Result<(), BackendError> {
        let host = self.host_path(path);
        if host.is_dir() {
            return Err(BackendError::IsADirectory {
                path: path.to_string(),
            });
        }
        fs::remove_file(&host).map_err(|e| Self::map_io(path, e))
    }

    fn remove_tree(&self, path: &str) -> Result<(), BackendError> {
        let host = self.host_path(path);
        if !host.exists() {
            return Err(BackendError::not_found(path));
        }
        if !host.is_dir() {
            return Err(BackendError::NotADirectory {
                path: path.to_string(),
            });
        }
        fs::remove_dir_all(&host).map_err(|e| Self::map_io(path, e))
    }

    fn exists(&self, path: &str) -> Result<bool, BackendError> {
        Ok(self.host_path(path).exists())
    }

    fn is_dir(&self, path: &str) -> Result<bool, BackendError> {
        Ok(self.host_path(path).is_dir())
    }
}
