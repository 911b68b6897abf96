//! Read-only wrapper around any backend.

use cabinet_backend::{Backend, BackendBox, BackendError, Metadata, ReadStream, WriteSink};

/// Wraps a backend and rejects every mutation with
/// [`BackendError::ReadOnly`]. Reads pass through untouched.
pub struct ReadOnly {
    inner: BackendBox,
}

impl ReadOnly {
    pub fn new(inner: BackendBox) -> Self {
        ReadOnly { inner }
    }

    fn deny(path: &str) -> BackendError {
        BackendError::ReadOnly {
            path: path.to_string(),
        }
    }
}

impl Backend for ReadOnly {
    fn kind(&self) -> &'static str {
        self.inner.kind()
    }

    fn list(&self, path: &str) -> Result<Vec<Metadata>, BackendError> {
        self.inner.list(path)
    }

    fn stat(&self, path: &str) -> Result<Metadata, BackendError> {
        self.inner.stat(path)
    }

    fn open_read(&self, path: &str) -> Result<ReadStream, BackendError> {
        self.inner.open_read(path)
    }

    fn open_write(&self, path: &str, _truncate: bool) -> Result<WriteSink, BackendError> {
        Err(Self::deny(path))
    }

    fn make_dir(&self, path: &str) -> Result<(), BackendError> {
        Err(Self::deny(path))
    }

    fn remove_file(&self, path: &str) -> Result<(), BackendError> {
        Err(Self::deny(path))
    }

    fn remove_tree(&self, path: &str) -> Result<(), BackendError> {
        Err(Self::deny(path))
    }

    fn exists(&self, path: &str) -> Result<bool, BackendError> {
        self.inner.exists(path)
    }

    fn is_dir(&self, path: &str) -> Result<bool, BackendError> {
        self.inner.is_dir(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::MemoryBackend;
    use std::sync::Arc;

    #[test]
    fn reads_pass_through_and_writes_fail() {
        let inner = MemoryBackend::new();
        inner.put("/a.txt", "a");
        let ro = ReadOnly::new(Arc::new(inner));

        assert_eq!(ro.kind(), "memory");
        assert!(ro.exists("/a.txt").unwrap());
        assert_eq!(ro.list("/").unwrap().len(), 1);

        assert!(matches!(
            ro.open_write("/a.txt", true),
            Err(BackendError::ReadOnly { .. })
        ));
        assert!(matches!(ro.make_dir("/d"), Err(BackendError::ReadOnly { .. })));
        assert!(matches!(
            ro.remove_file("/a.txt"),
            Err(BackendError::ReadOnly { .. })
        ));
        assert!(matches!(
            ro.remove_tree("/"),
            Err(BackendError::ReadOnly { .. })
        ));
    }
}
