//! In-memory backend.
//!
//! Files and directories live in two maps guarded by one `RwLock`. Intended
//! for tests and ephemeral storage; contents are lost on drop.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use bytes::Bytes;

use cabinet_backend::{Backend, BackendError, Metadata, ReadStream, WriteSink};

struct FileEntry {
    data: Bytes,
    modified: SystemTime,
}

struct MemState {
    files: HashMap<String, FileEntry>,
    dirs: HashMap<String, SystemTime>,
}

/// Backend holding all data in process memory.
pub struct MemoryBackend {
    state: Arc<RwLock<MemState>>,
}

/// Parent directory of an absolute path ("/foo/bar" -> "/foo", "/foo" -> "/").
fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

/// Base name of an absolute path ("/foo/bar" -> "bar").
fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

impl MemoryBackend {
    pub fn new() -> Self {
        let mut dirs = HashMap::new();
        dirs.insert("/".to_string(), SystemTime::now());
        MemoryBackend {
            state: Arc::new(RwLock::new(MemState {
                files: HashMap::new(),
                dirs,
            })),
        }
    }

    /// Insert a file, creating any missing parent directories.
    ///
    /// Convenience for seeding test trees; regular writes go through
    /// [`Backend::open_write`].
    pub fn put(&self, path: &str, data: impl Into<Bytes>) {
        let mut state = self.state.write().unwrap();
        let now = SystemTime::now();

        let mut dir = String::new();
        for segment in parent_of(path).split('/').filter(|s| !s.is_empty()) {
            dir.push('/');
            dir.push_str(segment);
            state.dirs.entry(dir.clone()).or_insert(now);
        }
        state.files.insert(
            path.to_string(),
            FileEntry {
                data: data.into(),
                modified: now,
            },
        );
    }

    fn lock(&self) -> std::sync::RwLockReadGuard<'_, MemState> {
        // Lock poisoning only happens if another thread panicked mid-write;
        // propagating the panic is the honest outcome for an in-memory store.
        self.state.read().unwrap()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Buffering sink that commits to the shared state on flush or drop.
struct MemWriter {
    state: Arc<RwLock<MemState>>,
    path: String,
    buf: Vec<u8>,
}

impl MemWriter {
    fn commit(&mut self) {
        let mut state = self.state.write().unwrap();
        state.files.insert(
            self.path.clone(),
            FileEntry {
                data: Bytes::from(self.buf.clone()),
                modified: SystemTime::now(),
            },
        );
    }
}

impl Write for MemWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit();
        Ok(())
    }
}

impl Drop for MemWriter {
    fn drop(&mut self) {
        self.commit();
    }
}

impl Backend for MemoryBackend {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn list(&self, path: &str) -> Result<Vec<Metadata>, BackendError> {
        let state = self.lock();
        if !state.dirs.contains_key(path) {
            if state.files.contains_key(path) {
                return Err(BackendError::NotADirectory {
                    path: path.to_string(),
                });
            }
            return Err(BackendError::not_found(path));
        }

        let mut entries = Vec::new();
        for (dir, modified) in &state.dirs {
            if dir != path && parent_of(dir) == path {
                entries.push(Metadata::dir(name_of(dir)).with_modified(*modified));
            }
        }
        for (file, entry) in &state.files {
            if parent_of(file) == path {
                entries.push(
                    Metadata::file(name_of(file), entry.data.len() as u64)
                        .with_modified(entry.modified),
                );
            }
        }
        Ok(entries)
    }

    fn stat(&self, path: &str) -> Result<Metadata, BackendError> {
        let state = self.lock();
        if let Some(modified) = state.dirs.get(path) {
            let name = if path == "/" { "" } else { name_of(path) };
            return Ok(Metadata::dir(name).with_modified(*modified));
        }
        if let Some(entry) = state.files.get(path) {
            return Ok(
                Metadata::file(name_of(path), entry.data.len() as u64)
                    .with_modified(entry.modified),
            );
        }
        Err(BackendError::not_found(path))
    }

    fn open_read(&self, path: &str) -> Result<ReadStream, BackendError> {
        let state = self.lock();
        if state.dirs.contains_key(path) {
            return Err(BackendError::IsADirectory {
                path: path.to_string(),
            });
        }
        let entry = state
            .files
            .get(path)
            .ok_or_else(|| BackendError::not_found(path))?;
        Ok(Box::new(io::Cursor::new(entry.data.clone())))
    }

    fn open_write(&self, path: &str, truncate: bool) -> Result<WriteSink, BackendError> {
        let state = self.lock();
        if state.dirs.contains_key(path) {
            return Err(BackendError::IsADirectory {
                path: path.to_string(),
            });
        }
        if !state.dirs.contains_key(parent_of(path)) {
            return Err(BackendError::not_found(parent_of(path)));
        }
        let buf = if truncate {
            Vec::new()
        } else {
            state
                .files
                .get(path)
                .map(|e| e.data.to_vec())
                .unwrap_or_default()
        };
        drop(state);

        Ok(Box::new(MemWriter {
            state: Arc::clone(&self.state),
            path: path.to_string(),
            buf,
        }))
    }

    fn make_dir(&self, path: &str) -> Result<(), BackendError> {
        let mut state = self.state.write().unwrap();
        if state.dirs.contains_key(path) || state.files.contains_key(path) {
            return Err(BackendError::already_exists(path));
        }
        if !state.dirs.contains_key(parent_of(path)) {
            return Err(BackendError::not_found(parent_of(path)));
        }
        state.dirs.insert(path.to_string(), SystemTime::now());
        Ok(())
    }

    fn remove_file(&self, path: &str) -> Result<(), BackendError> {
        let mut state = self.state.write().unwrap();
        if state.dirs.contains_key(path) {
            return Err(BackendError::IsADirectory {
                path: path.to_string(),
            });
        }
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| BackendError::not_found(path))
    }

    fn remove_tree(&self, path: &str) -> Result<(), BackendError> {
        let mut state = self.state.write().unwrap();
        if !state.dirs.contains_key(path) {
            if state.files.contains_key(path) {
                return Err(BackendError::NotADirectory {
                    path: path.to_string(),
                });
            }
            return Err(BackendError::not_found(path));
        }

        let prefix = if path == "/" {
            "/".to_string()
        } else {
            format!("{}/", path)
        };
        state
            .files
            .retain(|p, _| !p.starts_with(&prefix) && p.as_str() != path);
        state
            .dirs
            .retain(|p, _| !p.starts_with(&prefix) && p.as_str() != path);
        // The root directory always exists.
        state.dirs.entry("/".to_string()).or_insert(SystemTime::now());
        Ok(())
    }

    fn exists(&self, path: &str) -> Result<bool, BackendError> {
        let state = self.lock();
        Ok(state.dirs.contains_key(path) || state.files.contains_key(path))
    }

    fn is_dir(&self, path: &str) -> Result<bool, BackendError> {
        Ok(self.lock().dirs.contains_key(path))
    }
}
