//! Error type shared by all backend implementations.

/// Errors reported by a storage backend.
///
/// Backends map their native failures onto these variants so the routing
/// core can reason about them uniformly (for example, treating
/// `AlreadyExists` during parent-directory creation as benign).
#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("not found: {path}")]
    NotFound { path: String },

    #[error("already exists: {path}")]
    AlreadyExists { path: String },

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    #[error("is a directory: {path}")]
    IsADirectory { path: String },

    #[error("read-only storage: cannot modify {path}")]
    ReadOnly { path: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Other { message: String },
}

impl BackendError {
    /// Wrap an `io::Error` with the backend path it occurred at.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        BackendError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        BackendError::NotFound { path: path.into() }
    }

    pub fn already_exists(path: impl Into<String>) -> Self {
        BackendError::AlreadyExists { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_path() {
        let e = BackendError::not_found("/foo/bar");
        assert!(e.to_string().contains("/foo/bar"));

        let e = BackendError::ReadOnly {
            path: "/x".to_string(),
        };
        assert!(e.to_string().contains("read-only"));
    }

    #[test]
    fn io_keeps_source() {
        use std::error::Error;

        let e = BackendError::io(
            "/f",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(e.source().is_some());
    }
}
