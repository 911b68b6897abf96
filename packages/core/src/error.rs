//! Error types for the routing core.

use cabinet_backend::BackendError;

/// Errors surfaced by operation handlers and the dispatcher.
///
/// Two broad kinds exist: malformed requests (unknown endpoint, invalid
/// archive name, missing parameters) and backend failures bubbled up from
/// storage. Both map to a 400-class JSON error response; nothing is retried.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Request shape is wrong: missing parameter, malformed body, bad name.
    #[error("{message}")]
    BadRequest { message: String },

    #[error("no endpoint for {method} '{action}'")]
    UnknownEndpoint { method: String, action: String },

    #[error("invalid archive name: '{name}'")]
    InvalidArchiveName { name: String },

    #[error("destination already exists: {path}")]
    DestinationExists { path: String },

    /// An archive entry would overwrite an existing file. Raised by the
    /// unarchive pre-flight pass, before anything has been written.
    #[error("archive entry collides with existing file: {path}")]
    Collision { path: String },

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest {
            message: message.into(),
        }
    }

    /// HTTP status the dispatcher reports for this error.
    pub fn status(&self) -> u16 {
        match self {
            Error::UnknownEndpoint { .. } => 404,
            _ => 400,
        }
    }
}
