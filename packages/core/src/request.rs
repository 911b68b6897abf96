//! Framework-neutral operation requests.
//!
//! The dispatcher consumes these instead of any particular HTTP server's
//! request type. An embedding translates its framework's request into an
//! [`OperationRequest`] and translates the returned response back out.

use std::collections::HashMap;
use std::io::Read;

/// HTTP method of a request. Only `GET`, `POST`, and `OPTIONS` route to
/// endpoints; the rest exist so embeddings can pass through whatever they
/// receive and get a proper unknown-endpoint error back.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded file: the client-supplied name plus its content stream.
pub struct Upload {
    pub name: String,
    pub content: Box<dyn Read + Send>,
}

impl Upload {
    pub fn new(name: impl Into<String>, content: Box<dyn Read + Send>) -> Self {
        Upload {
            name: name.into(),
            content,
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Upload {
            name: name.into(),
            content: Box::new(std::io::Cursor::new(bytes)),
        }
    }
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload").field("name", &self.name).finish()
    }
}

/// A single operation to dispatch: method, query parameters, optional JSON
/// body, and any uploaded files.
///
/// Built with the `get`/`post` constructors and `with_*` builders:
///
/// ```
/// use cabinet_core::OperationRequest;
///
/// let req = OperationRequest::get("index").with_query("adapter", "m1");
/// assert_eq!(req.query("q"), Some("index"));
/// ```
#[derive(Debug)]
pub struct OperationRequest {
    pub method: Method,
    pub query: HashMap<String, String>,
    pub body: Option<serde_json::Value>,
    pub uploads: Vec<Upload>,
}

impl OperationRequest {
    pub fn new(method: Method) -> Self {
        OperationRequest {
            method,
            query: HashMap::new(),
            body: None,
            uploads: Vec::new(),
        }
    }

    /// A `GET` request for the given `q` action.
    pub fn get(action: &str) -> Self {
        OperationRequest::new(Method::Get).with_query("q", action)
    }

    /// A `POST` request for the given `q` action.
    pub fn post(action: &str) -> Self {
        OperationRequest::new(Method::Post).with_query("q", action)
    }

    /// A CORS preflight request.
    pub fn options() -> Self {
        OperationRequest::new(Method::Options)
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_upload(mut self, upload: Upload) -> Self {
        self.uploads.push(upload);
        self
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(|s| s.as_str())
    }
}
