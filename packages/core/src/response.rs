//! Framework-neutral operation responses.

use std::io::Read;

/// Response payload: JSON, a byte stream, or nothing.
pub enum Body {
    Json(serde_json::Value),
    Stream {
        reader: Box<dyn Read + Send>,
        len: Option<u64>,
    },
    Empty,
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Body::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Body::Stream { len, .. } => f.debug_struct("Stream").field("len", len).finish(),
            Body::Empty => f.write_str("Empty"),
        }
    }
}

/// Status, headers, and body of a completed operation.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl Response {
    /// 200 with a JSON body.
    pub fn json(value: serde_json::Value) -> Self {
        Response {
            status: 200,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Body::Json(value),
        }
    }

    /// 200 with the bare string `"ok"`, used by operations with no payload.
    pub fn ok() -> Self {
        Response::json(serde_json::Value::String("ok".to_string()))
    }

    /// 200 with no body. Used for CORS preflight.
    pub fn empty() -> Self {
        Response {
            status: 200,
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    /// 200 streaming raw bytes. `len` sets `Content-Length` when known.
    pub fn stream(reader: Box<dyn Read + Send>, len: Option<u64>) -> Self {
        let mut headers = Vec::new();
        if let Some(n) = len {
            headers.push(("Content-Length".to_string(), n.to_string()));
        }
        Response {
            status: 200,
            headers,
            body: Body::Stream { reader, len },
        }
    }

    /// An error response: `{"message": ..., "status": false}`.
    pub fn error(status: u16, message: &str) -> Self {
        Response {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Body::Json(serde_json::json!({
                "message": message,
                "status": false,
            })),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The JSON body, if this is a JSON response.
    pub fn json_body(&self) -> Option<&serde_json::Value> {
        match &self.body {
            Body::Json(v) => Some(v),
            _ => None,
        }
    }
}
