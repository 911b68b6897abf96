//! The request dispatcher and its public entry point.

use std::sync::Arc;

use cabinet_backend::BackendBox;

use crate::ops::{self, Endpoint};
use crate::registry::AdapterRegistry;
use crate::request::{Method, OperationRequest};
use crate::response::Response;

/// Routes operation requests to handlers over a shared adapter registry.
///
/// `FileManager` never returns `Err`: every failure becomes a JSON error
/// response in the legacy `{"message": ..., "status": false}` shape, so an
/// embedding can hand the result straight back to its HTTP layer.
pub struct FileManager {
    registry: Arc<AdapterRegistry>,
    enable_cors: bool,
}

impl FileManager {
    pub fn new() -> Self {
        FileManager {
            registry: Arc::new(AdapterRegistry::new()),
            enable_cors: false,
        }
    }

    /// Add permissive CORS headers to every response, preflights included.
    pub fn with_cors(mut self) -> Self {
        self.enable_cors = true;
        self
    }

    pub fn registry(&self) -> &Arc<AdapterRegistry> {
        &self.registry
    }

    pub fn add_backend(&self, key: &str, backend: BackendBox) {
        self.registry.add(key, backend);
    }

    pub fn remove_backend(&self, key: &str) {
        self.registry.remove(key);
    }

    /// Handle one request end to end.
    pub fn handle(&self, mut req: OperationRequest) -> Response {
        if req.method == Method::Options {
            return self.finish(Response::empty());
        }

        let action = match req.query("q") {
            Some(a) => a.to_string(),
            None => {
                return self.finish(Response::error(400, "missing 'q' parameter"));
            }
        };

        let endpoint = match Endpoint::resolve(req.method, &action) {
            Some(e) => e,
            None => {
                let message = format!("no endpoint for {} '{}'", req.method, action);
                log::warn!("{}", message);
                return self.finish(Response::error(404, &message));
            }
        };

        log::debug!("Dispatching {} '{}'...", req.method, action);
        match ops::dispatch(endpoint, &self.registry, &mut req) {
            Ok(resp) => self.finish(resp),
            Err(e) => {
                log::warn!("{} '{}' failed: {}", req.method, action, e);
                self.finish(Response::error(e.status(), &e.to_string()))
            }
        }
    }

    fn finish(&self, resp: Response) -> Response {
        if self.enable_cors {
            resp.with_header("Access-Control-Allow-Origin", "*")
                .with_header("Access-Control-Allow-Headers", "*")
        } else {
            resp
        }
    }
}

impl Default for FileManager {
    fn default() -> Self {
        FileManager::new()
    }
}
