//! Storage-agnostic file-manager core.
//!
//! Backends implementing [`cabinet_backend::Backend`] are registered under
//! string keys; clients address entries with virtual `key://path` paths and
//! drive everything through a small set of `(method, action)` operations.
//! [`FileManager`] is the entry point: build one, register backends, and
//! feed it [`OperationRequest`]s.
//!
//! ```
//! use std::sync::Arc;
//! use cabinet_core::{FileManager, OperationRequest};
//! use cabinet_stores::MemoryBackend;
//!
//! let fm = FileManager::new();
//! fm.add_backend("mem", Arc::new(MemoryBackend::new()));
//!
//! let resp = fm.handle(OperationRequest::get("index"));
//! assert!(resp.is_success());
//! ```

mod dispatch;
mod error;
mod ops;
mod registry;
mod request;
mod resource;
mod response;
pub mod vpath;

pub use cabinet_backend::{Backend, BackendBox, BackendError, Metadata, ReadStream, WriteSink};

pub use dispatch::FileManager;
pub use error::Error;
pub use ops::Endpoint;
pub use registry::{Adapter, AdapterRegistry};
pub use request::{Method, OperationRequest, Upload};
pub use resource::{project, Resource, ResourceKind};
pub use response::{Body, Response};
