//! Backend capability layer for cabinet.
//!
//! This layer defines the minimal storage interface the routing core depends
//! on: list a directory, stat a path, open byte streams, create and remove
//! files and directory subtrees. Everything above it (virtual paths, adapter
//! registry, operation handlers) is expressed purely in terms of these
//! traits; everything below it (in-memory, on-disk, remote storage) is an
//! implementation detail of a particular backend crate.
//!
//! All paths crossing this interface are POSIX-style absolute strings
//! (`/`-separated, leading slash) regardless of host platform. The routing
//! core normalizes paths before any backend call.

mod error;
mod traits;

pub use error::BackendError;
pub use traits::{Backend, BackendBox, Metadata, ReadStream, WriteSink};
