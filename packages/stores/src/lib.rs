//! Concrete storage backends for cabinet.
//!
//! These implement the `cabinet-backend` capability interface and are what a
//! deployment registers with the routing core:
//!
//! - [`MemoryBackend`] - files and directories held in process memory.
//! - [`LocalBackend`] - files under a root directory on the host filesystem.
//! - [`ReadOnly`] - wrapper that rejects every mutation of an inner backend.
//!
//! The routing core itself never depends on this crate; it consumes backends
//! only through `Arc<dyn Backend>`.

pub mod in_memory;
pub mod local_disk;
pub mod read_only;

pub use in_memory::MemoryBackend;
pub use local_disk::LocalBackend;
pub use read_only::ReadOnly;
