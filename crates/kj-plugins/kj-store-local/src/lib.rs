//! # kj-store-local
//!
//! Process-local implementations of `KeyValueStore`:
//! - [`MemoryStore`]: a map that lives as long as the process.
//! - [`LocalFileStore`]: the same map mirrored to one JSON document on disk,
//!   replaced atomically on every write.

mod file;
mod memory;

pub use file::LocalFileStore;
pub use memory::MemoryStore;
