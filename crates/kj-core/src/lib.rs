//! kkojil/crates/kj-core/src/lib.rs
//!
//! The central domain logic and interface definitions for kkojil: question
//! chains, the key-value backed content store, and the ranking views
//! derived from it.

pub mod clock;
pub mod error;
pub mod models;
pub mod ranking;
pub mod store;
pub mod traits;
pub mod validation;

// Re-exporting for easier access in other crates
pub use clock::*;
pub use error::*;
pub use models::*;
pub use store::ContentStore;
pub use traits::*;
