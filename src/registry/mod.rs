//! Entity registry
//!
//! The dispatcher never owns entity state; everything lives behind the
//! [`Registry`] trait. The in-memory implementation is the default
//! backend and the one the test suite runs against.

pub mod memory;
pub mod patch;
pub mod traits;

pub use memory::InMemoryRegistry;
pub use patch::{content_hash, merge_patch};
pub use traits::{Registry, RegistryError, RegistryResult, SharedRegistry, UpsertOutcome};
