//! OCPI HTTP surface
//!
//! Route table, response envelope, path resolution and per-resource
//! handlers. Handlers are thin: resolve identifiers, call the registry,
//! wrap the result in the OCPI envelope.

pub mod envelope;
pub mod extract;
pub mod handlers;
pub mod hooks;
pub mod query;
pub mod resolver;
pub mod router;

pub use envelope::{OcpiEnvelope, OcpiReply};
pub use extract::OcpiJson;
pub use hooks::{RequestHooks, TracingHooks};
pub use router::{create_cpo_router, AppState};
