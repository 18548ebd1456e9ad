//! # OCPI 2.2 CPO Service
//!
//! CPO-side OCPI HTTP bindings for an EV charging operator.
//!
//! ## Architecture
//!
//! - **domain**: OCPI entities, typed identifiers and the error model
//! - **registry**: entity store trait plus the in-memory backend
//! - **api**: route table, resolver, response envelope and handlers
//! - **auth**: inbound access tokens and the EMSP gate
//! - **client**: outbound mirror client against a remote EMSP
//! - **shared**: graceful shutdown plumbing

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod domain;
pub mod registry;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export the router and its state
pub use api::{create_cpo_router, AppState};

// Re-export the storage surface
pub use registry::{InMemoryRegistry, Registry, SharedRegistry};
