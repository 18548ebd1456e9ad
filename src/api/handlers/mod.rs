//! Per-resource route handlers

pub mod cdrs;
pub mod commands;
pub mod locations;
pub mod sessions;
pub mod tariffs;
pub mod tokens;
