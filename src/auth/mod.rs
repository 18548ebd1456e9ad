//! Access token resolution
//!
//! OCPI peers authenticate with opaque access tokens
//! (`Authorization: Token <token>`). Tokens map to an [`AccessGrant`]
//! carrying the peer's role and status; routes for sessions, CDRs,
//! tokens and commands additionally require role `EMSP` with status
//! `ALLOWED` and answer 403 / OCPI 2000 otherwise, before any parsing.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::domain::{AllowedType, OcpiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyRole {
    Cpo,
    Emsp,
    Hub,
    Nsp,
    Other,
}

/// Resolved access grant for one peer's token.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub name: String,
    pub role: PartyRole,
    pub status: AllowedType,
}

impl AccessGrant {
    pub fn is_allowed_emsp(&self) -> bool {
        self.role == PartyRole::Emsp && self.status == AllowedType::Allowed
    }
}

/// Token → grant lookup. Registration happens at startup (from config)
/// or via the credentials exchange, which is out of scope here.
#[derive(Default)]
pub struct AccessTokenStore {
    grants: DashMap<String, AccessGrant>,
}

impl AccessTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, token: impl Into<String>, grant: AccessGrant) {
        self.grants.insert(token.into(), grant);
    }

    pub fn resolve(&self, token: &str) -> Option<AccessGrant> {
        self.grants.get(token).map(|g| g.clone())
    }
}

/// Extract the opaque token from an `Authorization: Token ...` header.
fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Token ").map(str::trim)
}

/// Resolve the caller's grant and stash it in request extensions. Does
/// not reject by itself; route-level gates decide.
pub async fn access_middleware(
    State(store): State<Arc<AccessTokenStore>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let grant = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_token)
        .and_then(|token| store.resolve(token));

    if let Some(grant) = grant {
        request.extensions_mut().insert(grant);
    }

    next.run(request).await
}

/// Gate: only EMSPs with status `ALLOWED` pass.
pub async fn require_emsp(request: Request<Body>, next: Next) -> Response {
    match request.extensions().get::<AccessGrant>() {
        Some(grant) if grant.is_allowed_emsp() => next.run(request).await,
        _ => OcpiError::Forbidden.into_response(),
    }
}
