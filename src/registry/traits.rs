//! Registry trait definitions

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{
    Cdr, CdrId, CountryCode, Location, LocationId, PartyId, Session, SessionId, Tariff, TariffId,
    Token, TokenId, TokenType,
};

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Write carried a `last_updated` strictly older than the stored one.
    #[error("stored object is newer ({stored})")]
    Downgrade { stored: DateTime<Utc> },

    /// Patch target does not exist.
    #[error("no such object")]
    NotFound,

    /// Patch document produced an object that no longer deserializes.
    #[error("patch produced an invalid object: {0}")]
    InvalidPatch(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

// Tokens are the only entity written through the HTTP surface, so the
// registry's NotFound maps to the token-specific OCPI status.
impl From<RegistryError> for crate::domain::OcpiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Downgrade { stored } => Self::DowngradeRejected { stored },
            RegistryError::NotFound => Self::unknown_token(),
            RegistryError::InvalidPatch(msg) => Self::MalformedBody(msg),
        }
    }
}

/// Result of a token upsert. `etag` is the content hash of the stored
/// object, returned to the caller as the `ETag` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub created: bool,
    pub etag: String,
}

/// Read/write surface of the entity store.
///
/// Locations, tariffs, sessions and CDRs are read by the CPO routes and
/// written by ingest/seeding; tokens get full CRUD plus merge-patch with
/// the downgrade check.
#[async_trait]
pub trait Registry: Send + Sync {
    // Locations
    async fn list_locations(&self, country_code: &CountryCode, party_id: &PartyId)
        -> Vec<Location>;
    async fn get_location(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &LocationId,
    ) -> Option<Location>;
    async fn put_location(&self, location: Location);

    // Tariffs
    async fn list_tariffs(&self, country_code: &CountryCode, party_id: &PartyId) -> Vec<Tariff>;
    async fn get_tariff(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &TariffId,
    ) -> Option<Tariff>;
    async fn put_tariff(&self, tariff: Tariff);

    // Sessions
    async fn list_sessions(&self, country_code: &CountryCode, party_id: &PartyId) -> Vec<Session>;
    async fn get_session(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &SessionId,
    ) -> Option<Session>;
    async fn put_session(&self, session: Session);

    // CDRs
    async fn list_cdrs(&self, country_code: &CountryCode, party_id: &PartyId) -> Vec<Cdr>;
    async fn get_cdr(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &CdrId,
    ) -> Option<Cdr>;
    async fn put_cdr(&self, cdr: Cdr);

    // Tokens
    async fn list_tokens(&self, country_code: &CountryCode, party_id: &PartyId) -> Vec<Token>;
    async fn get_token(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        uid: &TokenId,
        token_type: TokenType,
    ) -> Option<Token>;
    /// Insert or replace a token. `allow_downgrade` bypasses the
    /// last-updated comparison for this one write.
    async fn upsert_token(
        &self,
        token: Token,
        allow_downgrade: bool,
    ) -> RegistryResult<UpsertOutcome>;
    /// Apply an RFC 7386 merge-patch to a stored token, honoring the same
    /// downgrade rule as upsert. Returns the patched token and its etag.
    async fn patch_token(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        uid: &TokenId,
        token_type: TokenType,
        patch: Value,
        allow_downgrade: bool,
    ) -> RegistryResult<(Token, String)>;
    async fn remove_token(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        uid: &TokenId,
        token_type: TokenType,
    ) -> Option<Token>;
    /// Drop every token of one (country code, party id) pair. Returns the
    /// number of removed tokens.
    async fn clear_tokens(&self, country_code: &CountryCode, party_id: &PartyId) -> usize;
}

pub type SharedRegistry = Arc<dyn Registry>;
