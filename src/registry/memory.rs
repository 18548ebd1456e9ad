//! In-memory registry implementation

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::patch::{content_hash, merge_patch};
use super::traits::{Registry, RegistryError, RegistryResult, UpsertOutcome};
use crate::domain::{
    Cdr, CdrId, CountryCode, LastUpdated, Location, LocationId, PartyId, Session, SessionId,
    Tariff, TariffId, Token, TokenId, TokenType,
};

type PartyScopedKey = (String, String, String);
/// Tokens are additionally keyed by their type: the same RFID uid and an
/// app token may coexist.
type TokenKey = (String, String, String, TokenType);

/// DashMap-backed registry. The default backend; also what the test
/// suite seeds.
#[derive(Default)]
pub struct InMemoryRegistry {
    locations: DashMap<PartyScopedKey, Location>,
    tariffs: DashMap<PartyScopedKey, Tariff>,
    sessions: DashMap<PartyScopedKey, Session>,
    cdrs: DashMap<PartyScopedKey, Cdr>,
    tokens: DashMap<TokenKey, Token>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(country_code: &CountryCode, party_id: &PartyId, id: &str) -> PartyScopedKey {
        (
            country_code.as_str().to_string(),
            party_id.as_str().to_string(),
            id.to_string(),
        )
    }

    fn token_key(
        country_code: &CountryCode,
        party_id: &PartyId,
        uid: &TokenId,
        token_type: TokenType,
    ) -> TokenKey {
        (
            country_code.as_str().to_string(),
            party_id.as_str().to_string(),
            uid.as_str().to_string(),
            token_type,
        )
    }

    /// Collect entities of one party in deterministic order
    /// (last_updated, then id) so pagination windows are stable.
    fn party_slice<T, F>(map: &DashMap<PartyScopedKey, T>, cc: &str, party: &str, id_of: F) -> Vec<T>
    where
        T: Clone + LastUpdated,
        F: Fn(&T) -> String,
    {
        let mut items: Vec<T> = map
            .iter()
            .filter(|e| e.key().0 == cc && e.key().1 == party)
            .map(|e| e.value().clone())
            .collect();
        items.sort_by(|a, b| {
            a.last_updated()
                .cmp(&b.last_updated())
                .then_with(|| id_of(a).cmp(&id_of(b)))
        });
        items
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn list_locations(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
    ) -> Vec<Location> {
        Self::party_slice(
            &self.locations,
            country_code.as_str(),
            party_id.as_str(),
            |l| l.id.to_string(),
        )
    }

    async fn get_location(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &LocationId,
    ) -> Option<Location> {
        self.locations
            .get(&Self::key(country_code, party_id, id.as_str()))
            .map(|e| e.clone())
    }

    async fn put_location(&self, location: Location) {
        let key = Self::key(&location.country_code, &location.party_id, location.id.as_str());
        self.locations.insert(key, location);
    }

    async fn list_tariffs(&self, country_code: &CountryCode, party_id: &PartyId) -> Vec<Tariff> {
        Self::party_slice(&self.tariffs, country_code.as_str(), party_id.as_str(), |t| {
            t.id.to_string()
        })
    }

    async fn get_tariff(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &TariffId,
    ) -> Option<Tariff> {
        self.tariffs
            .get(&Self::key(country_code, party_id, id.as_str()))
            .map(|e| e.clone())
    }

    async fn put_tariff(&self, tariff: Tariff) {
        let key = Self::key(&tariff.country_code, &tariff.party_id, tariff.id.as_str());
        self.tariffs.insert(key, tariff);
    }

    async fn list_sessions(&self, country_code: &CountryCode, party_id: &PartyId) -> Vec<Session> {
        Self::party_slice(&self.sessions, country_code.as_str(), party_id.as_str(), |s| {
            s.id.to_string()
        })
    }

    async fn get_session(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &SessionId,
    ) -> Option<Session> {
        self.sessions
            .get(&Self::key(country_code, party_id, id.as_str()))
            .map(|e| e.clone())
    }

    async fn put_session(&self, session: Session) {
        let key = Self::key(&session.country_code, &session.party_id, session.id.as_str());
        self.sessions.insert(key, session);
    }

    async fn list_cdrs(&self, country_code: &CountryCode, party_id: &PartyId) -> Vec<Cdr> {
        Self::party_slice(&self.cdrs, country_code.as_str(), party_id.as_str(), |c| {
            c.id.to_string()
        })
    }

    async fn get_cdr(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &CdrId,
    ) -> Option<Cdr> {
        self.cdrs
            .get(&Self::key(country_code, party_id, id.as_str()))
            .map(|e| e.clone())
    }

    async fn put_cdr(&self, cdr: Cdr) {
        let key = Self::key(&cdr.country_code, &cdr.party_id, cdr.id.as_str());
        self.cdrs.insert(key, cdr);
    }

    async fn list_tokens(&self, country_code: &CountryCode, party_id: &PartyId) -> Vec<Token> {
        let mut items: Vec<Token> = self
            .tokens
            .iter()
            .filter(|e| e.key().0 == country_code.as_str() && e.key().1 == party_id.as_str())
            .map(|e| e.value().clone())
            .collect();
        items.sort_by(|a, b| {
            a.last_updated
                .cmp(&b.last_updated)
                .then_with(|| a.uid.as_str().cmp(b.uid.as_str()))
        });
        items
    }

    async fn get_token(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        uid: &TokenId,
        token_type: TokenType,
    ) -> Option<Token> {
        self.tokens
            .get(&Self::token_key(country_code, party_id, uid, token_type))
            .map(|e| e.clone())
    }

    async fn upsert_token(
        &self,
        token: Token,
        allow_downgrade: bool,
    ) -> RegistryResult<UpsertOutcome> {
        let key = Self::token_key(
            &token.country_code,
            &token.party_id,
            &token.uid,
            token.token_type,
        );
        let created = match self.tokens.get(&key) {
            Some(existing) if token.last_updated < existing.last_updated && !allow_downgrade => {
                return Err(RegistryError::Downgrade {
                    stored: existing.last_updated,
                });
            }
            Some(_) => false,
            None => true,
        };
        let etag = content_hash(&token);
        self.tokens.insert(key, token);
        Ok(UpsertOutcome { created, etag })
    }

    async fn patch_token(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        uid: &TokenId,
        token_type: TokenType,
        patch: Value,
        allow_downgrade: bool,
    ) -> RegistryResult<(Token, String)> {
        let key = Self::token_key(country_code, party_id, uid, token_type);
        let stored = self
            .tokens
            .get(&key)
            .map(|e| e.clone())
            .ok_or(RegistryError::NotFound)?;

        let mut doc = serde_json::to_value(&stored)
            .map_err(|e| RegistryError::InvalidPatch(e.to_string()))?;
        merge_patch(&mut doc, &patch);
        let patched: Token = serde_json::from_value(doc)
            .map_err(|e| RegistryError::InvalidPatch(e.to_string()))?;

        // The patch must not move the token to another key.
        if patched.uid != stored.uid
            || patched.country_code != stored.country_code
            || patched.party_id != stored.party_id
            || patched.token_type != stored.token_type
        {
            return Err(RegistryError::InvalidPatch(
                "key fields cannot be changed".to_string(),
            ));
        }

        if patched.last_updated < stored.last_updated && !allow_downgrade {
            return Err(RegistryError::Downgrade {
                stored: stored.last_updated,
            });
        }

        let etag = content_hash(&patched);
        self.tokens.insert(key, patched.clone());
        Ok((patched, etag))
    }

    async fn remove_token(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        uid: &TokenId,
        token_type: TokenType,
    ) -> Option<Token> {
        self.tokens
            .remove(&Self::token_key(country_code, party_id, uid, token_type))
            .map(|(_, token)| token)
    }

    async fn clear_tokens(&self, country_code: &CountryCode, party_id: &PartyId) -> usize {
        let keys: Vec<TokenKey> = self
            .tokens
            .iter()
            .filter(|e| e.key().0 == country_code.as_str() && e.key().1 == party_id.as_str())
            .map(|e| e.key().clone())
            .collect();
        let mut removed = 0;
        for key in keys {
            if self.tokens.remove(&key).is_some() {
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn token(uid: &str, age_minutes: i64) -> Token {
        serde_json::from_value(serde_json::json!({
            "country_code": "DE",
            "party_id": "ABC",
            "uid": uid,
            "type": "RFID",
            "contract_id": "DE8ACC12E46L89",
            "issuer": "TheNewMotion",
            "valid": true,
            "whitelist": "ALLOWED",
            "last_updated": (Utc::now() - Duration::minutes(age_minutes)).to_rfc3339(),
        }))
        .unwrap()
    }

    fn party() -> (CountryCode, PartyId) {
        ("DE".parse().unwrap(), "ABC".parse().unwrap())
    }

    #[tokio::test]
    async fn upsert_reports_created_then_updated() {
        let registry = InMemoryRegistry::new();
        let first = registry.upsert_token(token("TOK1", 10), false).await.unwrap();
        assert!(first.created);
        let second = registry.upsert_token(token("TOK1", 5), false).await.unwrap();
        assert!(!second.created);
        assert_ne!(first.etag, second.etag);
    }

    #[tokio::test]
    async fn upsert_rejects_strictly_older_writes() {
        let registry = InMemoryRegistry::new();
        registry.upsert_token(token("TOK1", 5), false).await.unwrap();
        let err = registry.upsert_token(token("TOK1", 10), false).await.unwrap_err();
        assert!(matches!(err, RegistryError::Downgrade { .. }));
        // forced write goes through
        registry.upsert_token(token("TOK1", 10), true).await.unwrap();
    }

    #[tokio::test]
    async fn upsert_with_equal_timestamp_is_an_update() {
        let registry = InMemoryRegistry::new();
        let tok = token("TOK1", 5);
        registry.upsert_token(tok.clone(), false).await.unwrap();
        let outcome = registry.upsert_token(tok, false).await.unwrap();
        assert!(!outcome.created);
    }

    #[tokio::test]
    async fn patch_merges_and_guards_key_fields() {
        let registry = InMemoryRegistry::new();
        let (cc, party) = party();
        let uid: TokenId = "TOK1".parse().unwrap();
        registry.upsert_token(token("TOK1", 5), false).await.unwrap();

        let (patched, etag) = registry
            .patch_token(
                &cc,
                &party,
                &uid,
                TokenType::Rfid,
                serde_json::json!({"valid": false}),
                false,
            )
            .await
            .unwrap();
        assert!(!patched.valid);
        assert_eq!(etag, content_hash(&patched));

        let err = registry
            .patch_token(
                &cc,
                &party,
                &uid,
                TokenType::Rfid,
                serde_json::json!({"uid": "OTHER"}),
                false,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPatch(_)));
    }

    #[tokio::test]
    async fn list_is_sorted_and_party_scoped() {
        let registry = InMemoryRegistry::new();
        let (cc, party) = party();
        registry.upsert_token(token("B", 1), false).await.unwrap();
        registry.upsert_token(token("A", 30), false).await.unwrap();
        let mut other = token("C", 1);
        other.party_id = "XYZ".parse().unwrap();
        registry.upsert_token(other, false).await.unwrap();

        let tokens = registry.list_tokens(&cc, &party).await;
        let uids: Vec<&str> = tokens.iter().map(|t| t.uid.as_str()).collect();
        assert_eq!(uids, ["A", "B"]);
    }

    #[tokio::test]
    async fn clear_tokens_counts_removals() {
        let registry = InMemoryRegistry::new();
        let (cc, party) = party();
        registry.upsert_token(token("A", 1), false).await.unwrap();
        registry.upsert_token(token("B", 1), false).await.unwrap();
        assert_eq!(registry.clear_tokens(&cc, &party).await, 2);
        assert!(registry.list_tokens(&cc, &party).await.is_empty());
    }
}
