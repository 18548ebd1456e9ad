//! Outbound EMSP client
//!
//! Mirror of the server surface: builds the canonical module paths, sends
//! the verb with `Authorization: Token` plus correlation headers and
//! parses the response back into an [`OcpiEnvelope`]. A missing module
//! endpoint and a transport failure collapse into the same `-1` failure
//! envelope; no operation here returns `Err` for wire trouble.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use reqwest::{header, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::api::envelope::OcpiEnvelope;
use crate::domain::{
    Cdr, ConnectorId, CountryCode, Evse, EvseUid, Location, LocationId, PartyId, Session,
    SessionId, Tariff, TariffId, Token, TokenId, TokenStatus, TokenType,
};

const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// OCPI modules the client can address. Each maps to one negotiated
/// remote base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleId {
    Locations,
    Tariffs,
    Sessions,
    Cdrs,
    Tokens,
    Commands,
    ChargingProfiles,
}

impl ModuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locations => "locations",
            Self::Tariffs => "tariffs",
            Self::Sessions => "sessions",
            Self::Cdrs => "cdrs",
            Self::Tokens => "tokens",
            Self::Commands => "commands",
            Self::ChargingProfiles => "chargingprofiles",
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote module endpoints, normally filled from version/interface
/// negotiation with the peer. A module without an entry makes every
/// call against it fail with the `-1` envelope.
#[derive(Default)]
pub struct ModuleEndpoints {
    endpoints: DashMap<ModuleId, String>,
}

impl ModuleEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, module: ModuleId, base_url: impl Into<String>) {
        let base = base_url.into();
        self.endpoints
            .insert(module, base.trim_end_matches('/').to_string());
    }

    pub fn resolve(&self, module: ModuleId) -> Option<String> {
        self.endpoints.get(&module).map(|url| url.clone())
    }
}

/// HTTP client a CPO uses against one remote EMSP.
pub struct CpoClient {
    http: reqwest::Client,
    endpoints: Arc<ModuleEndpoints>,
    access_token: Option<String>,
}

impl CpoClient {
    pub fn new(
        endpoints: Arc<ModuleEndpoints>,
        access_token: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(CLIENT_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoints,
            access_token,
        })
    }

    /// Resolve the module base, send the request, parse the envelope.
    /// Every failure mode comes back as a `-1` envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        module: ModuleId,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> OcpiEnvelope<T> {
        let Some(base) = self.endpoints.resolve(module) else {
            return OcpiEnvelope::failure(format!("no remote endpoint for module {module}"));
        };
        let url = if path.is_empty() {
            base
        } else {
            format!("{base}/{path}")
        };
        self.execute_url(method, &url, body).await
    }

    async fn execute_url<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
    ) -> OcpiEnvelope<T> {
        debug!(%method, url, "outbound ocpi call");

        let mut request = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/json")
            .header("X-Request-ID", Uuid::new_v4().to_string())
            .header("X-Correlation-ID", Uuid::new_v4().to_string());
        if let Some(token) = &self.access_token {
            request = request.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => return OcpiEnvelope::failure(err.to_string()),
        };
        match response.json::<OcpiEnvelope<T>>().await {
            Ok(envelope) => envelope,
            Err(err) => OcpiEnvelope::failure(format!("malformed response body: {err}")),
        }
    }

    fn object_path(&self, country_code: &CountryCode, party_id: &PartyId, id: &str) -> String {
        format!("{country_code}/{party_id}/{id}")
    }

    fn body_of<T: serde::Serialize>(object: &T) -> Value {
        serde_json::to_value(object).unwrap_or(Value::Null)
    }

    // Locations

    pub async fn get_location(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &LocationId,
    ) -> OcpiEnvelope<Location> {
        let path = self.object_path(country_code, party_id, id.as_str());
        self.execute(ModuleId::Locations, Method::GET, &path, None)
            .await
    }

    pub async fn put_location(&self, location: &Location) -> OcpiEnvelope<Value> {
        let path = self.object_path(
            &location.country_code,
            &location.party_id,
            location.id.as_str(),
        );
        self.execute(
            ModuleId::Locations,
            Method::PUT,
            &path,
            Some(Self::body_of(location)),
        )
        .await
    }

    pub async fn patch_location(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &LocationId,
        patch: Value,
    ) -> OcpiEnvelope<Value> {
        let path = self.object_path(country_code, party_id, id.as_str());
        self.execute(ModuleId::Locations, Method::PATCH, &path, Some(patch))
            .await
    }

    // EVSEs

    pub async fn get_evse(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        location_id: &LocationId,
        evse_uid: &EvseUid,
    ) -> OcpiEnvelope<Evse> {
        let path = format!(
            "{}/{evse_uid}",
            self.object_path(country_code, party_id, location_id.as_str())
        );
        self.execute(ModuleId::Locations, Method::GET, &path, None)
            .await
    }

    pub async fn put_evse(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        location_id: &LocationId,
        evse: &Evse,
    ) -> OcpiEnvelope<Value> {
        let path = format!(
            "{}/{}",
            self.object_path(country_code, party_id, location_id.as_str()),
            evse.uid
        );
        self.execute(
            ModuleId::Locations,
            Method::PUT,
            &path,
            Some(Self::body_of(evse)),
        )
        .await
    }

    pub async fn patch_evse(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        location_id: &LocationId,
        evse_uid: &EvseUid,
        patch: Value,
    ) -> OcpiEnvelope<Value> {
        let path = format!(
            "{}/{evse_uid}",
            self.object_path(country_code, party_id, location_id.as_str())
        );
        self.execute(ModuleId::Locations, Method::PATCH, &path, Some(patch))
            .await
    }

    // Connectors

    pub async fn get_connector(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        location_id: &LocationId,
        evse_uid: &EvseUid,
        connector_id: &ConnectorId,
    ) -> OcpiEnvelope<crate::domain::Connector> {
        let path = format!(
            "{}/{evse_uid}/{connector_id}",
            self.object_path(country_code, party_id, location_id.as_str())
        );
        self.execute(ModuleId::Locations, Method::GET, &path, None)
            .await
    }

    pub async fn put_connector(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        location_id: &LocationId,
        evse_uid: &EvseUid,
        connector: &crate::domain::Connector,
    ) -> OcpiEnvelope<Value> {
        let path = format!(
            "{}/{evse_uid}/{}",
            self.object_path(country_code, party_id, location_id.as_str()),
            connector.id
        );
        self.execute(
            ModuleId::Locations,
            Method::PUT,
            &path,
            Some(Self::body_of(connector)),
        )
        .await
    }

    pub async fn patch_connector(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        location_id: &LocationId,
        evse_uid: &EvseUid,
        connector_id: &ConnectorId,
        patch: Value,
    ) -> OcpiEnvelope<Value> {
        let path = format!(
            "{}/{evse_uid}/{connector_id}",
            self.object_path(country_code, party_id, location_id.as_str())
        );
        self.execute(ModuleId::Locations, Method::PATCH, &path, Some(patch))
            .await
    }

    // Tariffs

    pub async fn get_tariff(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &TariffId,
    ) -> OcpiEnvelope<Tariff> {
        let path = self.object_path(country_code, party_id, id.as_str());
        self.execute(ModuleId::Tariffs, Method::GET, &path, None)
            .await
    }

    pub async fn put_tariff(&self, tariff: &Tariff) -> OcpiEnvelope<Value> {
        let path = self.object_path(&tariff.country_code, &tariff.party_id, tariff.id.as_str());
        self.execute(
            ModuleId::Tariffs,
            Method::PUT,
            &path,
            Some(Self::body_of(tariff)),
        )
        .await
    }

    pub async fn patch_tariff(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &TariffId,
        patch: Value,
    ) -> OcpiEnvelope<Value> {
        let path = self.object_path(country_code, party_id, id.as_str());
        self.execute(ModuleId::Tariffs, Method::PATCH, &path, Some(patch))
            .await
    }

    pub async fn delete_tariff(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &TariffId,
    ) -> OcpiEnvelope<Value> {
        let path = self.object_path(country_code, party_id, id.as_str());
        self.execute(ModuleId::Tariffs, Method::DELETE, &path, None)
            .await
    }

    // Sessions

    pub async fn get_session(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &SessionId,
    ) -> OcpiEnvelope<Session> {
        let path = self.object_path(country_code, party_id, id.as_str());
        self.execute(ModuleId::Sessions, Method::GET, &path, None)
            .await
    }

    pub async fn put_session(&self, session: &Session) -> OcpiEnvelope<Value> {
        let path = self.object_path(
            &session.country_code,
            &session.party_id,
            session.id.as_str(),
        );
        self.execute(
            ModuleId::Sessions,
            Method::PUT,
            &path,
            Some(Self::body_of(session)),
        )
        .await
    }

    pub async fn patch_session(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &SessionId,
        patch: Value,
    ) -> OcpiEnvelope<Value> {
        let path = self.object_path(country_code, party_id, id.as_str());
        self.execute(ModuleId::Sessions, Method::PATCH, &path, Some(patch))
            .await
    }

    pub async fn delete_session(
        &self,
        country_code: &CountryCode,
        party_id: &PartyId,
        id: &SessionId,
    ) -> OcpiEnvelope<Value> {
        let path = self.object_path(country_code, party_id, id.as_str());
        self.execute(ModuleId::Sessions, Method::DELETE, &path, None)
            .await
    }

    // CDRs

    /// Push a CDR to the receiver's collection endpoint. The receiver
    /// answers with a `Location` header pointing at the stored record;
    /// fetch it back with [`get_cdr`](Self::get_cdr).
    pub async fn post_cdr(&self, cdr: &Cdr) -> OcpiEnvelope<Value> {
        self.execute(ModuleId::Cdrs, Method::POST, "", Some(Self::body_of(cdr)))
            .await
    }

    /// Fetch a CDR by the absolute URL the receiver handed back on POST.
    pub async fn get_cdr(&self, cdr_url: &str) -> OcpiEnvelope<Cdr> {
        self.execute_url(Method::GET, cdr_url, None).await
    }

    // Tokens

    /// Pull a page of the EMSP's token list.
    pub async fn get_tokens(&self, offset: usize, limit: usize) -> OcpiEnvelope<Vec<Token>> {
        let path = format!("?offset={offset}&limit={limit}");
        self.execute(ModuleId::Tokens, Method::GET, &path, None)
            .await
    }

    /// Real-time authorization: ask the EMSP whether a token is allowed.
    pub async fn post_token(
        &self,
        uid: &TokenId,
        token_type: TokenType,
    ) -> OcpiEnvelope<TokenStatus> {
        let type_param = serde_json::to_value(token_type)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let path = format!("{uid}/authorize?type={type_param}");
        self.execute(ModuleId::Tokens, Method::POST, &path, None)
            .await
    }

    // Charging profiles

    /// Forward a charging profile for an active session. The profile
    /// document is passed through opaquely.
    pub async fn set_charging_profile(
        &self,
        session_id: &SessionId,
        profile: Value,
    ) -> OcpiEnvelope<Value> {
        let path = session_id.to_string();
        self.execute(ModuleId::ChargingProfiles, Method::PUT, &path, Some(profile))
            .await
    }
}
