//! Charge detail records (OCPI 2.2 `cdrs` module)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{CdrId, ConnectorId, CountryCode, EvseUid, LocationId, PartyId, SessionId};
use super::session::AuthMethod;
use super::tariff::Price;
use super::token::CdrToken;
use super::LastUpdated;

/// Snapshot of the location a CDR was produced at. CDRs are immutable,
/// so they embed the location data instead of referencing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CdrLocation {
    pub id: LocationId,
    pub address: String,
    pub city: String,
    pub country: String,
    pub evse_uid: EvseUid,
    pub connector_id: ConnectorId,
}

/// A finalized charge detail record owned by one (country code, party id)
/// pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Cdr {
    pub country_code: CountryCode,
    pub party_id: PartyId,
    pub id: CdrId,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub cdr_token: CdrToken,
    pub auth_method: AuthMethod,
    pub cdr_location: CdrLocation,
    pub currency: String,
    pub total_cost: Price,
    /// Total energy in kWh.
    pub total_energy: Decimal,
    /// Total session duration in hours.
    pub total_time: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl LastUpdated for Cdr {
    fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}
