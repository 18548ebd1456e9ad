//! Locations, EVSEs and connectors (OCPI 2.2 `locations` module)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{ConnectorId, CountryCode, EvseUid, LocationId, PartyId, TariffId};
use super::LastUpdated;

/// Geographic coordinates, serialized as decimal-degree strings per OCPI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoLocation {
    pub latitude: String,
    pub longitude: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvseStatus {
    Available,
    Blocked,
    Charging,
    Inoperative,
    Outoforder,
    Planned,
    Removed,
    Reserved,
    Unknown,
}

/// A charging location owned by one (country code, party id) pair.
///
/// Invariant: `id` is unique per owning party; EVSEs are ordered and
/// owned by the location, connectors by their EVSE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    pub country_code: CountryCode,
    pub party_id: PartyId,
    pub id: LocationId,
    pub publish: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub address: String,
    pub city: String,
    pub country: String,
    pub coordinates: GeoLocation,
    #[serde(default)]
    pub evses: Vec<Evse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl Location {
    /// Find an EVSE by its unique id. Back-reference lookup, not ownership
    /// transfer; the EVSE list keeps registry order.
    pub fn evse(&self, uid: &EvseUid) -> Option<&Evse> {
        self.evses.iter().find(|e| &e.uid == uid)
    }
}

impl LastUpdated for Location {
    fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

/// One EVSE within a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Evse {
    pub uid: EvseUid,
    /// Official eMI3 EVSE id, when assigned (e.g. `DE*GEF*E123456*1`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evse_id: Option<String>,
    pub status: EvseStatus,
    #[serde(default)]
    pub connectors: Vec<Connector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoLocation>,
    pub last_updated: DateTime<Utc>,
}

impl Evse {
    pub fn connector(&self, id: &ConnectorId) -> Option<&Connector> {
        self.connectors.iter().find(|c| &c.id == id)
    }
}

impl LastUpdated for Evse {
    fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

/// One connector on an EVSE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Connector {
    pub id: ConnectorId,
    /// Connector standard, e.g. `IEC_62196_T2`.
    pub standard: String,
    /// `SOCKET` or `CABLE`.
    pub format: String,
    /// e.g. `AC_3_PHASE`.
    pub power_type: String,
    pub max_voltage: i32,
    pub max_amperage: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tariff_ids: Vec<TariffId>,
    pub last_updated: DateTime<Utc>,
}

impl LastUpdated for Connector {
    fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}
