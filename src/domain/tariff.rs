//! Tariffs (OCPI 2.2 `tariffs` module)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{CountryCode, PartyId, TariffId};
use super::LastUpdated;

/// Price with and without VAT. Shared by tariffs, sessions and CDRs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Price {
    pub excl_vat: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incl_vat: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TariffDimension {
    Energy,
    Flat,
    ParkingTime,
    Time,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceComponent {
    #[serde(rename = "type")]
    pub dimension: TariffDimension,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat: Option<Decimal>,
    pub step_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TariffElement {
    pub price_components: Vec<PriceComponent>,
}

/// A tariff owned by one (country code, party id) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Tariff {
    pub country_code: CountryCode,
    pub party_id: PartyId,
    pub id: TariffId,
    /// ISO 4217 currency code.
    pub currency: String,
    pub elements: Vec<TariffElement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Price>,
    pub last_updated: DateTime<Utc>,
}

impl LastUpdated for Tariff {
    fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}
