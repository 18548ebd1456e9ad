//! Resource resolution
//!
//! Turns positional path segments into typed identifiers and resolved
//! entities. Each step returns `Result` and the first failure wins:
//! missing segment, then unparsable segment, then unknown entity.
//! No partial resolution; a failed intermediate step aborts the chain.

use std::str::FromStr;

use crate::domain::ids::InvalidId;
use crate::domain::{
    Cdr, CdrId, Connector, ConnectorId, CountryCode, Evse, EvseUid, Location, LocationId,
    OcpiError, OcpiResult, PartyId, Session, SessionId, Tariff, TariffId, Token, TokenId,
    TokenType,
};
use crate::registry::Registry;

/// Parse the segment at `index`, failing with `MissingParameter` when the
/// path is too short and `InvalidParameter` when the parse rule rejects.
/// No registry access on either failure path.
pub fn segment_at<T>(segments: &[String], index: usize, name: &'static str) -> OcpiResult<T>
where
    T: FromStr<Err = InvalidId>,
{
    let segment = segments
        .get(index)
        .ok_or(OcpiError::MissingParameter(name))?;
    segment
        .parse()
        .map_err(|_| OcpiError::InvalidParameter(name))
}

pub async fn resolve_location(
    registry: &dyn Registry,
    country_code: &CountryCode,
    party_id: &PartyId,
    id: &LocationId,
) -> OcpiResult<Location> {
    registry
        .get_location(country_code, party_id, id)
        .await
        .ok_or_else(OcpiError::unknown_location)
}

pub fn find_evse<'a>(location: &'a Location, uid: &EvseUid) -> OcpiResult<&'a Evse> {
    location.evse(uid).ok_or_else(OcpiError::unknown_evse)
}

pub fn find_connector<'a>(evse: &'a Evse, id: &ConnectorId) -> OcpiResult<&'a Connector> {
    evse.connector(id).ok_or_else(OcpiError::unknown_connector)
}

pub async fn resolve_tariff(
    registry: &dyn Registry,
    country_code: &CountryCode,
    party_id: &PartyId,
    id: &TariffId,
) -> OcpiResult<Tariff> {
    registry
        .get_tariff(country_code, party_id, id)
        .await
        .ok_or_else(OcpiError::unknown_tariff)
}

pub async fn resolve_session(
    registry: &dyn Registry,
    country_code: &CountryCode,
    party_id: &PartyId,
    id: &SessionId,
) -> OcpiResult<Session> {
    registry
        .get_session(country_code, party_id, id)
        .await
        .ok_or_else(OcpiError::unknown_session)
}

pub async fn resolve_cdr(
    registry: &dyn Registry,
    country_code: &CountryCode,
    party_id: &PartyId,
    id: &CdrId,
) -> OcpiResult<Cdr> {
    registry
        .get_cdr(country_code, party_id, id)
        .await
        .ok_or_else(OcpiError::unknown_cdr)
}

pub async fn resolve_token(
    registry: &dyn Registry,
    country_code: &CountryCode,
    party_id: &PartyId,
    uid: &TokenId,
    token_type: TokenType,
) -> OcpiResult<Token> {
    registry
        .get_token(country_code, party_id, uid, token_type)
        .await
        .ok_or_else(OcpiError::unknown_token)
}
