//! Location routes: list, single location, EVSE, connector
//!
//! Composite resolution is strictly ordered (location → EVSE →
//! connector); the first unresolvable level aborts with its own
//! "Unknown X!" message.

use axum::extract::{Path, Query, State};
use axum::response::Response;

use crate::api::envelope::{OcpiEnvelope, OcpiReply};
use crate::api::query::{window, ListQuery};
use crate::api::resolver::{find_connector, find_evse, resolve_location, segment_at};
use crate::api::router::AppState;
use crate::domain::{ConnectorId, EvseUid, Location, LocationId, OcpiError};

const ALLOW: &str = "OPTIONS, GET";

pub async fn options_locations() -> Response {
    OcpiReply::options(ALLOW)
}

/// List this CPO's locations, date-filtered and paginated.
#[utoipa::path(
    get,
    path = "/cpo/locations",
    tag = "Locations",
    params(ListQuery),
    responses(
        (status = 200, description = "Location list", body = OcpiEnvelope<Vec<Location>>)
    )
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<OcpiReply, OcpiError> {
    let locations = state
        .registry
        .list_locations(&state.country_code, &state.party_id)
        .await;
    let w = window(locations, &query);
    Ok(OcpiReply::ok(w.items).total_count(w.total).allow(ALLOW))
}

/// Fetch one location by id.
#[utoipa::path(
    get,
    path = "/cpo/locations/{location_id}",
    tag = "Locations",
    params(("location_id" = String, Path, description = "Location id")),
    responses(
        (status = 200, description = "The location", body = OcpiEnvelope<Location>),
        (status = 404, description = "Unknown location")
    )
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> Result<OcpiReply, OcpiError> {
    let segments = vec![location_id];
    let id: LocationId = segment_at(&segments, 0, "locationId")?;
    let location =
        resolve_location(state.registry.as_ref(), &state.country_code, &state.party_id, &id)
            .await?;
    Ok(OcpiReply::ok(&location)
        .last_modified(location.last_updated)
        .allow(ALLOW))
}

/// Fetch one EVSE within a location.
#[utoipa::path(
    get,
    path = "/cpo/locations/{location_id}/{evse_uid}",
    tag = "Locations",
    params(
        ("location_id" = String, Path, description = "Location id"),
        ("evse_uid" = String, Path, description = "EVSE unique id")
    ),
    responses(
        (status = 200, description = "The EVSE"),
        (status = 404, description = "Unknown location or EVSE")
    )
)]
pub async fn get_evse(
    State(state): State<AppState>,
    Path((location_id, evse_uid)): Path<(String, String)>,
) -> Result<OcpiReply, OcpiError> {
    let segments = vec![location_id, evse_uid];
    let id: LocationId = segment_at(&segments, 0, "locationId")?;
    let uid: EvseUid = segment_at(&segments, 1, "evseUId")?;
    let location =
        resolve_location(state.registry.as_ref(), &state.country_code, &state.party_id, &id)
            .await?;
    let evse = find_evse(&location, &uid)?;
    Ok(OcpiReply::ok(evse)
        .last_modified(evse.last_updated)
        .allow(ALLOW))
}

/// Fetch one connector within an EVSE.
#[utoipa::path(
    get,
    path = "/cpo/locations/{location_id}/{evse_uid}/{connector_id}",
    tag = "Locations",
    params(
        ("location_id" = String, Path, description = "Location id"),
        ("evse_uid" = String, Path, description = "EVSE unique id"),
        ("connector_id" = String, Path, description = "Connector id")
    ),
    responses(
        (status = 200, description = "The connector"),
        (status = 404, description = "Unknown location, EVSE or connector")
    )
)]
pub async fn get_connector(
    State(state): State<AppState>,
    Path((location_id, evse_uid, connector_id)): Path<(String, String, String)>,
) -> Result<OcpiReply, OcpiError> {
    let segments = vec![location_id, evse_uid, connector_id];
    let id: LocationId = segment_at(&segments, 0, "locationId")?;
    let uid: EvseUid = segment_at(&segments, 1, "evseUId")?;
    let connector_id: ConnectorId = segment_at(&segments, 2, "connectorId")?;
    let location =
        resolve_location(state.registry.as_ref(), &state.country_code, &state.party_id, &id)
            .await?;
    let evse = find_evse(&location, &uid)?;
    let connector = find_connector(evse, &connector_id)?;
    Ok(OcpiReply::ok(connector)
        .last_modified(connector.last_updated)
        .allow(ALLOW))
}
