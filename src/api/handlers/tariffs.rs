//! Tariff routes

use axum::extract::{Path, Query, State};
use axum::response::Response;

use crate::api::envelope::{OcpiEnvelope, OcpiReply};
use crate::api::query::{window, ListQuery};
use crate::api::resolver::{resolve_tariff, segment_at};
use crate::api::router::AppState;
use crate::domain::{OcpiError, Tariff, TariffId};

const ALLOW: &str = "OPTIONS, GET";

pub async fn options_tariffs() -> Response {
    OcpiReply::options(ALLOW)
}

/// List this CPO's tariffs, date-filtered and paginated.
#[utoipa::path(
    get,
    path = "/cpo/tariffs",
    tag = "Tariffs",
    params(ListQuery),
    responses(
        (status = 200, description = "Tariff list", body = OcpiEnvelope<Vec<Tariff>>)
    )
)]
pub async fn list_tariffs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<OcpiReply, OcpiError> {
    let tariffs = state
        .registry
        .list_tariffs(&state.country_code, &state.party_id)
        .await;
    let w = window(tariffs, &query);
    Ok(OcpiReply::ok(w.items).total_count(w.total).allow(ALLOW))
}

/// Fetch one tariff by id.
#[utoipa::path(
    get,
    path = "/cpo/tariffs/{tariff_id}",
    tag = "Tariffs",
    params(("tariff_id" = String, Path, description = "Tariff id")),
    responses(
        (status = 200, description = "The tariff", body = OcpiEnvelope<Tariff>),
        (status = 404, description = "Unknown tariff")
    )
)]
pub async fn get_tariff(
    State(state): State<AppState>,
    Path(tariff_id): Path<String>,
) -> Result<OcpiReply, OcpiError> {
    let segments = vec![tariff_id];
    let id: TariffId = segment_at(&segments, 0, "tariffId")?;
    let tariff =
        resolve_tariff(state.registry.as_ref(), &state.country_code, &state.party_id, &id).await?;
    Ok(OcpiReply::ok(&tariff)
        .last_modified(tariff.last_updated)
        .allow(ALLOW))
}
