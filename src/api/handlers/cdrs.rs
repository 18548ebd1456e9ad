//! CDR routes (EMSP-gated)
//!
//! The single-item path `/cdrs/{cdr_id}` is a local convention; OCPI
//! only pins down the collection URL and leaves item URLs to the CPO.

use axum::extract::{Path, Query, State};
use axum::response::Response;

use crate::api::envelope::{OcpiEnvelope, OcpiReply};
use crate::api::query::{window, ListQuery};
use crate::api::resolver::{resolve_cdr, segment_at};
use crate::api::router::AppState;
use crate::domain::{Cdr, CdrId, OcpiError};

const ALLOW: &str = "OPTIONS, GET";

pub async fn options_cdrs() -> Response {
    OcpiReply::options(ALLOW)
}

/// List this CPO's charge detail records, date-filtered and paginated.
#[utoipa::path(
    get,
    path = "/cpo/cdrs",
    tag = "CDRs",
    params(ListQuery),
    responses(
        (status = 200, description = "CDR list", body = OcpiEnvelope<Vec<Cdr>>),
        (status = 403, description = "Caller is not an allowed EMSP")
    )
)]
pub async fn list_cdrs(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<OcpiReply, OcpiError> {
    let cdrs = state
        .registry
        .list_cdrs(&state.country_code, &state.party_id)
        .await;
    let w = window(cdrs, &query);
    Ok(OcpiReply::ok(w.items).total_count(w.total).allow(ALLOW))
}

/// Fetch one CDR by id.
#[utoipa::path(
    get,
    path = "/cpo/cdrs/{cdr_id}",
    tag = "CDRs",
    params(("cdr_id" = String, Path, description = "CDR id")),
    responses(
        (status = 200, description = "The CDR", body = OcpiEnvelope<Cdr>),
        (status = 403, description = "Caller is not an allowed EMSP"),
        (status = 404, description = "Unknown CDR")
    )
)]
pub async fn get_cdr(
    State(state): State<AppState>,
    Path(cdr_id): Path<String>,
) -> Result<OcpiReply, OcpiError> {
    let segments = vec![cdr_id];
    let id: CdrId = segment_at(&segments, 0, "cdrId")?;
    let cdr =
        resolve_cdr(state.registry.as_ref(), &state.country_code, &state.party_id, &id).await?;
    Ok(OcpiReply::ok(&cdr).last_modified(cdr.last_updated).allow(ALLOW))
}
