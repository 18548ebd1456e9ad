//! Session routes (EMSP-gated)

use axum::extract::{Path, Query, State};
use axum::response::Response;

use crate::api::envelope::{OcpiEnvelope, OcpiReply};
use crate::api::query::{window, ListQuery};
use crate::api::resolver::{resolve_session, segment_at};
use crate::api::router::AppState;
use crate::domain::{OcpiError, Session, SessionId};

const ALLOW: &str = "OPTIONS, GET";

pub async fn options_sessions() -> Response {
    OcpiReply::options(ALLOW)
}

/// List this CPO's charging sessions, date-filtered and paginated.
#[utoipa::path(
    get,
    path = "/cpo/sessions",
    tag = "Sessions",
    params(ListQuery),
    responses(
        (status = 200, description = "Session list", body = OcpiEnvelope<Vec<Session>>),
        (status = 403, description = "Caller is not an allowed EMSP")
    )
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<OcpiReply, OcpiError> {
    let sessions = state
        .registry
        .list_sessions(&state.country_code, &state.party_id)
        .await;
    let w = window(sessions, &query);
    Ok(OcpiReply::ok(w.items).total_count(w.total).allow(ALLOW))
}

/// Fetch one session by id.
#[utoipa::path(
    get,
    path = "/cpo/sessions/{session_id}",
    tag = "Sessions",
    params(("session_id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "The session", body = OcpiEnvelope<Session>),
        (status = 403, description = "Caller is not an allowed EMSP"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<OcpiReply, OcpiError> {
    let segments = vec![session_id];
    let id: SessionId = segment_at(&segments, 0, "sessionId")?;
    let session =
        resolve_session(state.registry.as_ref(), &state.country_code, &state.party_id, &id)
            .await?;
    Ok(OcpiReply::ok(&session)
        .last_modified(session.last_updated)
        .allow(ALLOW))
}
