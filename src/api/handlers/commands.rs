//! Command routes (EMSP-gated)
//!
//! Payloads are parsed and validated, then answered with the fixed
//! `NOT_SUPPORTED` stub; no command is dispatched to a charge point.

use axum::extract::State;
use axum::response::Response;

use crate::api::envelope::{OcpiEnvelope, OcpiReply};
use crate::api::extract::OcpiJson;
use crate::api::router::AppState;
use crate::domain::{
    CancelReservation, CommandResponse, CommandType, OcpiError, ReserveNow, StartSession,
    StopSession, UnlockConnector,
};

const ALLOW: &str = "OPTIONS, POST";

pub async fn options_commands() -> Response {
    OcpiReply::options(ALLOW)
}

fn stub(command: CommandType) -> Result<OcpiReply, OcpiError> {
    Ok(OcpiReply::ok(CommandResponse::not_supported(command)).allow(ALLOW))
}

#[utoipa::path(
    post,
    path = "/cpo/commands/RESERVE_NOW",
    tag = "Commands",
    request_body = ReserveNow,
    responses(
        (status = 200, description = "Command acknowledged (stub)", body = OcpiEnvelope<CommandResponse>),
        (status = 400, description = "Malformed command payload"),
        (status = 403, description = "Caller is not an allowed EMSP")
    )
)]
pub async fn reserve_now(
    State(_state): State<AppState>,
    OcpiJson(_command): OcpiJson<ReserveNow>,
) -> Result<OcpiReply, OcpiError> {
    stub(CommandType::ReserveNow)
}

#[utoipa::path(
    post,
    path = "/cpo/commands/CANCEL_RESERVATION",
    tag = "Commands",
    request_body = CancelReservation,
    responses(
        (status = 200, description = "Command acknowledged (stub)", body = OcpiEnvelope<CommandResponse>),
        (status = 400, description = "Malformed command payload"),
        (status = 403, description = "Caller is not an allowed EMSP")
    )
)]
pub async fn cancel_reservation(
    State(_state): State<AppState>,
    OcpiJson(_command): OcpiJson<CancelReservation>,
) -> Result<OcpiReply, OcpiError> {
    stub(CommandType::CancelReservation)
}

#[utoipa::path(
    post,
    path = "/cpo/commands/START_SESSION",
    tag = "Commands",
    request_body = StartSession,
    responses(
        (status = 200, description = "Command acknowledged (stub)", body = OcpiEnvelope<CommandResponse>),
        (status = 400, description = "Malformed command payload"),
        (status = 403, description = "Caller is not an allowed EMSP")
    )
)]
pub async fn start_session(
    State(_state): State<AppState>,
    OcpiJson(_command): OcpiJson<StartSession>,
) -> Result<OcpiReply, OcpiError> {
    stub(CommandType::StartSession)
}

#[utoipa::path(
    post,
    path = "/cpo/commands/STOP_SESSION",
    tag = "Commands",
    request_body = StopSession,
    responses(
        (status = 200, description = "Command acknowledged (stub)", body = OcpiEnvelope<CommandResponse>),
        (status = 400, description = "Malformed command payload"),
        (status = 403, description = "Caller is not an allowed EMSP")
    )
)]
pub async fn stop_session(
    State(_state): State<AppState>,
    OcpiJson(_command): OcpiJson<StopSession>,
) -> Result<OcpiReply, OcpiError> {
    stub(CommandType::StopSession)
}

#[utoipa::path(
    post,
    path = "/cpo/commands/UNLOCK_CONNECTOR",
    tag = "Commands",
    request_body = UnlockConnector,
    responses(
        (status = 200, description = "Command acknowledged (stub)", body = OcpiEnvelope<CommandResponse>),
        (status = 400, description = "Malformed command payload"),
        (status = 403, description = "Caller is not an allowed EMSP")
    )
)]
pub async fn unlock_connector(
    State(_state): State<AppState>,
    OcpiJson(_command): OcpiJson<UnlockConnector>,
) -> Result<OcpiReply, OcpiError> {
    stub(CommandType::UnlockConnector)
}
