//! Command payloads and responses (OCPI 2.2 `commands` module)
//!
//! Command execution is not implemented: every well-formed command yields
//! a fixed `NOT_SUPPORTED` response. Payloads are still fully parsed and
//! validated so a real executor can be slotted in behind the same routes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::ids::{ConnectorId, EvseUid, LocationId, SessionId};
use super::token::Token;

/// Placeholder timeout (seconds) reported on command responses.
pub const COMMAND_TIMEOUT_SECONDS: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandType {
    CancelReservation,
    ReserveNow,
    StartSession,
    StopSession,
    UnlockConnector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandResponseType {
    Accepted,
    NotSupported,
    Rejected,
    UnknownSession,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DisplayText {
    /// ISO 639-1 language code.
    pub language: String,
    pub text: String,
}

impl DisplayText {
    pub fn english(text: impl Into<String>) -> Self {
        Self {
            language: "en".to_string(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CommandResponse {
    pub result: CommandResponseType,
    /// Seconds the caller should wait for the asynchronous result.
    pub timeout: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub message: Vec<DisplayText>,
}

impl CommandResponse {
    /// The stub response every command currently gets.
    pub fn not_supported(command: CommandType) -> Self {
        Self {
            result: CommandResponseType::NotSupported,
            timeout: COMMAND_TIMEOUT_SECONDS,
            message: vec![DisplayText::english(format!(
                "The {command:?} command is not supported by this CPO!"
            ))],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct ReserveNow {
    #[validate(length(min = 1))]
    pub response_url: String,
    pub token: Token,
    pub expiry_date: DateTime<Utc>,
    #[validate(length(min = 1, max = 36))]
    pub reservation_id: String,
    pub location_id: LocationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evse_uid: Option<EvseUid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct CancelReservation {
    #[validate(length(min = 1))]
    pub response_url: String,
    #[validate(length(min = 1, max = 36))]
    pub reservation_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct StartSession {
    #[validate(length(min = 1))]
    pub response_url: String,
    pub token: Token,
    pub location_id: LocationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evse_uid: Option<EvseUid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<ConnectorId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct StopSession {
    #[validate(length(min = 1))]
    pub response_url: String,
    pub session_id: SessionId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct UnlockConnector {
    #[validate(length(min = 1))]
    pub response_url: String,
    pub location_id: LocationId,
    pub evse_uid: EvseUid,
    pub connector_id: ConnectorId,
}
