//! Core OCPI domain types
//!
//! Entities follow the OCPI 2.2 module documents (Locations, Tariffs,
//! Sessions, CDRs, Tokens, Commands). Only the fields this service reads
//! or writes are modeled; unknown fields on inbound JSON are ignored.

pub mod cdr;
pub mod commands;
pub mod error;
pub mod ids;
pub mod location;
pub mod session;
pub mod tariff;
pub mod token;

pub use cdr::Cdr;
pub use commands::{
    CancelReservation, CommandResponse, CommandResponseType, CommandType, DisplayText,
    ReserveNow, StartSession, StopSession, UnlockConnector,
};
pub use error::{OcpiError, OcpiResult};
pub use ids::{
    CdrId, ConnectorId, CountryCode, EvseUid, LocationId, PartyId, SessionId, TariffId, TokenId,
};
pub use location::{Connector, Evse, Location};
pub use session::Session;
pub use tariff::Tariff;
pub use token::{AllowedType, Token, TokenStatus, TokenType, WhitelistType};

use chrono::{DateTime, Utc};

/// Implemented by every entity that carries an OCPI `last_updated` stamp.
///
/// Collection filtering (`date_from`/`date_to`) and the downgrade check on
/// writes both key off this timestamp.
pub trait LastUpdated {
    fn last_updated(&self) -> DateTime<Utc>;
}
