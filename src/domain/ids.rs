//! Typed OCPI identifiers
//!
//! Every path parameter the dispatcher accepts has its own newtype with a
//! strict `FromStr` rule. Parsing happens exactly once, at the resolver;
//! the rest of the code only sees validated identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Raised when a path segment fails an identifier's parse rule.
///
/// The resolver wraps this into the OCPI error envelope (status 2001);
/// the bare error only names the identifier kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidId {
    pub kind: &'static str,
}

impl fmt::Display for InvalidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}", self.kind)
    }
}

impl std::error::Error for InvalidId {}

/// OCPI CiString rule: 1..=max printable ASCII characters, no `/`.
fn valid_cistring(s: &str, max: usize) -> bool {
    !s.is_empty()
        && s.len() <= max
        && s.chars().all(|c| c.is_ascii_graphic() && c != '/')
}

macro_rules! ocpi_id {
    ($(#[$doc:meta])* $name:ident, $kind:literal, $max:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if valid_cistring(s, $max) {
                    Ok(Self(s.to_string()))
                } else {
                    Err(InvalidId { kind: $kind })
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

ocpi_id!(
    /// Location identifier, unique per (country code, party id).
    LocationId, "location id", 36);
ocpi_id!(
    /// EVSE unique identifier (`evse_uid`), unique within its location.
    EvseUid, "EVSE uid", 36);
ocpi_id!(
    /// Connector identifier, unique within its parent EVSE.
    ConnectorId, "connector id", 36);
ocpi_id!(
    /// Tariff identifier.
    TariffId, "tariff id", 36);
ocpi_id!(
    /// Charging session identifier.
    SessionId, "session id", 36);
ocpi_id!(
    /// Charge detail record identifier. OCPI allows up to 39 characters.
    CdrId, "CDR id", 39);
ocpi_id!(
    /// Token identifier (RFID uid, app token, ...).
    TokenId, "token id", 36);

/// ISO 3166-1 alpha-2 country code. Stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CountryCode {
    type Err = InvalidId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(s.to_ascii_uppercase()))
        } else {
            Err(InvalidId { kind: "country code" })
        }
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// OCPI party id: exactly 3 ASCII alphanumeric characters. Stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct PartyId(String);

impl PartyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PartyId {
    type Err = InvalidId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 3 && s.chars().all(|c| c.is_ascii_alphanumeric()) {
            Ok(Self(s.to_ascii_uppercase()))
        } else {
            Err(InvalidId { kind: "party id" })
        }
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
