//! OCPI error taxonomy
//!
//! One variant per failure class the dispatcher can hit. Every variant
//! maps to exactly one (OCPI status code, HTTP status) pair, so handlers
//! never pick status codes by hand.

use axum::http::StatusCode;
use thiserror::Error;

/// OCPI status code for generic client/server errors.
pub const OCPI_GENERIC_CLIENT_ERROR: i32 = 2000;
/// OCPI status code for invalid or missing parameters.
pub const OCPI_INVALID_PARAMETERS: i32 = 2001;
/// OCPI status code for unknown objects (locations, tariffs, ...).
pub const OCPI_UNKNOWN_LOCATION: i32 = 2003;
/// OCPI status code for unknown tokens.
pub const OCPI_UNKNOWN_TOKEN: i32 = 2004;
/// OCPI status code for successful operations.
pub const OCPI_SUCCESS: i32 = 1000;

#[derive(Debug, Error)]
pub enum OcpiError {
    /// Too few path segments for the requested operation.
    #[error("Missing {0} parameter!")]
    MissingParameter(&'static str),

    /// A path segment or query value failed its type-specific parse rule.
    #[error("Invalid {0} parameter!")]
    InvalidParameter(&'static str),

    /// Identifier parsed but the registry holds no matching entity.
    /// The message names the deepest resolvable level ("Unknown EVSE!").
    #[error("{message}")]
    NotFound {
        message: &'static str,
        /// 2003 for most objects, 2004 for tokens.
        ocpi_code: i32,
    },

    /// The caller's access grant has the wrong role or status.
    #[error("Invalid or blocked access token!")]
    Forbidden,

    /// Request body failed to parse or failed structural validation.
    #[error("Could not parse the given JSON object: {0}")]
    MalformedBody(String),

    /// Write carried an older `last_updated` than the stored entity and
    /// no override was granted.
    #[error("The given object is older than the stored one ({stored})!")]
    DowngradeRejected {
        stored: chrono::DateTime<chrono::Utc>,
    },

    /// Outbound transport failure or unresolvable remote endpoint.
    #[error("{0}")]
    Transport(String),
}

impl OcpiError {
    pub fn unknown_location() -> Self {
        Self::NotFound {
            message: "Unknown location!",
            ocpi_code: OCPI_UNKNOWN_LOCATION,
        }
    }

    pub fn unknown_evse() -> Self {
        Self::NotFound {
            message: "Unknown EVSE!",
            ocpi_code: OCPI_UNKNOWN_LOCATION,
        }
    }

    pub fn unknown_connector() -> Self {
        Self::NotFound {
            message: "Unknown connector!",
            ocpi_code: OCPI_UNKNOWN_LOCATION,
        }
    }

    pub fn unknown_tariff() -> Self {
        Self::NotFound {
            message: "Unknown tariff!",
            ocpi_code: OCPI_UNKNOWN_LOCATION,
        }
    }

    pub fn unknown_session() -> Self {
        Self::NotFound {
            message: "Unknown session!",
            ocpi_code: OCPI_UNKNOWN_LOCATION,
        }
    }

    pub fn unknown_cdr() -> Self {
        Self::NotFound {
            message: "Unknown CDR!",
            ocpi_code: OCPI_UNKNOWN_LOCATION,
        }
    }

    pub fn unknown_token() -> Self {
        Self::NotFound {
            message: "Unknown token!",
            ocpi_code: OCPI_UNKNOWN_TOKEN,
        }
    }

    /// OCPI numeric status code for the response envelope.
    pub fn ocpi_code(&self) -> i32 {
        match self {
            Self::MissingParameter(_) | Self::InvalidParameter(_) | Self::MalformedBody(_) => {
                OCPI_INVALID_PARAMETERS
            }
            Self::NotFound { ocpi_code, .. } => *ocpi_code,
            Self::Forbidden | Self::DowngradeRejected { .. } => OCPI_GENERIC_CLIENT_ERROR,
            Self::Transport(_) => -1,
        }
    }

    /// Transport-level HTTP status for the response envelope.
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) | Self::InvalidParameter(_) | Self::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::DowngradeRejected { .. } => StatusCode::FAILED_DEPENDENCY,
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

pub type OcpiResult<T> = Result<T, OcpiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_mapping() {
        assert_eq!(OcpiError::MissingParameter("countryCode").ocpi_code(), 2001);
        assert_eq!(
            OcpiError::MissingParameter("countryCode").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(OcpiError::unknown_location().ocpi_code(), 2003);
        assert_eq!(OcpiError::unknown_token().ocpi_code(), 2004);
        assert_eq!(
            OcpiError::unknown_token().http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(OcpiError::Forbidden.ocpi_code(), 2000);
        assert_eq!(OcpiError::Forbidden.http_status(), StatusCode::FORBIDDEN);
        let downgrade = OcpiError::DowngradeRejected {
            stored: chrono::Utc::now(),
        };
        assert_eq!(downgrade.ocpi_code(), 2000);
        assert_eq!(downgrade.http_status(), StatusCode::FAILED_DEPENDENCY);
    }

    #[test]
    fn composite_messages() {
        assert_eq!(OcpiError::unknown_location().to_string(), "Unknown location!");
        assert_eq!(OcpiError::unknown_evse().to_string(), "Unknown EVSE!");
        assert_eq!(OcpiError::unknown_connector().to_string(), "Unknown connector!");
    }
}
