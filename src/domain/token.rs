//! Tokens and authorization status (OCPI 2.2 `tokens` module)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::ids::{CountryCode, PartyId, TokenId};
use super::LastUpdated;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    AdHocUser,
    AppUser,
    Other,
    Rfid,
}

impl Default for TokenType {
    fn default() -> Self {
        Self::Rfid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WhitelistType {
    Always,
    Allowed,
    AllowedOffline,
    Never,
}

/// Authorization verdict for a token. Everything other than `Allowed`
/// gates the token out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllowedType {
    Allowed,
    Blocked,
    Expired,
    NoCredit,
    NotAllowed,
}

/// An EMSP-issued charging token, keyed by (country code, party id, uid).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct Token {
    pub country_code: CountryCode,
    pub party_id: PartyId,
    pub uid: TokenId,
    #[serde(rename = "type", default)]
    pub token_type: TokenType,
    #[validate(length(min = 1, max = 36))]
    pub contract_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 64))]
    pub visual_number: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub issuer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub valid: bool,
    pub whitelist: WhitelistType,
    /// ISO 639-1 language code for token-holder messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 2))]
    pub language: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl LastUpdated for Token {
    fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

/// Token paired with its authorization verdict, as returned by the
/// EMSP's real-time `POST /tokens/{uid}/authorize` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TokenStatus {
    pub token: Token,
    pub status: AllowedType,
}

impl TokenStatus {
    pub fn is_allowed(&self) -> bool {
        self.status == AllowedType::Allowed
    }
}

/// The token reference embedded in sessions and CDRs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CdrToken {
    pub uid: TokenId,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub contract_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    pub(crate) fn sample_token() -> Token {
        serde_json::from_value(serde_json::json!({
            "country_code": "DE",
            "party_id": "ABC",
            "uid": "TOK1",
            "type": "RFID",
            "contract_id": "DE8ACC12E46L89",
            "issuer": "TheNewMotion",
            "valid": true,
            "whitelist": "ALLOWED",
            "last_updated": "2018-12-10T17:25:10Z"
        }))
        .unwrap()
    }

    #[test]
    fn token_type_defaults_to_rfid() {
        let token = sample_token();
        assert_eq!(token.token_type, TokenType::Rfid);
        assert_eq!(serde_json::to_value(&token).unwrap()["type"], "RFID");
    }

    #[test]
    fn structural_validation() {
        let mut token = sample_token();
        assert!(token.validate().is_ok());
        token.contract_id = String::new();
        assert!(token.validate().is_err());
        token.contract_id = "DE8ACC12E46L89".to_string();
        token.language = Some("eng".to_string());
        assert!(token.validate().is_err());
    }

    #[test]
    fn token_status_gate() {
        let status = TokenStatus {
            token: sample_token(),
            status: AllowedType::Allowed,
        };
        assert!(status.is_allowed());
        let blocked = TokenStatus {
            status: AllowedType::Blocked,
            ..status
        };
        assert!(!blocked.is_allowed());
    }
}
