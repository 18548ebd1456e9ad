//! Token routes (EMSP-gated)
//!
//! Tokens are the one resource the EMSP pushes into this CPO, so the
//! full CRUD surface lives here: collection list/bulk-delete per
//! (country code, party id), and GET/PUT/PATCH/DELETE per token with a
//! `?type=` selector and the downgrade override flag.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use utoipa::IntoParams;

use crate::api::envelope::{OcpiEnvelope, OcpiReply};
use crate::api::extract::OcpiJson;
use crate::api::query::{window, ListQuery};
use crate::api::resolver::{resolve_token, segment_at};
use crate::api::router::AppState;
use crate::domain::{CountryCode, OcpiError, PartyId, Token, TokenId, TokenType};

const ALLOW_COLLECTION: &str = "OPTIONS, GET, DELETE";
const ALLOW_ITEM: &str = "OPTIONS, GET, PUT, PATCH, DELETE";

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TokenQuery {
    /// Token type selector; OCPI defaults to RFID.
    #[serde(rename = "type")]
    pub token_type: Option<TokenType>,
    /// Accept a write that is older than the stored token.
    #[serde(rename = "forceDowngrade")]
    pub force_downgrade: Option<bool>,
}

impl TokenQuery {
    fn token_type(&self) -> TokenType {
        self.token_type.unwrap_or_default()
    }
}

pub async fn options_tokens_collection() -> Response {
    OcpiReply::options(ALLOW_COLLECTION)
}

pub async fn options_token() -> Response {
    OcpiReply::options(ALLOW_ITEM)
}

fn parse_party(segments: &[String]) -> Result<(CountryCode, PartyId), OcpiError> {
    let country_code: CountryCode = segment_at(segments, 0, "countryCode")?;
    let party_id: PartyId = segment_at(segments, 1, "partyId")?;
    Ok((country_code, party_id))
}

/// List the tokens one EMSP pushed here, date-filtered and paginated.
#[utoipa::path(
    get,
    path = "/cpo/tokens/{country_code}/{party_id}",
    tag = "Tokens",
    params(
        ("country_code" = String, Path, description = "Token-issuing country code"),
        ("party_id" = String, Path, description = "Token-issuing party id"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Token list", body = OcpiEnvelope<Vec<Token>>),
        (status = 403, description = "Caller is not an allowed EMSP")
    )
)]
pub async fn list_tokens(
    State(state): State<AppState>,
    Path((country_code, party_id)): Path<(String, String)>,
    Query(query): Query<ListQuery>,
) -> Result<OcpiReply, OcpiError> {
    let segments = vec![country_code, party_id];
    let (country_code, party_id) = parse_party(&segments)?;
    let tokens = state.registry.list_tokens(&country_code, &party_id).await;
    let w = window(tokens, &query);
    Ok(OcpiReply::ok(w.items)
        .total_count(w.total)
        .allow(ALLOW_COLLECTION))
}

/// Drop every token of one (country code, party id) pair.
#[utoipa::path(
    delete,
    path = "/cpo/tokens/{country_code}/{party_id}",
    tag = "Tokens",
    params(
        ("country_code" = String, Path, description = "Token-issuing country code"),
        ("party_id" = String, Path, description = "Token-issuing party id")
    ),
    responses(
        (status = 200, description = "Number of removed tokens"),
        (status = 403, description = "Caller is not an allowed EMSP")
    )
)]
pub async fn delete_tokens(
    State(state): State<AppState>,
    Path((country_code, party_id)): Path<(String, String)>,
) -> Result<OcpiReply, OcpiError> {
    let segments = vec![country_code, party_id];
    let (country_code, party_id) = parse_party(&segments)?;
    let removed = state.registry.clear_tokens(&country_code, &party_id).await;
    Ok(OcpiReply::ok(serde_json::json!({ "removed": removed })).allow(ALLOW_COLLECTION))
}

/// Fetch one token.
#[utoipa::path(
    get,
    path = "/cpo/tokens/{country_code}/{party_id}/{token_uid}",
    tag = "Tokens",
    params(
        ("country_code" = String, Path, description = "Token-issuing country code"),
        ("party_id" = String, Path, description = "Token-issuing party id"),
        ("token_uid" = String, Path, description = "Token uid"),
        TokenQuery
    ),
    responses(
        (status = 200, description = "The token", body = OcpiEnvelope<Token>),
        (status = 403, description = "Caller is not an allowed EMSP"),
        (status = 404, description = "Unknown token")
    )
)]
pub async fn get_token(
    State(state): State<AppState>,
    Path((country_code, party_id, token_uid)): Path<(String, String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<OcpiReply, OcpiError> {
    let segments = vec![country_code, party_id, token_uid];
    let (country_code, party_id) = parse_party(&segments)?;
    let uid: TokenId = segment_at(&segments, 2, "tokenUId")?;
    let token = resolve_token(
        state.registry.as_ref(),
        &country_code,
        &party_id,
        &uid,
        query.token_type(),
    )
    .await?;
    Ok(OcpiReply::ok(&token)
        .last_modified(token.last_updated)
        .allow(ALLOW_ITEM))
}

/// Create or replace a token.
///
/// 201 on create, 200 on update; a write whose `last_updated` is
/// strictly older than the stored token is rejected with 424 unless the
/// deployment allows downgrades or `?forceDowngrade=true` is set.
#[utoipa::path(
    put,
    path = "/cpo/tokens/{country_code}/{party_id}/{token_uid}",
    tag = "Tokens",
    params(
        ("country_code" = String, Path, description = "Token-issuing country code"),
        ("party_id" = String, Path, description = "Token-issuing party id"),
        ("token_uid" = String, Path, description = "Token uid"),
        TokenQuery
    ),
    request_body = Token,
    responses(
        (status = 201, description = "Token created", body = OcpiEnvelope<Token>),
        (status = 200, description = "Token updated", body = OcpiEnvelope<Token>),
        (status = 400, description = "Malformed token object"),
        (status = 403, description = "Caller is not an allowed EMSP"),
        (status = 424, description = "Write is older than the stored token")
    )
)]
pub async fn put_token(
    State(state): State<AppState>,
    Path((country_code, party_id, token_uid)): Path<(String, String, String)>,
    Query(query): Query<TokenQuery>,
    OcpiJson(token): OcpiJson<Token>,
) -> Result<OcpiReply, OcpiError> {
    let segments = vec![country_code, party_id, token_uid];
    let (country_code, party_id) = parse_party(&segments)?;
    let uid: TokenId = segment_at(&segments, 2, "tokenUId")?;

    if token.uid != uid
        || token.country_code != country_code
        || token.party_id != party_id
        || token.token_type != query.token_type()
    {
        return Err(OcpiError::MalformedBody(
            "token object does not match the request URL".to_string(),
        ));
    }

    let allow_downgrade = state.allow_downgrades || query.force_downgrade.unwrap_or(false);
    let outcome = state.registry.upsert_token(token.clone(), allow_downgrade).await?;

    let reply = if outcome.created {
        OcpiReply::created(&token)
    } else {
        OcpiReply::ok(&token)
    };
    Ok(reply
        .etag(outcome.etag)
        .last_modified(token.last_updated)
        .allow(ALLOW_ITEM))
}

/// Merge-patch a stored token.
#[utoipa::path(
    patch,
    path = "/cpo/tokens/{country_code}/{party_id}/{token_uid}",
    tag = "Tokens",
    params(
        ("country_code" = String, Path, description = "Token-issuing country code"),
        ("party_id" = String, Path, description = "Token-issuing party id"),
        ("token_uid" = String, Path, description = "Token uid"),
        TokenQuery
    ),
    responses(
        (status = 200, description = "Patched token", body = OcpiEnvelope<Token>),
        (status = 400, description = "Patch document is malformed"),
        (status = 403, description = "Caller is not an allowed EMSP"),
        (status = 404, description = "Unknown token"),
        (status = 424, description = "Patch is older than the stored token")
    )
)]
pub async fn patch_token(
    State(state): State<AppState>,
    Path((country_code, party_id, token_uid)): Path<(String, String, String)>,
    Query(query): Query<TokenQuery>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<OcpiReply, OcpiError> {
    let segments = vec![country_code, party_id, token_uid];
    let (country_code, party_id) = parse_party(&segments)?;
    let uid: TokenId = segment_at(&segments, 2, "tokenUId")?;
    let Json(patch) = body.map_err(|rejection| OcpiError::MalformedBody(rejection.body_text()))?;

    let allow_downgrade = state.allow_downgrades || query.force_downgrade.unwrap_or(false);
    let (token, etag) = state
        .registry
        .patch_token(
            &country_code,
            &party_id,
            &uid,
            query.token_type(),
            patch,
            allow_downgrade,
        )
        .await?;

    Ok(OcpiReply::ok(&token)
        .etag(etag)
        .last_modified(token.last_updated)
        .allow(ALLOW_ITEM))
}

/// Remove one token, returning its last-known projection.
#[utoipa::path(
    delete,
    path = "/cpo/tokens/{country_code}/{party_id}/{token_uid}",
    tag = "Tokens",
    params(
        ("country_code" = String, Path, description = "Token-issuing country code"),
        ("party_id" = String, Path, description = "Token-issuing party id"),
        ("token_uid" = String, Path, description = "Token uid"),
        TokenQuery
    ),
    responses(
        (status = 200, description = "The removed token", body = OcpiEnvelope<Token>),
        (status = 403, description = "Caller is not an allowed EMSP"),
        (status = 404, description = "Unknown token")
    )
)]
pub async fn delete_token(
    State(state): State<AppState>,
    Path((country_code, party_id, token_uid)): Path<(String, String, String)>,
    Query(query): Query<TokenQuery>,
) -> Result<OcpiReply, OcpiError> {
    let segments = vec![country_code, party_id, token_uid];
    let (country_code, party_id) = parse_party(&segments)?;
    let uid: TokenId = segment_at(&segments, 2, "tokenUId")?;
    let removed = state
        .registry
        .remove_token(&country_code, &party_id, &uid, query.token_type())
        .await
        .ok_or_else(OcpiError::unknown_token)?;
    Ok(OcpiReply::ok(&removed).allow(ALLOW_ITEM))
}
