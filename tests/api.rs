//! End-to-end tests for the OCPI routes, driven through the router with
//! `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use ocpi_cpo::api::TracingHooks;
use ocpi_cpo::auth::{AccessGrant, AccessTokenStore, PartyRole};
use ocpi_cpo::domain::{AllowedType, Cdr, Location, Session, Token};
use ocpi_cpo::{create_cpo_router, AppState, InMemoryRegistry, Registry};

const EMSP_TOKEN: &str = "emsp-secret";
const CPO_TOKEN: &str = "cpo-secret";

fn access_store() -> Arc<AccessTokenStore> {
    let store = Arc::new(AccessTokenStore::new());
    store.register(
        EMSP_TOKEN,
        AccessGrant {
            name: "Test EMSP".to_string(),
            role: PartyRole::Emsp,
            status: AllowedType::Allowed,
        },
    );
    store.register(
        CPO_TOKEN,
        AccessGrant {
            name: "Some CPO".to_string(),
            role: PartyRole::Cpo,
            status: AllowedType::Allowed,
        },
    );
    store
}

fn build_app(registry: Arc<InMemoryRegistry>, allow_downgrades: bool) -> Router {
    let state = AppState {
        registry,
        country_code: "DE".parse().unwrap(),
        party_id: "GEF".parse().unwrap(),
        allow_downgrades,
    };
    create_cpo_router("cpo", state, access_store(), Arc::new(TracingHooks), None)
}

fn location(id: &str, last_updated: &str) -> Location {
    serde_json::from_value(json!({
        "country_code": "DE",
        "party_id": "GEF",
        "id": id,
        "publish": true,
        "address": "F.Rooseveltlaan 3A",
        "city": "Gent",
        "country": "BEL",
        "coordinates": {"latitude": "51.047599", "longitude": "3.729944"},
        "evses": [{
            "uid": "3256",
            "status": "AVAILABLE",
            "connectors": [{
                "id": "1",
                "standard": "IEC_62196_T2",
                "format": "CABLE",
                "power_type": "AC_3_PHASE",
                "max_voltage": 220,
                "max_amperage": 16,
                "last_updated": "2020-03-16T10:10:02Z"
            }],
            "last_updated": "2020-06-28T08:12:01Z"
        }],
        "last_updated": last_updated
    }))
    .unwrap()
}

fn token_json(uid: &str, last_updated: &str) -> Value {
    json!({
        "country_code": "DE",
        "party_id": "ABC",
        "uid": uid,
        "type": "RFID",
        "contract_id": "DE8ACC12E46L89",
        "issuer": "TheNewMotion",
        "valid": true,
        "whitelist": "ALLOWED",
        "last_updated": last_updated
    })
}

fn session(id: &str, last_updated: &str) -> Session {
    serde_json::from_value(json!({
        "country_code": "DE",
        "party_id": "GEF",
        "id": id,
        "start_date_time": "2020-06-29T20:00:00Z",
        "kwh": "12.5",
        "cdr_token": {"uid": "TOK1", "type": "RFID", "contract_id": "DE8ACC12E46L89"},
        "auth_method": "WHITELIST",
        "location_id": "LOC1",
        "evse_uid": "3256",
        "connector_id": "1",
        "currency": "EUR",
        "status": "ACTIVE",
        "last_updated": last_updated
    }))
    .unwrap()
}

fn cdr(id: &str, last_updated: &str) -> Cdr {
    serde_json::from_value(json!({
        "country_code": "DE",
        "party_id": "GEF",
        "id": id,
        "start_date_time": "2020-06-29T20:00:00Z",
        "end_date_time": "2020-06-29T21:00:00Z",
        "session_id": "S1",
        "cdr_token": {"uid": "TOK1", "type": "RFID", "contract_id": "DE8ACC12E46L89"},
        "auth_method": "WHITELIST",
        "cdr_location": {
            "id": "LOC1",
            "address": "F.Rooseveltlaan 3A",
            "city": "Gent",
            "country": "BEL",
            "evse_uid": "3256",
            "connector_id": "1"
        },
        "currency": "EUR",
        "total_cost": {"excl_vat": "4.00", "incl_vat": "4.84"},
        "total_energy": "12.5",
        "total_time": "1.0",
        "last_updated": last_updated
    }))
    .unwrap()
}

fn request(method: Method, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = auth {
        builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// Locations

#[tokio::test]
async fn unknown_location_is_404_with_ocpi_2003() {
    let app = build_app(Arc::new(InMemoryRegistry::new()), false);
    let response = app
        .oneshot(request(Method::GET, "/cpo/locations/MISSING", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["status_code"], 2003);
    assert_eq!(body["status_message"], "Unknown location!");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn invalid_location_id_is_400_with_ocpi_2001() {
    let app = build_app(Arc::new(InMemoryRegistry::new()), false);
    // %20 decodes to a space, which the id parse rule refuses.
    let response = app
        .oneshot(request(Method::GET, "/cpo/locations/bad%20id", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status_code"], 2001);
    assert_eq!(body["status_message"], "Invalid locationId parameter!");
}

#[tokio::test]
async fn composite_resolution_chains_location_evse_connector() {
    let registry = Arc::new(InMemoryRegistry::new());
    registry
        .put_location(location("LOC1", "2020-06-29T20:39:09Z"))
        .await;
    let app = build_app(registry, false);

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/cpo/locations/LOC1/9999", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["status_message"], "Unknown EVSE!");

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/cpo/locations/LOC1/3256/9", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["status_message"],
        "Unknown connector!"
    );

    let response = app
        .oneshot(request(Method::GET, "/cpo/locations/LOC1/3256/1", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status_code"], 1000);
    assert_eq!(body["data"]["id"], "1");
}

#[tokio::test]
async fn location_list_filters_and_paginates() {
    let registry = Arc::new(InMemoryRegistry::new());
    registry.put_location(location("A", "2020-01-01T00:00:00Z")).await;
    registry.put_location(location("B", "2020-02-01T00:00:00Z")).await;
    registry.put_location(location("C", "2020-03-01T00:00:00Z")).await;
    let app = build_app(registry, false);

    // date_from is an exclusive lower bound: A's own stamp drops out.
    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/cpo/locations?date_from=2020-01-01T00:00:00Z",
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-total-count"], "2");
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["id"], "B");

    // date_to is inclusive: B stays in.
    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            "/cpo/locations?date_to=2020-02-01T00:00:00Z",
            None,
            None,
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Pagination applies after filtering; the total header keeps the
    // pre-pagination count.
    let response = app
        .oneshot(request(
            Method::GET,
            "/cpo/locations?offset=1&limit=1",
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.headers()["x-total-count"], "3");
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], "B");
}

#[tokio::test]
async fn options_reports_allowed_verbs() {
    let app = build_app(Arc::new(InMemoryRegistry::new()), false);
    let response = app
        .oneshot(request(Method::OPTIONS, "/cpo/locations", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ALLOW], "OPTIONS, GET");
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Authorization"
    );
}

// EMSP gate

#[tokio::test]
async fn sessions_require_an_allowed_emsp_grant() {
    let registry = Arc::new(InMemoryRegistry::new());
    registry.put_session(session("S1", "2020-06-29T21:00:00Z")).await;
    let app = build_app(registry, false);

    // No credentials at all.
    let response = app
        .clone()
        .oneshot(request(Method::GET, "/cpo/sessions", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["status_code"], 2000);

    // Wrong role.
    let response = app
        .clone()
        .oneshot(request(Method::GET, "/cpo/sessions", Some(CPO_TOKEN), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Allowed EMSP.
    let response = app
        .oneshot(request(
            Method::GET,
            "/cpo/sessions/S1",
            Some(EMSP_TOKEN),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], "S1");
}

#[tokio::test]
async fn cdrs_are_gated_and_resolvable() {
    let registry = Arc::new(InMemoryRegistry::new());
    registry.put_cdr(cdr("CDR1", "2020-06-29T22:00:00Z")).await;
    let app = build_app(registry, false);

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/cpo/cdrs/CDR1", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/cpo/cdrs/CDR1", Some(EMSP_TOKEN), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request(Method::GET, "/cpo/cdrs/NOPE", Some(EMSP_TOKEN), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["status_code"], 2003);
}

// Tokens

#[tokio::test]
async fn token_put_creates_then_updates() {
    let app = build_app(Arc::new(InMemoryRegistry::new()), false);

    let response = app
        .clone()
        .oneshot(request(
            Method::PUT,
            "/cpo/tokens/DE/ABC/TOK1",
            Some(EMSP_TOKEN),
            Some(token_json("TOK1", "2020-01-01T00:00:00Z")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().contains_key(header::ETAG));
    assert_eq!(body_json(response).await["status_code"], 1000);

    let response = app
        .oneshot(request(
            Method::PUT,
            "/cpo/tokens/DE/ABC/TOK1",
            Some(EMSP_TOKEN),
            Some(token_json("TOK1", "2020-02-01T00:00:00Z")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_downgrade_is_rejected_unless_forced() {
    let app = build_app(Arc::new(InMemoryRegistry::new()), false);
    let put = |uri: &str, stamp: &str| {
        request(
            Method::PUT,
            uri,
            Some(EMSP_TOKEN),
            Some(token_json("TOK1", stamp)),
        )
    };

    app.clone()
        .oneshot(put("/cpo/tokens/DE/ABC/TOK1", "2020-02-01T00:00:00Z"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(put("/cpo/tokens/DE/ABC/TOK1", "2020-01-01T00:00:00Z"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FAILED_DEPENDENCY);
    assert_eq!(body_json(response).await["status_code"], 2000);

    let response = app
        .oneshot(put(
            "/cpo/tokens/DE/ABC/TOK1?forceDowngrade=true",
            "2020-01-01T00:00:00Z",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_downgrade_allowed_by_deployment_policy() {
    let app = build_app(Arc::new(InMemoryRegistry::new()), true);
    let put = |stamp: &str| {
        request(
            Method::PUT,
            "/cpo/tokens/DE/ABC/TOK1",
            Some(EMSP_TOKEN),
            Some(token_json("TOK1", stamp)),
        )
    };

    app.clone().oneshot(put("2020-02-01T00:00:00Z")).await.unwrap();
    let response = app.oneshot(put("2020-01-01T00:00:00Z")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn token_put_rejects_mismatched_body() {
    let app = build_app(Arc::new(InMemoryRegistry::new()), false);
    // Body uid differs from the URL segment.
    let response = app
        .oneshot(request(
            Method::PUT,
            "/cpo/tokens/DE/ABC/TOK1",
            Some(EMSP_TOKEN),
            Some(token_json("OTHER", "2020-01-01T00:00:00Z")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["status_code"], 2001);
}

#[tokio::test]
async fn token_patch_merges_fields() {
    let app = build_app(Arc::new(InMemoryRegistry::new()), false);
    app.clone()
        .oneshot(request(
            Method::PUT,
            "/cpo/tokens/DE/ABC/TOK1",
            Some(EMSP_TOKEN),
            Some(token_json("TOK1", "2020-01-01T00:00:00Z")),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request(
            Method::PATCH,
            "/cpo/tokens/DE/ABC/TOK1",
            Some(EMSP_TOKEN),
            Some(json!({"valid": false, "last_updated": "2020-02-01T00:00:00Z"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["valid"], false);
    assert_eq!(body["data"]["uid"], "TOK1");

    // Patching a token that does not exist is the token-specific 404.
    let response = app
        .oneshot(request(
            Method::PATCH,
            "/cpo/tokens/DE/ABC/NOPE",
            Some(EMSP_TOKEN),
            Some(json!({"valid": false})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["status_code"], 2004);
}

#[tokio::test]
async fn token_delete_returns_last_known_state() {
    let app = build_app(Arc::new(InMemoryRegistry::new()), false);
    app.clone()
        .oneshot(request(
            Method::PUT,
            "/cpo/tokens/DE/ABC/TOK1",
            Some(EMSP_TOKEN),
            Some(token_json("TOK1", "2020-01-01T00:00:00Z")),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request(
            Method::DELETE,
            "/cpo/tokens/DE/ABC/TOK1",
            Some(EMSP_TOKEN),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["uid"], "TOK1");

    let response = app
        .oneshot(request(
            Method::DELETE,
            "/cpo/tokens/DE/ABC/TOK1",
            Some(EMSP_TOKEN),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["status_code"], 2004);
}

#[tokio::test]
async fn token_collection_bulk_delete_counts() {
    let app = build_app(Arc::new(InMemoryRegistry::new()), false);
    for uid in ["A", "B"] {
        app.clone()
            .oneshot(request(
                Method::PUT,
                &format!("/cpo/tokens/DE/ABC/{uid}"),
                Some(EMSP_TOKEN),
                Some(token_json(uid, "2020-01-01T00:00:00Z")),
            ))
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(request(
            Method::DELETE,
            "/cpo/tokens/DE/ABC",
            Some(EMSP_TOKEN),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["removed"], 2);

    let response = app
        .oneshot(request(
            Method::GET,
            "/cpo/tokens/DE/ABC",
            Some(EMSP_TOKEN),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.headers()["x-total-count"], "0");
}

#[tokio::test]
async fn token_round_trips_through_put_and_get() {
    let app = build_app(Arc::new(InMemoryRegistry::new()), false);
    let original = token_json("TOK1", "2020-01-01T00:00:00Z");
    app.clone()
        .oneshot(request(
            Method::PUT,
            "/cpo/tokens/DE/ABC/TOK1",
            Some(EMSP_TOKEN),
            Some(original.clone()),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(request(
            Method::GET,
            "/cpo/tokens/DE/ABC/TOK1",
            Some(EMSP_TOKEN),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: Token = serde_json::from_value(body_json(response).await["data"].clone()).unwrap();
    let original: Token = serde_json::from_value(original).unwrap();
    assert_eq!(fetched, original);
}

// Commands

#[tokio::test]
async fn commands_answer_not_supported() {
    let app = build_app(Arc::new(InMemoryRegistry::new()), false);
    let response = app
        .oneshot(request(
            Method::POST,
            "/cpo/commands/STOP_SESSION",
            Some(EMSP_TOKEN),
            Some(json!({
                "response_url": "https://emsp.example.org/commands/STOP_SESSION/42",
                "session_id": "S1"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status_code"], 1000);
    assert_eq!(body["data"]["result"], "NOT_SUPPORTED");
    assert_eq!(body["data"]["timeout"], 15);
    assert_eq!(body["data"]["message"][0]["language"], "en");
}

#[tokio::test]
async fn malformed_command_payload_is_400_with_ocpi_2001() {
    let app = build_app(Arc::new(InMemoryRegistry::new()), false);
    let response = app
        .oneshot(request(
            Method::POST,
            "/cpo/commands/CANCEL_RESERVATION",
            Some(EMSP_TOKEN),
            Some(json!({"reservation_id": "R1"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["status_code"], 2001);
}

#[tokio::test]
async fn commands_are_gated() {
    let app = build_app(Arc::new(InMemoryRegistry::new()), false);
    let response = app
        .oneshot(request(
            Method::POST,
            "/cpo/commands/RESERVE_NOW",
            Some(CPO_TOKEN),
            Some(json!({})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["status_code"], 2000);
}
