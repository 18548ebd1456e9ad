//! OCPI route table with Swagger UI

use std::sync::Arc;

use axum::routing::get;
use axum::{middleware, Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers::{cdrs, commands, locations, sessions, tariffs, tokens};
use crate::api::hooks::{hooks_middleware, RequestHooks};
use crate::auth::{access_middleware, require_emsp, AccessTokenStore};
use crate::domain::{CountryCode, PartyId};
use crate::registry::SharedRegistry;

/// Shared state for every OCPI route.
///
/// The dispatcher holds no entity state of its own, only the registry
/// reference plus the CPO's identity and write policy.
#[derive(Clone)]
pub struct AppState {
    pub registry: SharedRegistry,
    /// The CPO's own country code; collection routes serve this party.
    pub country_code: CountryCode,
    pub party_id: PartyId,
    /// Deployment-wide downgrade policy (`?forceDowngrade=` overrides
    /// per request).
    pub allow_downgrades: bool,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Locations
        locations::list_locations,
        locations::get_location,
        locations::get_evse,
        locations::get_connector,
        // Tariffs
        tariffs::list_tariffs,
        tariffs::get_tariff,
        // Sessions
        sessions::list_sessions,
        sessions::get_session,
        // CDRs
        cdrs::list_cdrs,
        cdrs::get_cdr,
        // Tokens
        tokens::list_tokens,
        tokens::delete_tokens,
        tokens::get_token,
        tokens::put_token,
        tokens::patch_token,
        tokens::delete_token,
        // Commands
        commands::reserve_now,
        commands::cancel_reservation,
        commands::start_session,
        commands::stop_session,
        commands::unlock_connector,
    ),
    components(
        schemas(
            crate::domain::Location,
            crate::domain::Evse,
            crate::domain::Connector,
            crate::domain::Tariff,
            crate::domain::Session,
            crate::domain::Cdr,
            crate::domain::Token,
            crate::domain::TokenStatus,
            crate::domain::CommandResponse,
            crate::domain::ReserveNow,
            crate::domain::CancelReservation,
            crate::domain::StartSession,
            crate::domain::StopSession,
            crate::domain::UnlockConnector,
        )
    ),
    tags(
        (name = "Locations", description = "Charging locations, EVSEs and connectors published by this CPO."),
        (name = "Tariffs", description = "Tariffs referenced by this CPO's connectors."),
        (name = "Sessions", description = "Charging sessions (EMSP access only)."),
        (name = "CDRs", description = "Charge detail records (EMSP access only)."),
        (name = "Tokens", description = "EMSP-pushed authorization tokens (EMSP access only)."),
        (name = "Commands", description = "OCPI command stubs; every command answers NOT_SUPPORTED."),
    ),
    info(
        title = "OCPI 2.2 CPO API",
        version = "2.2",
        description = "CPO-side OCPI bindings: locations, tariffs, sessions, CDRs, tokens and command stubs."
    )
)]
pub struct ApiDoc;

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build the full router: OCPI routes under `path_prefix`, Swagger UI,
/// health and (optionally) Prometheus rendering.
pub fn create_cpo_router(
    path_prefix: &str,
    state: AppState,
    access: Arc<AccessTokenStore>,
    hooks: Arc<dyn RequestHooks>,
    prometheus: Option<PrometheusHandle>,
) -> Router {
    // Routes any negotiated peer may call.
    let open_routes = Router::new()
        .route(
            "/locations",
            get(locations::list_locations).options(locations::options_locations),
        )
        .route(
            "/locations/{location_id}",
            get(locations::get_location).options(locations::options_locations),
        )
        .route(
            "/locations/{location_id}/{evse_uid}",
            get(locations::get_evse).options(locations::options_locations),
        )
        .route(
            "/locations/{location_id}/{evse_uid}/{connector_id}",
            get(locations::get_connector).options(locations::options_locations),
        )
        .route(
            "/tariffs",
            get(tariffs::list_tariffs).options(tariffs::options_tariffs),
        )
        .route(
            "/tariffs/{tariff_id}",
            get(tariffs::get_tariff).options(tariffs::options_tariffs),
        );

    // Routes reserved for EMSPs with an ALLOWED grant. The gate runs
    // before any path or body parsing.
    let emsp_routes = Router::new()
        .route(
            "/sessions",
            get(sessions::list_sessions).options(sessions::options_sessions),
        )
        .route(
            "/sessions/{session_id}",
            get(sessions::get_session).options(sessions::options_sessions),
        )
        .route("/cdrs", get(cdrs::list_cdrs).options(cdrs::options_cdrs))
        .route(
            "/cdrs/{cdr_id}",
            get(cdrs::get_cdr).options(cdrs::options_cdrs),
        )
        .route(
            "/tokens/{country_code}/{party_id}",
            get(tokens::list_tokens)
                .delete(tokens::delete_tokens)
                .options(tokens::options_tokens_collection),
        )
        .route(
            "/tokens/{country_code}/{party_id}/{token_uid}",
            get(tokens::get_token)
                .put(tokens::put_token)
                .patch(tokens::patch_token)
                .delete(tokens::delete_token)
                .options(tokens::options_token),
        )
        .route(
            "/commands/RESERVE_NOW",
            axum::routing::post(commands::reserve_now).options(commands::options_commands),
        )
        .route(
            "/commands/CANCEL_RESERVATION",
            axum::routing::post(commands::cancel_reservation).options(commands::options_commands),
        )
        .route(
            "/commands/START_SESSION",
            axum::routing::post(commands::start_session).options(commands::options_commands),
        )
        .route(
            "/commands/STOP_SESSION",
            axum::routing::post(commands::stop_session).options(commands::options_commands),
        )
        .route(
            "/commands/UNLOCK_CONNECTOR",
            axum::routing::post(commands::unlock_connector).options(commands::options_commands),
        )
        .layer(middleware::from_fn(require_emsp));

    let cpo_routes = open_routes.merge(emsp_routes).with_state(state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let prefix = format!("/{}", path_prefix.trim_matches('/'));

    let mut router = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health_check))
        .nest(&prefix, cpo_routes);

    if let Some(handle) = prometheus {
        router = router.route("/metrics", get(move || async move { handle.render() }));
    }

    router
        // Outer layers run first: grant resolution, then hooks.
        .layer(middleware::from_fn_with_state(hooks, hooks_middleware))
        .layer(middleware::from_fn_with_state(access, access_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
