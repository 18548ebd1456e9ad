//!
//! OCPI 2.2 CPO-side HTTP service.
//! Reads configuration from TOML file (~/.config/ocpi-cpo/config.toml).

use std::sync::Arc;

use tracing::{error, info, warn};

use ocpi_cpo::api::TracingHooks;
use ocpi_cpo::auth::{AccessGrant, AccessTokenStore};
use ocpi_cpo::client::{CpoClient, ModuleEndpoints, ModuleId};
use ocpi_cpo::domain::{AllowedType, CountryCode, PartyId};
use ocpi_cpo::shared::ShutdownCoordinator;
use ocpi_cpo::{
    create_cpo_router, default_config_path, AppConfig, AppState, InMemoryRegistry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config_path = std::env::var("OCPI_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level)),
                )
                .init();
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    info!("Starting OCPI CPO service...");

    // Prometheus metrics recorder (must be installed before any metrics calls)
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    let country_code: CountryCode = app_cfg.party.country_code.parse().map_err(|e| {
        error!("Invalid [party].country_code in config: {}", e);
        Box::<dyn std::error::Error>::from("invalid country_code")
    })?;
    let party_id: PartyId = app_cfg.party.party_id.parse().map_err(|e| {
        error!("Invalid [party].party_id in config: {}", e);
        Box::<dyn std::error::Error>::from("invalid party_id")
    })?;
    info!("Serving as CPO {}*{}", country_code, party_id);

    // Inbound access tokens
    let access = Arc::new(AccessTokenStore::new());
    for entry in &app_cfg.access_tokens {
        let status = if entry.allowed {
            AllowedType::Allowed
        } else {
            AllowedType::Blocked
        };
        access.register(
            entry.token.clone(),
            AccessGrant {
                name: entry.name.clone(),
                role: entry.role,
                status,
            },
        );
    }
    info!("{} inbound access token(s) registered", app_cfg.access_tokens.len());

    // Outbound EMSP endpoints; the client is built here so a bad remote
    // config fails at startup, not on first push.
    let endpoints = Arc::new(ModuleEndpoints::new());
    for (name, url) in &app_cfg.remote.modules {
        match parse_module(name) {
            Some(module) => endpoints.register(module, url.clone()),
            None => warn!("Unknown OCPI module '{}' in [remote.modules], ignoring", name),
        }
    }
    let _emsp_client = CpoClient::new(endpoints, app_cfg.remote.access_token.clone())?;

    let registry = Arc::new(InMemoryRegistry::new());
    let state = AppState {
        registry,
        country_code,
        party_id,
        allow_downgrades: app_cfg.writes.allow_downgrades,
    };

    let router = create_cpo_router(
        &app_cfg.server.path_prefix,
        state,
        access,
        Arc::new(TracingHooks),
        Some(prometheus_handle),
    );

    // Shutdown coordination
    let shutdown = ShutdownCoordinator::default();
    let shutdown_signal = shutdown.signal();
    shutdown.start_signal_listener();

    let addr = format!("{}:{}", app_cfg.server.host, app_cfg.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("OCPI server listening on http://{}", addr);
    info!("Swagger UI available at http://{}/docs/", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal.wait().await;
            info!("OCPI server received shutdown signal");
        })
        .await?;

    info!("OCPI CPO service shutdown complete");
    Ok(())
}

fn parse_module(name: &str) -> Option<ModuleId> {
    match name {
        "locations" => Some(ModuleId::Locations),
        "tariffs" => Some(ModuleId::Tariffs),
        "sessions" => Some(ModuleId::Sessions),
        "cdrs" => Some(ModuleId::Cdrs),
        "tokens" => Some(ModuleId::Tokens),
        "commands" => Some(ModuleId::Commands),
        "chargingprofiles" => Some(ModuleId::ChargingProfiles),
        _ => None,
    }
}
