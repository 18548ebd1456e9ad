//! Request/response hooks
//!
//! One uniform before/after hook for every route, keyed by the matched
//! operation (method + route template), instead of a named event pair per
//! resource. The default implementation logs through `tracing` and bumps
//! Prometheus counters.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{MatchedPath, State};
use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use metrics::counter;
use tracing::debug;

pub trait RequestHooks: Send + Sync {
    fn on_request(&self, operation: &str, method: &Method);
    fn on_response(&self, operation: &str, status: StatusCode);
}

/// Default hooks: debug logs plus `ocpi_requests_total` /
/// `ocpi_responses_total` counters.
pub struct TracingHooks;

impl RequestHooks for TracingHooks {
    fn on_request(&self, operation: &str, method: &Method) {
        debug!(%method, operation, "ocpi request");
        counter!("ocpi_requests_total", "operation" => operation.to_string()).increment(1);
    }

    fn on_response(&self, operation: &str, status: StatusCode) {
        debug!(status = status.as_u16(), operation, "ocpi response");
        counter!(
            "ocpi_responses_total",
            "operation" => operation.to_string(),
            "status" => status.as_u16().to_string()
        )
        .increment(1);
    }
}

pub async fn hooks_middleware(
    State(hooks): State<Arc<dyn RequestHooks>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let operation = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    hooks.on_request(&operation, request.method());
    let response = next.run(request).await;
    hooks.on_response(&operation, response.status());
    response
}
