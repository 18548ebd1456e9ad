//! OCPI response envelope
//!
//! Every response body is `{status_code, status_message, data?, timestamp}`
//! with the transport status and CORS headers carried alongside. Handlers
//! build an [`OcpiReply`] (or early-return an `OcpiError`); both turn into
//! complete HTTP responses, never a bare transport error.

use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::error::OCPI_SUCCESS;
use crate::domain::OcpiError;

pub const X_TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");

/// The OCPI wire envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OcpiEnvelope<T> {
    pub status_code: i32,
    pub status_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
}

impl<T> OcpiEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status_code: OCPI_SUCCESS,
            status_message: "Success".to_string(),
            data: Some(data),
            timestamp: Utc::now(),
        }
    }

    /// Client-side failure envelope: transport errors and unresolvable
    /// remote endpoints all collapse into status `-1`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status_code: -1,
            status_message: message.into(),
            data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == OCPI_SUCCESS
    }
}

/// A fully specified server response: envelope plus transport details.
#[derive(Debug)]
pub struct OcpiReply {
    status: StatusCode,
    envelope: OcpiEnvelope<Value>,
    allow_methods: &'static str,
    etag: Option<String>,
    last_modified: Option<DateTime<Utc>>,
    total_count: Option<usize>,
}

impl OcpiReply {
    /// 200 with a data payload.
    pub fn ok<T: Serialize>(data: T) -> Self {
        Self::with_status(StatusCode::OK, data)
    }

    /// 201 with the created object's projection.
    pub fn created<T: Serialize>(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, data)
    }

    fn with_status<T: Serialize>(status: StatusCode, data: T) -> Self {
        let data = serde_json::to_value(data).unwrap_or(Value::Null);
        Self {
            status,
            envelope: OcpiEnvelope::success(data),
            allow_methods: "OPTIONS, GET",
            etag: None,
            last_modified: None,
            total_count: None,
        }
    }

    pub fn allow(mut self, methods: &'static str) -> Self {
        self.allow_methods = methods;
        self
    }

    pub fn etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn last_modified(mut self, stamp: DateTime<Utc>) -> Self {
        self.last_modified = Some(stamp);
        self
    }

    /// Filtered (pre-pagination) collection size for `X-Total-Count`.
    pub fn total_count(mut self, total: usize) -> Self {
        self.total_count = Some(total);
        self
    }

    /// The fixed OPTIONS response: 200, `Allow` + CORS methods, no body.
    pub fn options(methods: &'static str) -> Response {
        (
            StatusCode::OK,
            [
                (header::ALLOW, methods),
                (header::ACCESS_CONTROL_ALLOW_METHODS, methods),
                (header::ACCESS_CONTROL_ALLOW_HEADERS, "Authorization"),
            ],
        )
            .into_response()
    }
}

impl IntoResponse for OcpiReply {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.envelope)).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            header::HeaderValue::from_static(self.allow_methods),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            header::HeaderValue::from_static("Authorization"),
        );
        if let Some(etag) = self.etag {
            if let Ok(value) = format!("\"{etag}\"").parse() {
                headers.insert(header::ETAG, value);
            }
        }
        if let Some(stamp) = self.last_modified {
            if let Ok(value) = stamp.to_rfc3339().parse() {
                headers.insert(header::LAST_MODIFIED, value);
            }
        }
        if let Some(total) = self.total_count {
            if let Ok(value) = total.to_string().parse() {
                headers.insert(X_TOTAL_COUNT, value);
            }
        }
        response
    }
}

impl IntoResponse for OcpiError {
    fn into_response(self) -> Response {
        let envelope = OcpiEnvelope::<Value> {
            status_code: self.ocpi_code(),
            status_message: self.to_string(),
            data: None,
            timestamp: Utc::now(),
        };
        let mut response = (self.http_status(), Json(envelope)).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            header::HeaderValue::from_static("Authorization"),
        );
        response
    }
}
