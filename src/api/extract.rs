//! OCPI-aware JSON extractor
//!
//! `OcpiJson<T>` works like `axum::Json<T>`, but additionally runs
//! `validator::Validate::validate()` on the deserialized value, and both
//! failure modes reject with the OCPI envelope (status 2001, HTTP 400)
//! instead of axum's default rejections.

use axum::extract::FromRequest;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::domain::OcpiError;

pub struct OcpiJson<T>(pub T);

impl<S, T> FromRequest<S> for OcpiJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = OcpiError;

    async fn from_request(req: axum::extract::Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| OcpiError::MalformedBody(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| OcpiError::MalformedBody(errors.to_string()))?;

        Ok(OcpiJson(value))
    }
}
