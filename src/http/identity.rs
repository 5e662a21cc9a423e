//! Caller identity extraction.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::http::response::ApiError;
use crate::identity::CallerId;

pub const CALLER_HEADER: &str = "x-caller-id";

/// The authenticated caller, taken from the `X-Caller-Id` header.
///
/// Authentication itself happens upstream; this only refuses requests that
/// arrive without an identity.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerId);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Caller(CallerId::from(v)))
            .ok_or(ApiError::MissingCaller)
    }
}

/// Like [`Caller`] but optional, for unrestricted operations that still log who called.
#[derive(Debug, Clone)]
pub struct MaybeCaller(pub Option<CallerId>);

impl<S> FromRequestParts<S> for MaybeCaller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeCaller(
            Caller::from_request_parts(parts, state).await.ok().map(|c| c.0),
        ))
    }
}
