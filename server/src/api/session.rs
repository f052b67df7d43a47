//! Session extraction for handlers that gate on identity verification.
//!
//! The wallet client sends its opaque session token in the `X-Session-Id`
//! header. The token scopes verification successes; it is never interpreted
//! beyond equality.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use ticketmarket_core::types::SessionId;

/// Axum extractor for the caller's session.
#[derive(Clone, Debug)]
pub struct Session(pub SessionId);

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("X-Session-Id")
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing X-Session-Id header".to_string(),
            ))?
            .to_str()
            .map_err(|_| {
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid X-Session-Id header value".to_string(),
                )
            })?;

        SessionId::new(raw)
            .map(Session)
            .ok_or((
                StatusCode::BAD_REQUEST,
                "X-Session-Id must not be empty".to_string(),
            ))
    }
}
