//! Identity verification endpoint.
//!
//! - POST /api/verify - Submit an identity proof for the calling session
//!
//! On success the session is marked verified for the lifetime of the
//! process, unlocking payment initiation.

use super::error::ApiError;
use super::session::Session;
use crate::server::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use ticketmarket_core::VerificationProof;

/// Request carrying an identity proof.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// The proof payload produced by the wallet
    pub payload: VerificationProof,
    /// Action the proof was generated for
    pub action: String,
}

/// Verification result.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// Whether the proof verified
    pub success: bool,
}

/// Verify an identity proof for the calling session.
pub async fn verify_identity(
    Session(session): Session,
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    if request.action != state.verify_action {
        return Err(ApiError::bad_request(format!(
            "unknown verification action '{}'",
            request.action
        )));
    }

    let success = state
        .verifier
        .verify(&request.payload, &request.action)
        .await?;
    if success {
        state.gate.mark_verified(session.clone())?;
        tracing::info!(%session, "Session passed identity verification");
    } else {
        tracing::info!(%session, "Identity proof rejected");
    }

    Ok(Json(VerifyResponse { success }))
}
