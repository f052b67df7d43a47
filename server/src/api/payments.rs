//! Payment API endpoints.
//!
//! - POST /api/payments/initiate - Register a purchase intent and hand the
//!   wallet a reference token (requires a verified session)
//! - POST /api/payments/confirm - External callback delivering the payment
//!   result
//!
//! # Payment Flow
//!
//! 1. The client verifies identity (`POST /api/verify`), then initiates:
//!    the registry stores the intent and returns an opaque reference.
//! 2. The wallet executes the payment out-of-band, tagged with the
//!    reference.
//! 3. The wallet (or processor webhook) delivers the result to the confirm
//!    endpoint. Only then does inventory move.
//!
//! The confirm response separates "payment succeeded" from "fulfillment
//! succeeded": a cleared payment is acknowledged with `success: true` even
//! when inventory or minting failed, with the partial failure in `warning`.

use super::error::ApiError;
use super::session::Session;
use crate::server::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use ticketmarket_core::types::{EventId, Money, WalletAddress};
use ticketmarket_core::{Confirmation, PaymentResult, TransactionDetails};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to initiate a payment.
#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    /// Event to purchase tickets for
    pub event_id: Uuid,
    /// Number of tickets
    pub quantity: u32,
    /// Total amount in USD the wallet will be asked to pay
    pub total_amount: f64,
    /// Buyer wallet address, when already known
    pub buyer_address: Option<String>,
}

/// Response after initiating a payment.
#[derive(Debug, Serialize)]
pub struct InitiatePaymentResponse {
    /// Reference token to tag the wallet payment with
    pub reference: String,
    /// Event being purchased
    pub event_id: Uuid,
    /// Number of tickets
    pub quantity: u32,
    /// Total amount in USD
    pub total_amount: f64,
}

/// External payment result delivered by the wallet or processor webhook.
#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    /// Reference token from initiation
    #[serde(default)]
    pub reference: String,
    /// Wallet-reported status; only `success` confirms
    #[serde(default)]
    pub status: String,
    /// Optional transaction details
    pub transaction: Option<ConfirmTransaction>,
}

/// Transaction details in a confirmation callback.
#[derive(Debug, Deserialize)]
pub struct ConfirmTransaction {
    /// Processor-side transaction id
    pub id: Option<String>,
    /// Paying wallet address
    pub from: Option<String>,
}

/// An NFT ticket minted during fulfillment.
#[derive(Debug, Serialize)]
pub struct NftTicketResponse {
    /// On-chain ticket identifier
    pub ticket_id: String,
    /// Mint transaction hash
    pub transaction_hash: String,
    /// Block the mint was confirmed in
    pub block_number: u64,
}

/// Response to a confirmation callback.
#[derive(Debug, Serialize)]
pub struct ConfirmPaymentResponse {
    /// Whether the payment is confirmed
    pub success: bool,
    /// Ledger tickets issued by this confirmation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickets: Option<Vec<Uuid>>,
    /// NFT tickets minted during fulfillment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nft_tickets: Option<Vec<NftTicketResponse>>,
    /// Partial-failure warning (payment cleared, downstream failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Initiate a payment: register the purchase intent and return a fresh
/// reference token. No inventory is touched here.
///
/// Requires a session that has passed identity verification.
pub async fn initiate_payment(
    Session(session): Session,
    State(state): State<AppState>,
    Json(request): Json<InitiatePaymentRequest>,
) -> Result<Json<InitiatePaymentResponse>, ApiError> {
    state.gate.require(&session)?;

    let total_amount = Money::from_usd(request.total_amount)
        .ok_or_else(|| ApiError::bad_request("total amount must be a non-negative amount"))?;
    let buyer_address = request
        .buyer_address
        .as_deref()
        .map(WalletAddress::parse)
        .transpose()
        .map_err(ApiError::bad_request)?;

    // The event must exist before we hand the wallet a reference; the
    // availability check itself waits until the money has moved.
    let event_id = EventId::from_uuid(request.event_id);
    let event = state.ledger.event(event_id).await?;
    if let Some(expected) = event.ticket_price.checked_mul(request.quantity) {
        if expected != total_amount {
            tracing::warn!(
                %event_id,
                expected = %expected,
                supplied = %total_amount,
                "Initiation amount differs from list price"
            );
        }
    }

    let intent = state
        .registry
        .create_intent(event_id, request.quantity, total_amount, buyer_address)
        .await?;

    Ok(Json(InitiatePaymentResponse {
        reference: intent.reference.as_str().to_string(),
        event_id: request.event_id,
        quantity: intent.quantity,
        total_amount: intent.total_amount.as_usd(),
    }))
}

/// Confirm a payment from an external result notification.
///
/// Re-delivery of the same confirmation is safe: the recorded outcome is
/// returned and inventory is not decremented again.
pub async fn confirm_payment(
    State(state): State<AppState>,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<(StatusCode, Json<ConfirmPaymentResponse>), ApiError> {
    let result = PaymentResult {
        reference: request.reference,
        status: request.status,
        transaction: request.transaction.map(|transaction| TransactionDetails {
            id: transaction.id,
            from: transaction.from,
        }),
    };

    match state.confirmations.confirm(result).await? {
        Confirmation::NotConfirmed => Ok((
            StatusCode::OK,
            Json(ConfirmPaymentResponse {
                success: false,
                tickets: None,
                nft_tickets: None,
                warning: None,
            }),
        )),
        Confirmation::Confirmed { record, .. } => {
            let tickets = record
                .tickets
                .iter()
                .map(|ticket| *ticket.id.as_uuid())
                .collect::<Vec<_>>();
            let nft_tickets = record
                .minted
                .into_iter()
                .map(|minted| NftTicketResponse {
                    ticket_id: minted.ticket_id,
                    transaction_hash: minted.transaction_hash,
                    block_number: minted.block_number,
                })
                .collect::<Vec<_>>();
            Ok((
                StatusCode::OK,
                Json(ConfirmPaymentResponse {
                    success: true,
                    tickets: (!tickets.is_empty()).then_some(tickets),
                    nft_tickets: (!nft_tickets.is_empty()).then_some(nft_tickets),
                    warning: record.warning,
                }),
            ))
        }
    }
}
