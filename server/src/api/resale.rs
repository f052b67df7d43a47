//! Resale listing API endpoints.
//!
//! - POST /api/resale - List an issued ticket for resale
//! - GET /api/resale - Browse listings, newest first

use super::error::ApiError;
use crate::server::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticketmarket_core::types::{Money, ResaleListing, TicketId};
use uuid::Uuid;

/// Request to list a ticket for resale.
#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    /// The issued ticket to list
    pub ticket_id: Uuid,
    /// Asking price in USD
    pub asking_price: f64,
    /// Seller identity
    pub seller: String,
}

/// A resale listing, as exposed over the API.
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    /// Listing ID
    pub id: String,
    /// Listed ticket
    pub ticket_id: Uuid,
    /// Original event
    pub event_id: Uuid,
    /// Price the seller originally paid, in USD
    pub original_price: f64,
    /// Asking price in USD
    pub asking_price: f64,
    /// Seller identity
    pub seller: String,
    /// When the listing was created
    pub listed_at: DateTime<Utc>,
}

impl From<ResaleListing> for ListingResponse {
    fn from(listing: ResaleListing) -> Self {
        Self {
            id: listing.id.to_string(),
            ticket_id: *listing.ticket_id.as_uuid(),
            event_id: *listing.event_id.as_uuid(),
            original_price: listing.original_price.as_usd(),
            asking_price: listing.asking_price.as_usd(),
            seller: listing.seller,
            listed_at: listing.listed_at,
        }
    }
}

/// List a ticket for resale.
pub async fn create_listing(
    State(state): State<AppState>,
    Json(request): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<ListingResponse>), ApiError> {
    if request.seller.trim().is_empty() {
        return Err(ApiError::bad_request("seller must not be empty"));
    }
    let asking_price = Money::from_usd(request.asking_price)
        .ok_or_else(|| ApiError::bad_request("asking price must be a non-negative amount"))?;

    let listing = state
        .ledger
        .list_for_resale(
            TicketId::from_uuid(request.ticket_id),
            asking_price,
            request.seller,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(listing.into())))
}

/// Browse resale listings, newest first.
pub async fn list_listings(
    State(state): State<AppState>,
) -> Result<Json<Vec<ListingResponse>>, ApiError> {
    let listings = state.ledger.resale_listings().await?;
    Ok(Json(
        listings.into_iter().map(ListingResponse::from).collect(),
    ))
}
