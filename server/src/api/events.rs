//! Event management API endpoints.
//!
//! - POST /api/events - Create a new event
//! - GET /api/events - List events ordered by date
//! - GET /api/events/:id - Get event details
//! - GET /api/events/:id/availability - Availability snapshot

use super::error::ApiError;
use crate::server::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticketmarket_core::types::{Event, EventCategory, EventId, Money, NewEvent};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to create a new event.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Event name
    pub name: String,
    /// Event description
    pub description: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Venue / location
    pub location: String,
    /// Ticket price in USD
    pub ticket_price: f64,
    /// Total capacity
    pub total_tickets: u32,
    /// Vendor identity
    pub vendor: String,
    /// Category
    pub event_type: EventCategory,
    /// Optional poster image URL
    pub image_url: Option<String>,
}

/// Persisted event record, as exposed over the API.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Event ID
    pub id: Uuid,
    /// Event name
    pub name: String,
    /// Event description
    pub description: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Venue / location
    pub location: String,
    /// Ticket price in USD
    pub ticket_price: f64,
    /// Total capacity
    pub total_tickets: u32,
    /// Tickets sold
    pub sold_tickets: u32,
    /// Tickets still available
    pub available_tickets: u32,
    /// Vendor identity
    pub vendor: String,
    /// Category
    pub event_type: EventCategory,
    /// Optional poster image URL
    pub image_url: Option<String>,
    /// Record creation time
    pub created_at: DateTime<Utc>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: *event.id.as_uuid(),
            available_tickets: event.available_tickets(),
            name: event.name,
            description: event.description,
            date: event.date,
            location: event.location,
            ticket_price: event.ticket_price.as_usd(),
            total_tickets: event.total_tickets,
            sold_tickets: event.sold_tickets,
            vendor: event.vendor,
            event_type: event.event_type,
            image_url: event.image_url,
            created_at: event.created_at,
        }
    }
}

/// Availability snapshot response.
#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    /// Total capacity
    pub total: u32,
    /// Tickets sold
    pub sold: u32,
    /// Tickets still available
    pub available: u32,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new event.
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let ticket_price = Money::from_usd(request.ticket_price)
        .ok_or_else(|| ApiError::bad_request("ticket price must be a non-negative amount"))?;

    let event = state
        .ledger
        .create_event(NewEvent {
            name: request.name,
            description: request.description,
            date: request.date,
            location: request.location,
            ticket_price,
            total_tickets: request.total_tickets,
            vendor: request.vendor,
            event_type: request.event_type,
            image_url: request.image_url,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(event.into())))
}

/// List all events ordered by date.
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    let events = state.ledger.events().await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

/// Get a single event.
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventResponse>, ApiError> {
    let event = state.ledger.event(EventId::from_uuid(id)).await?;
    Ok(Json(event.into()))
}

/// Get an availability snapshot for an event.
pub async fn get_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let availability = state.ledger.availability(EventId::from_uuid(id)).await?;
    Ok(Json(AvailabilityResponse {
        total: availability.total,
        sold: availability.sold,
        available: availability.available,
    }))
}
